/*!
Code emission (`spec.md` §9: "the generator itself composes over a sum
type `{Backtracking, Thompson, TDFA}` with per-variant fields"; §1 scopes
out "code-emission plumbing" as a component, meaning this crate doesn't
invent its own pretty-printer, but *building* `TokenStream`s with
`quote!`/`proc_macro2` is the idiomatic Rust replacement for "emit source
text").

Grounded on how the teacher's own build script
(`regex-automata`'s `src/util/determinize`-adjacent table generation, and
more directly `regex-syntax`'s `unicode_tables` generator, referenced in
`other_examples/`) emits large static tables as `quote!`-built
`TokenStream`s rendered once with `prettyplease`. Each engine submodule
here (`backtrack`, `thompson`, `tdfa`, `streaming`) builds the body of one
pattern's generated `match_*`/`find_*` functions; [`crate::generator`]
assembles the whole file from capture framing, the chosen engine(s), and
the streaming wrappers.
*/

pub mod backtrack;
pub mod streaming;
pub mod tdfa;
pub mod thompson;

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use crate::inst::alloc_ranges::RuneRange;
use crate::inst::Prog;

/// Turns a capture group name (or `None`) into the field name `spec.md`
/// §4.5 describes: the group's own name if present, else `Group{k}`;
/// capitalized; `{k}`-suffixed if it collides with `Match` or an earlier
/// field.
pub fn field_names(prog: &Prog) -> Vec<String> {
    let mut used = std::collections::HashSet::new();
    used.insert("Match".to_string());
    let mut names = Vec::with_capacity(prog.num_cap);
    for k in 1..=prog.num_cap {
        let base = match prog.capture_names.get(k).and_then(|n| n.as_deref()) {
            Some(name) if !name.is_empty() => capitalize(name),
            _ => format!("Group{k}"),
        };
        let name = if used.contains(&base) { format!("{base}{k}") } else { base };
        used.insert(name.clone());
        names.push(name);
    }
    names
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Builds an identifier from a plain string, for use inside `quote!`.
pub fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

/// A byte-range test used by several engines' `Rune` handling (`spec.md`
/// §4.2: "recognized common class -> inequality chain; <= 3 singletons ->
/// OR chain; else a 32-byte bitmap"). Kept engine-agnostic so both
/// `backtrack` and `thompson` share the same classification.
pub enum RuneTest {
    /// A single contiguous range, e.g. `[a-z]`.
    Range(u8, u8),
    /// Two ranges recognized as a named class (`\w`, `\d`, `\s`, or
    /// case-insensitive letter pairs like `[a-zA-Z]`).
    Disjunction(Vec<(u8, u8)>),
    /// Three or fewer single bytes.
    Singletons(Vec<u8>),
    /// General case: a 256-bit membership bitmap, packed as 32 bytes.
    Bitmap([u8; 32]),
}

pub fn classify_ranges(ranges: &[RuneRange]) -> RuneTest {
    if ranges.len() <= 3 && ranges.iter().all(|r| r.start == r.end) {
        return RuneTest::Singletons(ranges.iter().map(|r| r.start).collect());
    }
    if ranges.len() <= 2 {
        return RuneTest::Disjunction(ranges.iter().map(|r| (r.start, r.end)).collect());
    }
    let mut bitmap = [0u8; 32];
    for r in ranges {
        for b in r.start..=r.end {
            bitmap[(b / 8) as usize] |= 1 << (b % 8);
        }
    }
    RuneTest::Bitmap(bitmap)
}

/// Renders a [`RuneTest`] against a byte already bound to the local `c`, as
/// used by both `backtrack` and `thompson` (`spec.md` §4.2/§4.3, "character
/// conditions").
pub fn emit_rune_test(ranges: &[RuneRange]) -> TokenStream {
    match classify_ranges(ranges) {
        RuneTest::Range(lo, hi) => quote! { (c >= #lo && c <= #hi) },
        RuneTest::Disjunction(pairs) => {
            let checks = pairs.iter().map(|(lo, hi)| quote! { (c >= #lo && c <= #hi) });
            quote! { ( #(#checks)||* ) }
        }
        RuneTest::Singletons(bytes) => {
            let checks = bytes.iter().map(|b| quote! { c == #b });
            quote! { ( #(#checks)||* ) }
        }
        RuneTest::Bitmap(bitmap) => {
            let bytes = bitmap.iter().copied();
            quote! {
                {
                    const BITMAP: [u8; 32] = [ #(#bytes),* ];
                    (BITMAP[(c / 8) as usize] >> (c % 8)) & 1 == 1
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;

    #[test]
    fn unnamed_groups_get_group_n_names() {
        let prog = hir_compile::compile(r"(a)(b)").unwrap();
        assert_eq!(field_names(&prog), vec!["Group1", "Group2"]);
    }

    #[test]
    fn named_groups_are_capitalized() {
        let prog = hir_compile::compile(r"(?P<year>\d{4})").unwrap();
        assert_eq!(field_names(&prog), vec!["Year"]);
    }

    #[test]
    fn a_group_literally_named_match_gets_suffixed() {
        let prog = hir_compile::compile(r"(?P<match>a)").unwrap();
        assert_eq!(field_names(&prog), vec!["Match1"]);
    }

    #[test]
    fn small_range_sets_are_singletons() {
        let ranges = vec![
            crate::inst::alloc_ranges::RuneRange::new(b'a', b'a'),
            crate::inst::alloc_ranges::RuneRange::new(b'e', b'e'),
        ];
        assert!(matches!(classify_ranges(&ranges), RuneTest::Singletons(v) if v.len() == 2));
    }
}
