/*!
Top-level orchestration (`spec.md` §1: "pure input -> source"): pattern text
in, a formatted Rust source string out.

`generate` is the one function every other entry point (the library API
tests exercise directly, and `regexgen-cli`'s binary) calls: parse, analyze,
select, emit per engine, assemble, pretty-print. Grounded on how the
teacher's own `meta::Regex::new` strings together `hir::parse` ->
`hir::Properties` -> `strategy::new` -> a chosen `Strategy` trait object;
here the last step produces a `TokenStream` instead of a boxed strategy,
since this crate's job ends at source text rather than at a running
matcher.
*/

use proc_macro2::TokenStream;
use quote::quote;

use crate::analysis::Facts;
use crate::codegen::{self, ident};
use crate::error::{GenerateError, PatternError};
use crate::hir_compile;
use crate::inst::Prog;
use crate::select::{self, CaptureEngine, Force, MatchEngine, Selection};
use crate::streaming::ChunkConfig;

/// Everything a caller can tune about one generation run (`spec.md` §6,
/// "CLI surface", lifted to a plain struct so the library API and the CLI
/// share one code path).
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Used to derive every generated identifier: `{name}Match`,
    /// `is_match_{name}` (lowercased), `find_{name}`, `{name}FindReader`, ...
    pub name: String,
    pub force: Force,
    pub tdfa_state_cap: usize,
    /// Whether to emit the streaming reader wrappers (`spec.md` §4.6).
    /// Skipped automatically for patterns with no bounded maximum length,
    /// since there is no sensible default buffer size to pick for one
    /// (`spec.md` §9 Open Question, resolved here: unbounded patterns are a
    /// one-shot-only feature).
    pub streaming: bool,
    pub verbose: bool,
}

impl Default for GeneratorConfig {
    fn default() -> GeneratorConfig {
        GeneratorConfig {
            name: "Pattern".to_string(),
            force: Force::default(),
            tdfa_state_cap: select::DEFAULT_TDFA_STATE_CAP,
            streaming: true,
            verbose: false,
        }
    }
}

/// Compiles `pattern` into a complete, `prettyplease`-formatted Rust source
/// string implementing the matcher(s) `spec.md` §6 describes for it.
pub fn generate(pattern: &str, config: &GeneratorConfig) -> Result<String, GenerateError> {
    let hir = regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|e| PatternError::new(pattern, e))?;
    let prog = hir_compile::compile(pattern)?;
    let facts = Facts::compute(&prog, &hir);
    let selection = select::select(&prog, &facts, config.force, config.tdfa_state_cap, config.verbose)?;

    let lower = config.name.to_lowercase();
    let is_match_fn = format!("is_match_{lower}");
    let find_fn = format!("find_{lower}");

    let items = emit_items(&config.name, &is_match_fn, &find_fn, &prog, &facts, &selection, config.streaming);

    let file_tokens = quote! { #(#items)* };
    let syntax_tree: syn::File =
        syn::parse2(file_tokens).expect("regexgen always emits a syntactically valid file");
    Ok(prettyplease::unparse(&syntax_tree))
}

fn emit_items(
    name: &str,
    is_match_fn: &str,
    find_fn: &str,
    prog: &Prog,
    facts: &Facts,
    selection: &Selection,
    streaming: bool,
) -> Vec<TokenStream> {
    let mut items = Vec::new();

    items.push(match selection.match_engine {
        MatchEngine::Thompson => match codegen::thompson::emit_is_match(is_match_fn, prog, facts) {
            Ok(tokens) => tokens,
            // Thompson eligibility was decided on static facts alone; a
            // mid-pattern assertion the engine can't represent (caught only
            // once `codegen::thompson::build` actually walks the program)
            // falls back the same way an unforced TDFA build failure does.
            Err(_) => codegen::backtrack::emit_is_match(is_match_fn, prog, facts, facts.catastrophic_risk),
        },
        MatchEngine::BacktrackMemo => codegen::backtrack::emit_is_match(is_match_fn, prog, facts, true),
        MatchEngine::Backtrack => codegen::backtrack::emit_is_match(is_match_fn, prog, facts, false),
    });

    // A pattern with no user capture groups still gets `find_*` (whole
    // match only); there's nothing to name in `{Name}Match` for it, so the
    // struct is skipped rather than generated empty, and `find_*` returns a
    // bare `(usize, usize)` span instead of a struct (`spec.md` §4.5).
    let capture_struct_name = if prog.num_cap > 0 { Some(name) } else { None };
    if let Some(name) = capture_struct_name {
        items.push(emit_capture_struct(name, prog));
    }

    let find_tokens = match &selection.capture_engine {
        CaptureEngine::Tdfa(dfa) => codegen::tdfa::emit_find(find_fn, dfa, capture_struct_name),
        CaptureEngine::BacktrackMemoCheckpoint => {
            let mode = codegen::backtrack::choose_checkpoint_mode(facts);
            codegen::backtrack::emit_find(find_fn, prog, facts, true, mode, capture_struct_name)
        }
        CaptureEngine::BacktrackCheckpoint => {
            let mode = codegen::backtrack::choose_checkpoint_mode(facts);
            codegen::backtrack::emit_find(find_fn, prog, facts, false, mode, capture_struct_name)
        }
    };
    items.push(find_tokens);

    // The streaming readers need every group's span, not just the whole
    // match (`ReplaceReader` substitutes `$1`/`$name`), so they call the
    // internal `{find_fn}_slots` raw function rather than the public
    // `{Name}Match`-or-span-returning wrapper pushed above.
    let find_slots_fn = format!("{find_fn}_slots");

    if streaming && facts.max_len != crate::analysis::UNBOUNDED {
        if let Ok(chunk_config) = ChunkConfig::new(facts.max_len, None, None) {
            items.push(codegen::streaming::emit_find_reader(name, &find_slots_fn, chunk_config));
            items.push(codegen::streaming::emit_replace_reader(name, &find_slots_fn, prog, chunk_config));
            items.push(codegen::streaming::emit_filter_reader(name, is_match_fn, true, chunk_config));
            items.push(codegen::streaming::emit_filter_reader(name, is_match_fn, false, chunk_config));
        }
    }

    items
}

/// Emits the `{name}Match` struct `spec.md` §4.5 describes: one
/// `Option<(usize, usize)>` byte-offset-span field per capture group, named
/// via [`codegen::field_names`].
fn emit_capture_struct(name: &str, prog: &Prog) -> TokenStream {
    let struct_ident = ident(&format!("{name}Match"));
    let names = codegen::field_names(prog);
    let field_idents: Vec<_> = names.iter().map(|n| ident(n)).collect();
    let field_idents_ctor = field_idents.clone();
    let starts: Vec<usize> = (1..=prog.num_cap).map(|k| 2 * k).collect();
    let ends: Vec<usize> = (1..=prog.num_cap).map(|k| 2 * k + 1).collect();

    quote! {
        #[allow(non_snake_case)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct #struct_ident {
            #( pub #field_idents: Option<(usize, usize)>, )*
        }

        impl #struct_ident {
            pub fn from_slots(slots: &[Option<usize>]) -> Self {
                #struct_ident {
                    #( #field_idents_ctor: match (slots[#starts], slots[#ends]) {
                        (Some(s), Some(e)) => Some((s, e)),
                        _ => None,
                    }, )*
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pattern_generates_backtracking_match_and_find() {
        let config = GeneratorConfig { name: "Cat".to_string(), ..GeneratorConfig::default() };
        let src = generate("(?P<word>cat)", &config).unwrap();
        assert!(src.contains("fn is_match_cat"));
        assert!(src.contains("fn find_cat"));
        assert!(src.contains("struct CatMatch"));
        assert!(src.contains("Word"));
    }

    #[test]
    fn catastrophic_small_pattern_generates_thompson_match() {
        let config = GeneratorConfig { name: "Evil".to_string(), ..GeneratorConfig::default() };
        let src = generate("(a+)+b", &config).unwrap();
        assert!(src.contains("fn is_match_evil"));
        assert!(src.contains("ACCEPT_MASK"));
    }

    #[test]
    fn invalid_pattern_is_a_pattern_error() {
        let config = GeneratorConfig::default();
        let err = generate("(unclosed", &config).unwrap_err();
        assert!(matches!(err, GenerateError::Pattern(_)));
    }

    #[test]
    fn streaming_readers_are_emitted_for_bounded_patterns_with_captures() {
        let config = GeneratorConfig { name: "Date".to_string(), ..GeneratorConfig::default() };
        let src = generate(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})", &config).unwrap();
        assert!(src.contains("DateFindReader"));
        assert!(src.contains("DateReplaceReader"));
        assert!(src.contains("DateSelectReader"));
        assert!(src.contains("DateRejectReader"));
    }

    #[test]
    fn unbounded_pattern_skips_streaming_readers() {
        let config = GeneratorConfig { name: "Greedy".to_string(), ..GeneratorConfig::default() };
        let src = generate(r"(?P<x>a+)", &config).unwrap();
        assert!(!src.contains("FindReader"));
    }
}
