/*!
Tagged-DFA code generation (`spec.md` §4.4, "Generated tables"/"Runtime
algorithm").

Emits the package-level tables `spec.md` describes plus the per-call search
loop that walks them. Grounded on the teacher's `dfa::dense::DFA` table
layout (a flat `transition[state * 128 + byte]` array consumed by a tight
`while` loop) translated into a `quote!`-built `TokenStream` the way
`codegen::thompson` does for its own tables.

Deviates from `spec.md`'s literal five-table shape in exactly the way
documented in `crate::tdfa`'s module doc: because construction there always
defers tag-action application to accept time, `tag_action_count`/
`tag_action_tags`/`tag_action_offsets` collapse to nothing (every ordinary
transition carries zero actions), so this emits only `TRANSITION`,
`IS_ACCEPT`/`IS_ACCEPT_EOT`, and `ACCEPT_ACTIONS`/`ACCEPT_EOT_ACTIONS`.
*/

use proc_macro2::TokenStream;
use quote::quote;

use crate::codegen::ident;
use crate::tdfa::{Dfa, TagAction};

/// Emits a private `fn fn_name_slots(input: &[u8]) -> Option<[Option<usize>;
/// num_tags]>` doing the real table walk, plus a public `fn fn_name` that
/// frames its result into `capture_struct`'s `{Name}Match` (or a bare
/// `(usize, usize)` whole-match span when the pattern has no named
/// groups), matching `codegen::backtrack`'s `Find` split (`spec.md` §4.5).
pub fn emit_find(fn_name: &str, dfa: &Dfa, capture_struct: Option<&str>) -> TokenStream {
    let raw_ident = ident(&format!("{fn_name}_slots"));
    let fn_ident = ident(fn_name);
    let n = dfa.states.len();
    let num_tags = dfa.num_tags;
    let start_begin = dfa.start_begin;
    let start_any = dfa.start_any;

    let transition_rows = dfa.transitions.iter().map(|row| {
        let cells = row.iter().map(|cell| match cell {
            Some(s) => *s as i64,
            None => -1i64,
        });
        quote! { [ #(#cells),* ] }
    });
    let is_accept = dfa.states.iter().map(|s| s.is_accept);
    let is_accept_eot = dfa.states.iter().map(|s| s.is_accept_eot);
    let accept_actions = dfa.states.iter().map(|s| emit_action_slice(&s.accept_actions));
    let accept_eot_actions = dfa.states.iter().map(|s| emit_action_slice(&s.accept_eot_actions));

    let raw_fn = quote! {
        fn #raw_ident(input: &[u8]) -> Option<[Option<usize>; #num_tags]> {
            const TRANSITION: [[i64; 128]; #n] = [ #(#transition_rows),* ];
            const IS_ACCEPT: [bool; #n] = [ #(#is_accept),* ];
            const IS_ACCEPT_EOT: [bool; #n] = [ #(#is_accept_eot),* ];
            const ACCEPT_ACTIONS: [&[(usize, u32)]; #n] = [ #(#accept_actions),* ];
            const ACCEPT_EOT_ACTIONS: [&[(usize, u32)]; #n] = [ #(#accept_eot_actions),* ];

            fn apply(tags: &mut [i64; #num_tags], actions: &[(usize, u32)], position: i64) {
                for &(tag, offset) in actions {
                    tags[tag] = position - offset as i64;
                }
            }

            fn finalize(match_tags: &[i64; #num_tags], match_end: i64) -> [Option<usize>; #num_tags] {
                let mut out = [None; #num_tags];
                for k in 0..(#num_tags / 2) {
                    let start = match_tags[2 * k];
                    let mut end = match_tags[2 * k + 1];
                    if start >= 0 && end < 0 {
                        end = match_end;
                    }
                    if start >= 0 && end >= 0 {
                        out[2 * k] = Some(start as usize);
                        out[2 * k + 1] = Some(end as usize);
                    }
                }
                out
            }

            let len = input.len();
            for search_start in 0..=len {
                let mut tags: [i64; #num_tags] = [-1; #num_tags];
                tags[0] = search_start as i64;
                let mut state: usize = if search_start == 0 { #start_begin } else { #start_any };
                let mut match_end: i64 = -1;
                let mut match_tags: [i64; #num_tags] = tags;

                if IS_ACCEPT[state] {
                    apply(&mut tags, ACCEPT_ACTIONS[state], search_start as i64);
                    match_end = search_start as i64;
                    match_tags = tags;
                }

                let mut cursor = search_start;
                while cursor < len {
                    let c = input[cursor];
                    if c >= 128 {
                        break;
                    }
                    let next = TRANSITION[state][c as usize];
                    if next < 0 {
                        break;
                    }
                    state = next as usize;
                    if IS_ACCEPT[state] {
                        apply(&mut tags, ACCEPT_ACTIONS[state], (cursor + 1) as i64);
                        match_end = (cursor + 1) as i64;
                        match_tags = tags;
                    }
                    if cursor == len - 1 && IS_ACCEPT_EOT[state] {
                        apply(&mut tags, ACCEPT_EOT_ACTIONS[state], (cursor + 1) as i64);
                        match_end = (cursor + 1) as i64;
                        match_tags = tags;
                    }
                    cursor += 1;
                }

                if match_end >= 0 {
                    match_tags[1] = match_end;
                    return Some(finalize(&match_tags, match_end));
                }
            }
            None
        }
    };

    let wrapper = match capture_struct {
        Some(name) => {
            let struct_ident = ident(&format!("{name}Match"));
            quote! {
                pub fn #fn_ident(input: &[u8]) -> Option<#struct_ident> {
                    #raw_ident(input).map(|slots| #struct_ident::from_slots(&slots))
                }
            }
        }
        None => quote! {
            pub fn #fn_ident(input: &[u8]) -> Option<(usize, usize)> {
                #raw_ident(input).map(|slots| {
                    (slots[0].expect("whole match always starts"), slots[1].expect("whole match always ends"))
                })
            }
        },
    };

    quote! { #raw_fn #wrapper }
}

fn emit_action_slice(actions: &[TagAction]) -> TokenStream {
    let pairs = actions.iter().map(|a| {
        let tag = a.tag;
        let offset = a.offset;
        quote! { (#tag, #offset) }
    });
    quote! { &[ #(#pairs),* ] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;
    use crate::tdfa::Builder;

    #[test]
    fn emit_find_renders_the_table_set() {
        let prog = hir_compile::compile(r"(?P<y>\d{4})-(?P<m>\d{2})").unwrap();
        let dfa = Builder::new(500).build(&prog).unwrap();
        let tokens = emit_find("find_date", &dfa, Some("Date"));
        let rendered = tokens.to_string();
        assert!(rendered.contains("fn find_date_slots"));
        assert!(rendered.contains("fn find_date"));
        assert!(rendered.contains("DateMatch"));
        assert!(rendered.contains("TRANSITION"));
        assert!(rendered.contains("IS_ACCEPT"));
        assert!(rendered.contains("ACCEPT_ACTIONS"));
        assert!(rendered.contains("ACCEPT_EOT_ACTIONS"));
    }

    #[test]
    fn table_row_count_matches_state_count() {
        let prog = hir_compile::compile("cat").unwrap();
        let dfa = Builder::new(500).build(&prog).unwrap();
        let tokens = emit_find("find_cat", &dfa, None);
        let rendered = tokens.to_string();
        let expected = format!("{}usize", dfa.states.len());
        assert!(rendered.contains(&expected) || rendered.contains(&dfa.states.len().to_string()));
    }
}
