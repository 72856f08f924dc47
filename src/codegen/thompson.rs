/*!
Thompson NFA engine code generation (`spec.md` §4.3).

Emits a bitset-parallel sweep over two `u64` sets (`current`/`next`), one bit
per instruction, with a precomputed epsilon-closure table so each step is a
handful of ORs rather than a recursive walk. Grounded on the teacher's
`nfa::thompson` `SparseSet`/`StateID` idioms (referenced in `util/` and
exercised by `tests/nfa/thompson/suite.rs`) scaled down to a single machine
word, since `spec.md` §4.1 caps Thompson eligibility at 64 instructions
specifically so this fits in one `u64` with no `Vec` allocation per search.

Boolean-only: `spec.md` §4.3, "No captures" — `Find*` operations never
select this engine, only `Match*`.
*/

use proc_macro2::TokenStream;
use quote::quote;

use crate::analysis::Facts;
use crate::codegen::{emit_rune_test, ident};
use crate::error::{BuildError, BuildErrorKind};
use crate::inst::{EmptyFlags, Inst, InstIdx, Prog};

/// The instruction-count ceiling this engine can represent in one `u64`
/// (`spec.md` §4.1/§4.3).
pub const MAX_INSTRUCTIONS: usize = 64;

/// The precomputed tables `spec.md` §4.3 describes: a closure entry per
/// character-consuming instruction, two start closures (`spec.md` §4.4's
/// "two start closures" trick, reused here for the same reason — `TEXT_START`
/// is the only position-dependent assertion this engine can resolve without
/// per-step bookkeeping), and the accept mask.
#[derive(Clone, Debug)]
pub struct Tables {
    /// Indexed by instruction index; only entries for character-consuming
    /// instructions are ever read.
    pub closure: Vec<u64>,
    pub start_begin: u64,
    pub start_any: u64,
    pub accept_mask: u64,
}

/// Computes [`Tables`] for `prog`, or an error if `prog` is too large or
/// contains a construct this engine cannot represent.
pub fn build(prog: &Prog, facts: &Facts) -> Result<Tables, BuildError> {
    if prog.insts.len() > MAX_INSTRUCTIONS {
        return Err(BuildError::new(
            BuildErrorKind::ThompsonTooManyInstructions { len: prog.insts.len(), cap: MAX_INSTRUCTIONS },
            false,
        ));
    }
    if facts.has_end_anchor {
        return Err(BuildError::new(
            BuildErrorKind::UnsupportedConstruct {
                what: "end-anchored pattern (Thompson's left-to-right sweep cannot cheaply test \"must reach end\")",
            },
            false,
        ));
    }

    let mut closure = vec![0u64; prog.insts.len()];
    for (idx, inst) in prog.insts.iter().enumerate() {
        if inst.is_byte_consuming() {
            let out = inst.out().expect("a consuming instruction always has an out edge");
            closure[idx] = epsilon_closure(prog, out, false)?;
        }
    }
    let start_begin = epsilon_closure(prog, prog.start, true)?;
    let start_any = epsilon_closure(prog, prog.start, false)?;
    let accept_mask = prog.insts.iter().enumerate().fold(0u64, |acc, (idx, inst)| {
        if matches!(inst, Inst::Match) {
            acc | (1 << idx)
        } else {
            acc
        }
    });
    Ok(Tables { closure, start_begin, start_any, accept_mask })
}

/// Follows `Nop`, `Capture` (ignored, per `spec.md` §4.3), `Alt` (both
/// branches), and `EmptyWidth` from `from`, returning the set of
/// character-consuming instructions and `Match` reachable without consuming
/// a byte.
///
/// `TEXT_START` is resolved against `at_begin` since it is the only
/// assertion this engine's two-closures trick can answer statically; any
/// other assertion reachable by epsilon transition (`TEXT_END`,
/// `LINE_START`, `LINE_END`, a word boundary) would need to be re-tested at
/// every step against the actual input, which this flat bitset table has no
/// room for, so it is rejected as an unsupported construct (the same
/// trade-off `crate::tdfa` makes for word boundaries inside a DFA state).
fn epsilon_closure(prog: &Prog, from: InstIdx, at_begin: bool) -> Result<u64, BuildError> {
    let mut acc = 0u64;
    let mut seen = 0u64;
    let mut stack = vec![from];
    while let Some(idx) = stack.pop() {
        let bit = 1u64 << idx;
        if seen & bit != 0 {
            continue;
        }
        seen |= bit;
        match &prog.insts[idx] {
            Inst::Match => acc |= bit,
            Inst::Fail => {}
            Inst::Rune1 { .. } | Inst::Rune { .. } | Inst::RuneAny { .. } | Inst::RuneAnyNotNL { .. } => {
                acc |= bit;
            }
            Inst::Nop { out } | Inst::AltMatch { out } => stack.push(*out),
            Inst::Capture { out, .. } => stack.push(*out),
            Inst::Alt { out, arg } => {
                stack.push(*out);
                stack.push(*arg);
            }
            Inst::EmptyWidth { flags, out } => {
                if flags.contains(EmptyFlags::TEXT_START) {
                    if at_begin {
                        stack.push(*out);
                    }
                } else if flags.contains(EmptyFlags::TEXT_END)
                    || flags.contains(EmptyFlags::LINE_START)
                    || flags.contains(EmptyFlags::LINE_END)
                    || flags.contains(EmptyFlags::WORD_BOUNDARY)
                    || flags.contains(EmptyFlags::NOT_WORD_BOUNDARY)
                {
                    return Err(BuildError::new(
                        BuildErrorKind::UnsupportedConstruct {
                            what: "position-dependent assertion other than ^ inside the Thompson engine",
                        },
                        false,
                    ));
                } else {
                    stack.push(*out);
                }
            }
        }
    }
    Ok(acc)
}

/// Emits `fn fn_name(input: &[u8]) -> bool`.
pub fn emit_is_match(fn_name: &str, prog: &Prog, facts: &Facts) -> Result<TokenStream, BuildError> {
    let tables = build(prog, facts)?;
    let fn_ident = ident(fn_name);
    let n = prog.insts.len();
    let closure_lits = tables.closure.iter().copied();
    let accept_mask = tables.accept_mask;
    let start_begin = tables.start_begin;
    let start_any = tables.start_any;
    let consume_arms = emit_consume_arms(prog);

    let step = quote! {
        let c = input[pos];
        let mut next: u64 = 0;
        #consume_arms
        current = next;
    };

    let body = if facts.anchored {
        quote! {
            let mut current: u64 = #start_begin;
            if current & ACCEPT_MASK != 0 {
                return true;
            }
            let mut pos = 0usize;
            while pos < len {
                #step
                if current == 0 {
                    return false;
                }
                pos += 1;
                if current & ACCEPT_MASK != 0 {
                    return true;
                }
            }
            false
        }
    } else {
        quote! {
            'search: for search_start in 0..=len {
                let mut current: u64 = if search_start == 0 { #start_begin } else { #start_any };
                if current & ACCEPT_MASK != 0 {
                    return true;
                }
                let mut pos = search_start;
                while pos < len {
                    #step
                    if current == 0 {
                        continue 'search;
                    }
                    pos += 1;
                    if current & ACCEPT_MASK != 0 {
                        return true;
                    }
                }
            }
            false
        }
    };

    Ok(quote! {
        pub fn #fn_ident(input: &[u8]) -> bool {
            const CLOSURE: [u64; #n] = [ #(#closure_lits),* ];
            const ACCEPT_MASK: u64 = #accept_mask;
            let len = input.len();
            #body
        }
    })
}

/// One `if current & bit != 0 && <test> { next |= CLOSURE[idx] }` arm per
/// character-consuming instruction (`spec.md` §4.3, "Main loop": "for each
/// state in current that consumes a character, test whether c matches and,
/// if so, OR its transition closure into next").
fn emit_consume_arms(prog: &Prog) -> TokenStream {
    let arms: Vec<TokenStream> = prog
        .insts
        .iter()
        .enumerate()
        .filter_map(|(idx, inst)| {
            let bit = 1u64 << idx;
            let idx_lit = idx;
            let test = match inst {
                Inst::Rune1 { byte, .. } => quote! { c == #byte },
                Inst::Rune { ranges, .. } => emit_rune_test(ranges),
                Inst::RuneAny { .. } => quote! { true },
                Inst::RuneAnyNotNL { .. } => quote! { c != b'\n' },
                _ => return None,
            };
            Some(quote! {
                if current & #bit != 0 && (#test) {
                    next |= CLOSURE[#idx_lit];
                }
            })
        })
        .collect();
    quote! { #(#arms)* }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;

    fn facts_for(pattern: &str) -> (Prog, Facts) {
        let hir = regex_syntax::Parser::new().parse(pattern).unwrap();
        let prog = hir_compile::compile(pattern).unwrap();
        let facts = Facts::compute(&prog, &hir);
        (prog, facts)
    }

    #[test]
    fn small_catastrophic_pattern_builds_tables() {
        let (prog, facts) = facts_for("(a+)+b");
        let tables = build(&prog, &facts).unwrap();
        assert_eq!(tables.closure.len(), prog.insts.len());
        assert_ne!(tables.accept_mask, 0);
    }

    #[test]
    fn end_anchored_pattern_is_rejected() {
        let (prog, facts) = facts_for("(a+)+b$");
        assert!(build(&prog, &facts).is_err());
    }

    #[test]
    fn mid_pattern_word_boundary_is_rejected() {
        let (prog, facts) = facts_for(r"(a\bb)+");
        assert!(build(&prog, &facts).is_err());
    }

    #[test]
    fn emit_is_match_renders_a_search_loop() {
        let (prog, facts) = facts_for("(a+)+b");
        let tokens = emit_is_match("match_nested", &prog, &facts).unwrap();
        let rendered = tokens.to_string();
        assert!(rendered.contains("fn match_nested"));
        assert!(rendered.contains("CLOSURE"));
        assert!(rendered.contains("ACCEPT_MASK"));
    }

    #[test]
    fn too_many_instructions_is_rejected() {
        let pattern = (0..40).map(|_| "a?").collect::<String>();
        let (prog, facts) = facts_for(&pattern);
        if prog.insts.len() > MAX_INSTRUCTIONS {
            assert!(build(&prog, &facts).is_err());
        }
    }
}
