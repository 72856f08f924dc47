/*!
Backtracking engine code generation (`spec.md` §4.2).

Emits, for one program, a `loop { match next_i { ... } }` dispatcher over
labeled basic blocks — the direct Rust translation of the spec's
label-and-goto shape, exactly as `spec.md` §9 "Design notes" prescribes for
targets without a real `goto`. Grounded on the teacher's own generated-code
style in `dfa::dense`/`dfa::onepass`, where a `match state { ... }` over a
small integer *is* the hot loop; the state here is `next_i` (an instruction
index) rather than a DFA state id, but the idiom (a `match` arm per state,
each arm ending by reassigning the loop variable) is the same.

Word-boundary assertions call `regexgen_support::ascii::is_word_byte`
(`spec.md` §4.7) rather than inlining the byte-class test, so every
generated file that needs it shares one definition instead of repeating the
bit-twiddling per pattern.

`Find` functions are generated in two layers: a private `{fn_name}_slots`
function returning the raw per-slot array (used internally by the streaming
readers, which need every group's span, not just the whole match), and a
public `{fn_name}` wrapper that frames those slots into the pattern's
`{Name}Match` struct, or a bare `(usize, usize)` whole-match span when the
pattern has no named groups (`spec.md` §4.5). The Backtracking stack and, in
array-checkpoint mode, the capture snapshot array are acquired from a
process-wide `regexgen_support::Pool` rather than allocated fresh per call
(`spec.md` §5, "Shared resources").
*/

use std::collections::HashSet;

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::analysis::Facts;
use crate::codegen::{emit_rune_test, ident};
use crate::inst::{EmptyFlags, Inst, InstIdx, Prog};

/// The checkpoint strategy chosen for a Find (capture-bearing) matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointMode {
    /// Whole-array snapshot pushed onto a side stack at `Alt`s that can
    /// reach a capture (`spec.md` §4.2, "Plain/array mode").
    Array,
    /// Per-slot restore frames interleaved with `Alt` frames on one unified
    /// stack (`spec.md` §4.2, "Per-capture mode").
    PerCapture,
}

/// Picks array vs. per-capture checkpointing the way `spec.md` §4.2
/// describes: per-capture "is chosen when the number of checkpoint-needing
/// alts exceeds a tuning threshold".
pub const PER_CAPTURE_THRESHOLD: usize = 4;

pub fn choose_checkpoint_mode(facts: &Facts) -> CheckpointMode {
    if facts.alts_needing_checkpoint.len() > PER_CAPTURE_THRESHOLD {
        CheckpointMode::PerCapture
    } else {
        CheckpointMode::Array
    }
}

/// Emits `fn match_fn_name(input: &[u8]) -> bool`, the boolean-only
/// Backtracking matcher (no capture bookkeeping at all).
pub fn emit_is_match(fn_name: &str, prog: &Prog, facts: &Facts, memoize: bool) -> TokenStream {
    let fn_ident = ident(fn_name);
    let no_match = quote! { false };
    // Boolean matching never checkpoints captures, so the checkpoint set
    // and frame type are unused in the emitted tokens for `CaptureMode::None`.
    let unused_frame = ident("UnusedFrame");
    let dispatch = emit_dispatch_arms(prog, CaptureMode::None, memoize, &facts.alts_needing_checkpoint, &unused_frame);
    let prelude = emit_prelude(prog, memoize);
    let retry = emit_retry(facts, memoize, &no_match);
    quote! {
        pub fn #fn_ident(input: &[u8]) -> bool {
            #prelude
            'search: loop {
                let mut next_i: usize = start_i;
                'dispatch: loop {
                    match next_i {
                        #dispatch
                        _ => unreachable!("instruction index out of range"),
                    }
                }
                #retry
            }
        }
    }
}

/// Emits the capture-bearing Backtracking matcher for `fn_name`: a private
/// `fn_name_slots(input: &[u8]) -> Option<Vec<Option<usize>>>` doing the
/// real search, and a public `fn_name` that frames its result into
/// `capture_struct`'s `{Name}Match` (or a bare whole-match span when
/// `capture_struct` is `None`, i.e. the pattern has no named groups).
pub fn emit_find(
    fn_name: &str,
    prog: &Prog,
    facts: &Facts,
    memoize: bool,
    mode: CheckpointMode,
    capture_struct: Option<&str>,
) -> TokenStream {
    let raw_ident = ident(&format!("{fn_name}_slots"));
    let fn_ident = ident(fn_name);
    let frame_ident = ident(&format!("{}Frame", pascal_case(fn_name)));
    let stack_pool_ident = ident(&format!("{}_STACK_POOL", fn_name.to_uppercase()));

    let capture_mode = match mode {
        CheckpointMode::Array => CaptureMode::ArrayCheckpoint,
        CheckpointMode::PerCapture => CaptureMode::PerCaptureCheckpoint,
    };
    let no_match = quote! { None };
    let dispatch = emit_dispatch_arms(prog, capture_mode, memoize, &facts.alts_needing_checkpoint, &frame_ident);
    let prelude = emit_prelude(prog, memoize);
    let retry = emit_retry(facts, memoize, &no_match);
    let num_slots = prog.num_slots();

    let (frame_type, pool_statics, stack_init, capture_stack_init) = match mode {
        CheckpointMode::Array => {
            let capture_pool_ident = ident(&format!("{}_CAPTURE_POOL", fn_name.to_uppercase()));
            (
                quote! {
                    enum #frame_ident {
                        Alt { offset: usize, target: usize, snapshot_len: usize },
                        AltPlain { offset: usize, target: usize },
                    }
                },
                quote! {
                    static #stack_pool_ident: std::sync::OnceLock<regexgen_support::Pool<Vec<#frame_ident>>> =
                        std::sync::OnceLock::new();
                    static #capture_pool_ident: std::sync::OnceLock<regexgen_support::Pool<Vec<Option<usize>>>> =
                        std::sync::OnceLock::new();
                },
                quote! { let mut stack = #stack_pool_ident.get_or_init(regexgen_support::Pool::new).get(); },
                quote! { let mut capture_stack = #capture_pool_ident.get_or_init(regexgen_support::Pool::new).get(); },
            )
        }
        CheckpointMode::PerCapture => (
            quote! {
                enum #frame_ident {
                    Alt { offset: usize, target: usize },
                    Restore { slot: usize, value: Option<usize> },
                }
            },
            quote! {
                static #stack_pool_ident: std::sync::OnceLock<regexgen_support::Pool<Vec<#frame_ident>>> =
                    std::sync::OnceLock::new();
            },
            quote! { let mut stack = #stack_pool_ident.get_or_init(regexgen_support::Pool::new).get(); },
            quote! {},
        ),
    };

    let raw_fn = quote! {
        #frame_type
        #pool_statics

        fn #raw_ident(input: &[u8]) -> Option<Vec<Option<usize>>> {
            #prelude
            let mut captures: [Option<usize>; #num_slots] = [None; #num_slots];
            #stack_init
            #capture_stack_init
            'search: loop {
                let mut next_i: usize = start_i;
                for slot in captures.iter_mut() { *slot = None; }
                'dispatch: loop {
                    match next_i {
                        #dispatch
                        _ => unreachable!("instruction index out of range"),
                    }
                }
                #retry
            }
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

/// PascalCases a generated function name (`find_date` -> `FindDate`) for
/// use as part of an internal type name; not part of any public API naming
/// rule, just a collision-free identifier.
fn pascal_case(fn_name: &str) -> String {
    fn_name
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureMode {
    None,
    ArrayCheckpoint,
    PerCaptureCheckpoint,
}

/// The fallback handler shares the same dispatch `match`: every non-match,
/// non-capture arm that fails jumps to this label by setting
/// `next_i = FALLBACK` (`spec.md` §4.2, "Fallback handler"). It is emitted
/// inline here as a constant offset past the last real instruction so the
/// outer `match` stays a single flat `match`.
fn emit_prelude(prog: &Prog, memoize: bool) -> TokenStream {
    let start = prog.start;
    let fallback = prog.insts.len();
    let memo_decl = if memoize {
        let n = prog.insts.len();
        quote! {
            let mut visited: Vec<bool> = vec![false; #n * (input.len() + 1)];
        }
    } else {
        quote! {}
    };
    quote! {
        const FALLBACK: usize = #fallback;
        let len = input.len();
        let start_i: usize = #start;
        let mut search_start: usize = 0;
        let mut offset: usize = search_start;
        #memo_decl
    }
}

fn emit_retry(facts: &Facts, memoize: bool, no_match: &TokenStream) -> TokenStream {
    if facts.anchored {
        return quote! { return #no_match; };
    }
    // `spec.md` §4.2, "Optimizations applied": patterns with a required
    // prefix byte use a `memchr`-style fast byte scan to jump to candidate
    // starts, both at the initial position and on every backtrack fallback
    // retry, the same fast path the teacher's own engines use for a single
    // required literal byte.
    let scan = match facts.required_prefix_byte {
        Some(b) => quote! {
            search_start = match regexgen_support::memchr(#b, &input[(search_start + 1).min(len)..]) {
                Some(p) => search_start + 1 + p,
                None => return #no_match,
            };
        },
        None => quote! {
            search_start += 1;
            if search_start > len {
                return #no_match;
            }
        },
    };
    let memo_reset = if memoize { quote! { for v in visited.iter_mut() { *v = false; } } } else { quote! {} };
    quote! {
        #scan
        #memo_reset
        offset = search_start;
        continue 'search;
    }
}

fn emit_dispatch_arms(
    prog: &Prog,
    mode: CaptureMode,
    memoize: bool,
    checkpoint_alts: &HashSet<InstIdx>,
    frame_ident: &Ident,
) -> TokenStream {
    let arms: Vec<TokenStream> = prog
        .insts
        .iter()
        .enumerate()
        .map(|(idx, inst)| emit_one_arm(prog, idx, inst, mode, memoize, checkpoint_alts, frame_ident))
        .collect();
    let fallback_label = syn::Index::from(prog.insts.len());
    let fallback_body = emit_fallback_arm(mode, frame_ident);
    quote! { #(#arms)* #fallback_label => { #fallback_body } }
}

/// The fallback handler (`spec.md` §4.2): pop the top stack frame and
/// resume from it, or, if the stack is empty, fall through to the outer
/// retry (anchored patterns give up immediately; unanchored ones advance
/// `search_start` by one byte, per `emit_retry`).
fn emit_fallback_arm(mode: CaptureMode, frame_ident: &Ident) -> TokenStream {
    match mode {
        CaptureMode::None => quote! { break 'dispatch; },
        CaptureMode::ArrayCheckpoint => quote! {
            match stack.pop() {
                Some(#frame_ident::Alt { offset: saved_offset, target, snapshot_len }) => {
                    let base = snapshot_len - captures.len();
                    captures.copy_from_slice(&capture_stack[base..snapshot_len]);
                    capture_stack.truncate(base);
                    offset = saved_offset;
                    next_i = target;
                    continue 'dispatch;
                }
                Some(#frame_ident::AltPlain { offset: saved_offset, target }) => {
                    offset = saved_offset;
                    next_i = target;
                    continue 'dispatch;
                }
                None => break 'dispatch,
            }
        },
        CaptureMode::PerCaptureCheckpoint => quote! {
            loop {
                match stack.pop() {
                    Some(#frame_ident::Restore { slot, value }) => captures[slot] = value,
                    Some(#frame_ident::Alt { offset: saved_offset, target }) => {
                        offset = saved_offset;
                        next_i = target;
                        break;
                    }
                    None => break 'dispatch,
                }
            }
            continue 'dispatch;
        },
    }
}

fn emit_one_arm(
    prog: &Prog,
    idx: InstIdx,
    inst: &Inst,
    mode: CaptureMode,
    memoize: bool,
    checkpoint_alts: &HashSet<InstIdx>,
    frame_ident: &Ident,
) -> TokenStream {
    let label = syn::Index::from(idx);
    let body = match inst {
        Inst::Match => match mode {
            CaptureMode::None => quote! { return true; },
            _ => quote! {
                captures[1] = Some(offset);
                return Some(captures.to_vec());
            },
        },
        Inst::Fail => quote! { next_i = FALLBACK; continue; },
        Inst::Rune1 { byte, out } => {
            let out = syn::Index::from(*out);
            quote! {
                if offset >= len || input[offset] != #byte { next_i = FALLBACK; continue; }
                offset += 1;
                next_i = #out;
                continue;
            }
        }
        Inst::Rune { ranges, out } => {
            let test = emit_rune_test(ranges);
            let out = syn::Index::from(*out);
            quote! {
                if offset >= len { next_i = FALLBACK; continue; }
                let c = input[offset];
                if !(#test) { next_i = FALLBACK; continue; }
                offset += 1;
                next_i = #out;
                continue;
            }
        }
        Inst::RuneAny { out } => {
            let out = syn::Index::from(*out);
            quote! {
                if offset >= len { next_i = FALLBACK; continue; }
                offset += 1;
                next_i = #out;
                continue;
            }
        }
        Inst::RuneAnyNotNL { out } => {
            let out = syn::Index::from(*out);
            quote! {
                if offset >= len || input[offset] == b'\n' { next_i = FALLBACK; continue; }
                offset += 1;
                next_i = #out;
                continue;
            }
        }
        Inst::EmptyWidth { flags, out } => {
            let checks = emit_empty_width_checks(*flags);
            let out = syn::Index::from(*out);
            quote! {
                if !(#checks) { next_i = FALLBACK; continue; }
                next_i = #out;
                continue;
            }
        }
        Inst::AltMatch { out } => {
            let out = syn::Index::from(*out);
            quote! { next_i = #out; continue; }
        }
        Inst::Nop { out } => {
            let out = syn::Index::from(*out);
            quote! { next_i = #out; continue; }
        }
        Inst::Alt { out, arg } => {
            let needs_checkpoint = checkpoint_alts.contains(&idx);
            emit_alt_arm(idx, *out, *arg, mode, memoize, needs_checkpoint, frame_ident)
        }
        Inst::Capture { slot, out } => emit_capture_arm(*slot, *out, mode, frame_ident),
    };
    quote! { #label => { #body } }
}

fn emit_alt_arm(
    idx: InstIdx,
    out: InstIdx,
    arg: InstIdx,
    mode: CaptureMode,
    memoize: bool,
    needs_checkpoint: bool,
    frame_ident: &Ident,
) -> TokenStream {
    let out_idx = syn::Index::from(out);
    let arg_idx = syn::Index::from(arg);
    let memo_guard = if memoize {
        let id = syn::Index::from(idx);
        quote! {
            let memo_idx = #id * (len + 1) + offset;
            if visited[memo_idx] { next_i = FALLBACK; continue; }
            visited[memo_idx] = true;
        }
    } else {
        quote! {}
    };
    let push_frame = match mode {
        CaptureMode::None => quote! {},
        // Only an `Alt` whose `out` branch can reach a `Capture` before
        // `Match`/`Fail` needs its captures snapshotted (`spec.md` §3's
        // `alts_needing_checkpoint`; §4.2's frame layout names the
        // `has_checkpoint` bit explicitly). Every other `Alt` in array mode
        // pushes a plain control frame and skips the O(NumCap) copy.
        CaptureMode::ArrayCheckpoint if needs_checkpoint => quote! {
            capture_stack.extend_from_slice(&captures);
            stack.push(#frame_ident::Alt { offset, target: #arg_idx, snapshot_len: capture_stack.len() });
        },
        CaptureMode::ArrayCheckpoint => quote! {
            stack.push(#frame_ident::AltPlain { offset, target: #arg_idx });
        },
        CaptureMode::PerCaptureCheckpoint => quote! {
            stack.push(#frame_ident::Alt { offset, target: #arg_idx });
        },
    };
    quote! {
        #memo_guard
        #push_frame
        next_i = #out_idx;
        continue;
    }
}

fn emit_capture_arm(slot: usize, out: InstIdx, mode: CaptureMode, frame_ident: &Ident) -> TokenStream {
    let out_idx = syn::Index::from(out);
    match mode {
        CaptureMode::None => quote! { next_i = #out_idx; continue; },
        CaptureMode::ArrayCheckpoint => quote! {
            captures[#slot] = Some(offset);
            next_i = #out_idx;
            continue;
        },
        CaptureMode::PerCaptureCheckpoint => quote! {
            stack.push(#frame_ident::Restore { slot: #slot, value: captures[#slot] });
            captures[#slot] = Some(offset);
            next_i = #out_idx;
            continue;
        },
    }
}

fn emit_empty_width_checks(flags: EmptyFlags) -> TokenStream {
    let checks: Vec<TokenStream> = flags
        .iter()
        .map(|f| match f {
            EmptyFlags::TEXT_START => quote! { (offset == 0) },
            EmptyFlags::TEXT_END => quote! { (offset == len) },
            EmptyFlags::LINE_START => quote! { (offset == 0 || input[offset - 1] == b'\n') },
            EmptyFlags::LINE_END => quote! { (offset == len || input[offset] == b'\n') },
            EmptyFlags::WORD_BOUNDARY => quote! {
                ((offset > 0 && regexgen_support::ascii::is_word_byte(input[offset - 1]))
                    != (offset < len && regexgen_support::ascii::is_word_byte(input[offset])))
            },
            EmptyFlags::NOT_WORD_BOUNDARY => quote! {
                ((offset > 0 && regexgen_support::ascii::is_word_byte(input[offset - 1]))
                    == (offset < len && regexgen_support::ascii::is_word_byte(input[offset])))
            },
            _ => quote! { true },
        })
        .collect();
    if checks.is_empty() {
        quote! { true }
    } else {
        quote! { ( #(#checks)&&* ) }
    }
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
    fn is_match_emits_one_arm_per_instruction() {
        let (prog, facts) = facts_for("cat");
        let tokens = emit_is_match("match_cat", &prog, &facts, false);
        let rendered = tokens.to_string();
        assert!(rendered.contains("fn match_cat"));
        for idx in 0..prog.insts.len() {
            assert!(rendered.contains(&format!("{idx}usize =>")) || rendered.contains(&format!("{idx} =>")));
        }
    }

    #[test]
    fn find_emits_capture_slots() {
        let (prog, facts) = facts_for(r"(?P<y>\d{4})");
        let mode = choose_checkpoint_mode(&facts);
        let tokens = emit_find("find_year", &prog, &facts, false, mode, Some("Year"));
        let rendered = tokens.to_string();
        assert!(rendered.contains("captures"));
        assert!(rendered.contains("fn find_year_slots"));
        assert!(rendered.contains("fn find_year"));
        assert!(rendered.contains("YearMatch"));
        assert!(rendered.contains("from_slots"));
    }

    #[test]
    fn groupless_find_returns_a_whole_match_span() {
        let (prog, facts) = facts_for(r"\d{4}");
        let mode = choose_checkpoint_mode(&facts);
        let tokens = emit_find("find_digits", &prog, &facts, false, mode, None);
        let rendered = tokens.to_string();
        assert!(rendered.contains("Option < (usize , usize) >") || rendered.contains("Option<(usize, usize)>"));
    }

    #[test]
    fn checkpoint_mode_follows_the_threshold() {
        let (_, facts) = facts_for("(a)|(b)");
        assert_eq!(choose_checkpoint_mode(&facts), CheckpointMode::Array);
    }

    #[test]
    fn only_checkpoint_needing_alts_snapshot_captures() {
        // `(a)|b`: the one `Alt` can reach a `Capture`, so it must
        // snapshot. A pattern whose only `Alt`s can't reach a capture
        // should compile to plain control frames with no snapshot at all.
        let (prog, facts) = facts_for("(a)|b");
        assert_eq!(facts.alts_needing_checkpoint.len(), 1);
        let mode = choose_checkpoint_mode(&facts);
        let tokens = emit_find("find_ab", &prog, &facts, false, mode, Some("Ab"));
        assert!(tokens.to_string().contains("snapshot_len"));

        let (prog, facts) = facts_for("a|b");
        let mode = choose_checkpoint_mode(&facts);
        let tokens = emit_find("find_plain", &prog, &facts, false, mode, None);
        assert!(tokens.to_string().contains("AltPlain"));
    }

    #[test]
    fn backtrack_stack_and_capture_snapshot_are_pooled() {
        let (prog, facts) = facts_for(r"(?P<y>\d{4})");
        let mode = choose_checkpoint_mode(&facts);
        let tokens = emit_find("find_year", &prog, &facts, false, mode, Some("Year"));
        let rendered = tokens.to_string();
        assert!(rendered.contains("regexgen_support :: Pool") || rendered.contains("regexgen_support::Pool"));
        assert!(rendered.contains("STACK_POOL"));
        assert!(rendered.contains("CAPTURE_POOL"));
    }

    #[test]
    fn required_prefix_byte_scan_uses_memchr() {
        let (prog, facts) = facts_for("cat");
        let tokens = emit_is_match("match_cat", &prog, &facts, false);
        assert!(tokens.to_string().contains("regexgen_support :: memchr") || tokens.to_string().contains("memchr"));
    }
}
