/*!
The analyzer (`spec.md` §4.1): computes static facts about a compiled
program so the engine selector can pick a matching strategy without the
caller ever specifying one by hand.

Grounded on the teacher's `hir::Properties` (referenced throughout
`meta/mod.rs`/`meta/strategy.rs` as `props`/`props_union`, used to decide
things like "is this anchored" and "does this look need Unicode word
boundaries" before a strategy is chosen) — same idea, computed over our own
`Prog`/`Hir` instead of the teacher's richer property set, since our facts
are exactly the ones `spec.md` §3 enumerates and no more.
*/

use std::collections::HashSet;

use regex_syntax::hir::{Hir, HirKind};

use crate::inst::{EmptyFlags, Inst, InstIdx, Prog};

/// The maximum representable match length; used for `max_len` when any
/// reachable quantifier is unbounded.
pub const UNBOUNDED: usize = usize::MAX;

/// Static facts about a program, computed once and reused by the engine
/// selector and every engine's code generator.
#[derive(Clone, Debug)]
pub struct Facts {
    pub anchored: bool,
    pub has_end_anchor: bool,
    pub needs_backtracking: bool,
    pub catastrophic_risk: bool,
    pub required_prefix_byte: Option<u8>,
    pub min_len: usize,
    pub max_len: usize,
    /// `Alt` instruction indices whose `out` branch can reach a `Capture`
    /// before `Match`/`Fail`. Engines only need to checkpoint captures
    /// across an `Alt` in this set (`spec.md` §3).
    pub alts_needing_checkpoint: HashSet<InstIdx>,
}

impl Facts {
    /// Compute every fact in `spec.md` §3 for `prog`, using `hir` (the
    /// structure `prog` was compiled from) for the two facts that are far
    /// more naturally computed over a tree than over a flattened program:
    /// `catastrophic_risk` and the Kleene-style `min_len`/`max_len` bounds.
    pub fn compute(prog: &Prog, hir: &Hir) -> Facts {
        let anchored = anchored(prog);
        let has_end_anchor = has_end_anchor(prog);
        let needs_backtracking = prog.insts.iter().any(|i| matches!(i, Inst::Alt { .. }));
        let catastrophic_risk = catastrophic_risk(hir, false);
        let required_prefix_byte = required_prefix_byte(prog);
        let (min_len, max_len) = len_bounds(hir);
        let alts_needing_checkpoint = alts_needing_checkpoint(prog);
        Facts {
            anchored,
            has_end_anchor,
            needs_backtracking,
            catastrophic_risk,
            required_prefix_byte,
            min_len,
            max_len,
            alts_needing_checkpoint,
        }
    }
}

/// `anchored(prog)`: true iff the start instruction (after skipping nothing
/// — the very first instruction, since captures/nops haven't been
/// introduced yet at the program's true start) asserts text-begin.
///
/// The program's true start is always `Capture { slot: 0, .. }` (the
/// synthetic whole-match group), so we skip epsilons from there exactly as
/// `spec.md` §4.1 describes for `required_prefix_byte`.
fn anchored(prog: &Prog) -> bool {
    let real_start = prog.skip_epsilons(prog.start);
    matches!(
        &prog.insts[real_start],
        Inst::EmptyWidth { flags, .. } if flags.contains(EmptyFlags::TEXT_START)
    )
}

/// `has_end_anchor(prog)`: any `EmptyWidth` carrying the text-end flag.
fn has_end_anchor(prog: &Prog) -> bool {
    prog.insts.iter().any(
        |i| matches!(i, Inst::EmptyWidth { flags, .. } if flags.contains(EmptyFlags::TEXT_END)),
    )
}

/// `required_prefix_byte(prog)`: walk from start skipping `Nop`/`Capture`;
/// if the first consumer is a single ASCII `Rune1`, return it.
fn required_prefix_byte(prog: &Prog) -> Option<u8> {
    let real_start = prog.skip_epsilons(prog.start);
    match &prog.insts[real_start] {
        Inst::Rune1 { byte, .. } if byte.is_ascii() => Some(*byte),
        _ => None,
    }
}

/// `catastrophic_risk(ast)`: recursive AST walk with a boolean flag "inside
/// a quantifier"; true on a quantifier whose flag is already true.
fn catastrophic_risk(hir: &Hir, inside_quantifier: bool) -> bool {
    match hir.kind() {
        HirKind::Empty | HirKind::Literal(_) | HirKind::Class(_) | HirKind::Look(_) => false,
        HirKind::Capture(cap) => catastrophic_risk(&cap.sub, inside_quantifier),
        HirKind::Concat(subs) | HirKind::Alternation(subs) => {
            subs.iter().any(|s| catastrophic_risk(s, inside_quantifier))
        }
        HirKind::Repetition(rep) => {
            // A repetition that can match zero or more than one instance of
            // its body is the kind that matters here; `{1,1}` (today
            // unreachable since the parser normalizes it away, but cheap to
            // guard) isn't really a quantifier for this purpose.
            let is_quantifier = !(rep.min == 1 && rep.max == Some(1));
            if is_quantifier && inside_quantifier {
                return true;
            }
            catastrophic_risk(&rep.sub, inside_quantifier || is_quantifier)
        }
    }
}

/// `min_len`/`max_len`: bottom-up over the AST with the usual Kleene
/// rules.
fn len_bounds(hir: &Hir) -> (usize, usize) {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => (0, 0),
        HirKind::Literal(lit) => (lit.0.len(), lit.0.len()),
        HirKind::Class(_) => (1, 1),
        HirKind::Capture(cap) => len_bounds(&cap.sub),
        HirKind::Concat(subs) => subs.iter().map(len_bounds).fold((0, 0), |(amin, amax), (bmin, bmax)| {
            (amin.saturating_add(bmin), sat_add(amax, bmax))
        }),
        HirKind::Alternation(subs) => {
            let mut it = subs.iter().map(len_bounds);
            let Some(first) = it.next() else { return (0, 0) };
            it.fold(first, |(amin, amax), (bmin, bmax)| (amin.min(bmin), sat_max(amax, bmax)))
        }
        HirKind::Repetition(rep) => {
            let (smin, smax) = len_bounds(&rep.sub);
            let min = smin.saturating_mul(rep.min as usize);
            let max = match rep.max {
                None => {
                    if smax == 0 {
                        0
                    } else {
                        UNBOUNDED
                    }
                }
                Some(m) => sat_mul(smax, m as usize),
            };
            (min, max)
        }
    }
}

fn sat_add(a: usize, b: usize) -> usize {
    if a == UNBOUNDED || b == UNBOUNDED { UNBOUNDED } else { a.saturating_add(b) }
}
fn sat_max(a: usize, b: usize) -> usize {
    if a == UNBOUNDED || b == UNBOUNDED { UNBOUNDED } else { a.max(b) }
}
fn sat_mul(a: usize, b: usize) -> usize {
    if a == UNBOUNDED || b == 0 {
        if b == 0 { 0 } else { UNBOUNDED }
    } else {
        a.saturating_mul(b)
    }
}

/// `alts_needing_checkpoint(prog)`: for each `Alt`, a reachability search
/// from its `out` successor flags it if any `Capture` is reachable before
/// `Match`/`Fail`.
fn alts_needing_checkpoint(prog: &Prog) -> HashSet<InstIdx> {
    let mut out = HashSet::new();
    for (idx, inst) in prog.insts.iter().enumerate() {
        if let Inst::Alt { out: target, .. } = inst {
            if reaches_capture_before_terminal(prog, *target) {
                out.insert(idx);
            }
        }
    }
    out
}

fn reaches_capture_before_terminal(prog: &Prog, from: InstIdx) -> bool {
    let mut seen = vec![false; prog.insts.len()];
    let mut stack = vec![from];
    while let Some(idx) = stack.pop() {
        if seen[idx] {
            continue;
        }
        seen[idx] = true;
        match &prog.insts[idx] {
            Inst::Capture { .. } => return true,
            Inst::Match | Inst::Fail => continue,
            Inst::Alt { out, arg } => {
                stack.push(*out);
                stack.push(*arg);
            }
            other => {
                if let Some(out) = other.out() {
                    stack.push(out);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;

    fn facts(pattern: &str) -> Facts {
        let hir = regex_syntax::Parser::new().parse(pattern).unwrap();
        let prog = hir_compile::compile(pattern).unwrap();
        Facts::compute(&prog, &hir)
    }

    #[test]
    fn anchored_pattern_is_detected() {
        assert!(facts(r"^abc").anchored);
        assert!(!facts(r"abc").anchored);
    }

    #[test]
    fn end_anchor_is_detected() {
        assert!(facts(r"abc$").has_end_anchor);
        assert!(!facts(r"abc").has_end_anchor);
    }

    #[test]
    fn required_prefix_byte_is_the_first_literal() {
        assert_eq!(facts("cat").required_prefix_byte, Some(b'c'));
        assert_eq!(facts("(cat)").required_prefix_byte, Some(b'c'));
        assert_eq!(facts("[cd]at").required_prefix_byte, None);
        // `^` compiles to a leading `EmptyWidth`, which the walk does not
        // skip (only `Nop`/`Capture` are skipped per `spec.md` §4.1), so an
        // anchored pattern reports no required prefix byte here even though
        // one exists just past the anchor.
        assert_eq!(facts("^cat").required_prefix_byte, None);
    }

    #[test]
    fn nested_quantifiers_are_flagged_catastrophic() {
        assert!(facts("(a+)+b").catastrophic_risk);
        assert!(!facts("a+b").catastrophic_risk);
        assert!(!facts("(a+)(b+)").catastrophic_risk);
    }

    #[test]
    fn length_bounds_follow_kleene_rules() {
        let f = facts(r"\d{4}-\d{2}-\d{2}");
        assert_eq!((f.min_len, f.max_len), (10, 10));

        let f = facts("a*");
        assert_eq!(f.min_len, 0);
        assert_eq!(f.max_len, UNBOUNDED);

        let f = facts("a|bb");
        assert_eq!((f.min_len, f.max_len), (1, 2));
    }

    #[test]
    fn checkpoint_needed_only_when_capture_reachable() {
        let f = facts("(a)|b");
        assert_eq!(f.alts_needing_checkpoint.len(), 1);

        let f = facts("a|b");
        assert!(f.alts_needing_checkpoint.is_empty());
    }
}
