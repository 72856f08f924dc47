/*!
The instruction program: a finite, indexable representation of a compiled
pattern consumed by every engine (`spec.md` §3, "Instruction program").

This is the one piece of the spec that elsewhere is a named external
collaborator (an upstream regex-syntax parser hands this to the generator
fully formed). No such crate exists to import, so `crate::hir_compile`
builds one of these from a `regex_syntax::hir::Hir`. Everything downstream
of this module — the analyzer, the three engines, capture framing — only
ever looks at `Prog`/`Inst`, never at the HIR.
*/

use alloc_ranges::RuneRange;

/// A single rune range, reusing `regex_syntax`'s closed-interval
/// representation so [`Inst::Rune`] can be built directly from an HIR class
/// without re-deriving the Unicode tables ourselves.
pub mod alloc_ranges {
    /// An inclusive `[start, end]` byte range, already sorted and
    /// non-overlapping by construction (callers only ever build these via
    /// [`crate::hir_compile`]).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct RuneRange {
        pub start: u8,
        pub end: u8,
    }

    impl RuneRange {
        pub fn new(start: u8, end: u8) -> RuneRange {
            RuneRange { start, end }
        }

        #[inline]
        pub fn contains(&self, byte: u8) -> bool {
            self.start <= byte && byte <= self.end
        }
    }
}

/// The index of an instruction within a [`Prog`].
///
/// Programs in this crate are always small enough (Thompson eligibility
/// caps at 64 instructions; backtracking and TDFA programs in practice stay
/// in the low thousands) that a `u32` is never a real constraint, but we
/// keep the type distinct from a bare `usize` so instruction indices can't
/// be confused with byte offsets into the haystack.
pub type InstIdx = usize;

/// Flags recorded on an [`Inst::EmptyWidth`] instruction.
///
/// A single instruction can assert more than one zero-width condition (the
/// compiler never needs to emit that today, but nothing prevents a future
/// HIR shape from producing it), so this is a bitflag set rather than an
/// enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyFlags(u8);

impl EmptyFlags {
    pub const TEXT_START: EmptyFlags = EmptyFlags(1 << 0);
    pub const TEXT_END: EmptyFlags = EmptyFlags(1 << 1);
    pub const LINE_START: EmptyFlags = EmptyFlags(1 << 2);
    pub const LINE_END: EmptyFlags = EmptyFlags(1 << 3);
    pub const WORD_BOUNDARY: EmptyFlags = EmptyFlags(1 << 4);
    pub const NOT_WORD_BOUNDARY: EmptyFlags = EmptyFlags(1 << 5);

    pub const fn empty() -> EmptyFlags {
        EmptyFlags(0)
    }

    pub const fn contains(self, other: EmptyFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: EmptyFlags) -> EmptyFlags {
        EmptyFlags(self.0 | other.0)
    }

    /// Iterate over the individual flags set in this set, for engines that
    /// must emit one test per condition (`spec.md` §4.2: "evaluate each flag
    /// in the set; on any failure, jump to fallback").
    pub fn iter(self) -> impl Iterator<Item = EmptyFlags> {
        const ALL: [EmptyFlags; 6] = [
            EmptyFlags::TEXT_START,
            EmptyFlags::TEXT_END,
            EmptyFlags::LINE_START,
            EmptyFlags::LINE_END,
            EmptyFlags::WORD_BOUNDARY,
            EmptyFlags::NOT_WORD_BOUNDARY,
        ];
        ALL.into_iter().filter(move |&f| self.contains(f))
    }
}

/// One instruction in a compiled program (`spec.md` §3).
///
/// `Out`/`Arg` successor fields follow the spec's naming exactly: `Alt`'s
/// `Out` is the preferred (greedy) successor and `Arg` is the backtrack
/// alternative; `Capture`'s `Arg` is the capture slot index rather than an
/// instruction index.
#[derive(Clone, Debug)]
pub enum Inst {
    /// Report a match. Terminal.
    Match,
    /// Report failure of the current thread/branch. Terminal.
    Fail,
    /// A single ASCII literal byte.
    Rune1 { byte: u8, out: InstIdx },
    /// A sorted, non-overlapping set of rune ranges.
    Rune { ranges: Vec<RuneRange>, out: InstIdx },
    /// Any byte, including newline.
    RuneAny { out: InstIdx },
    /// Any byte except newline.
    RuneAnyNotNL { out: InstIdx },
    /// Two successors: `out` is preferred (greedy), `arg` is the backtrack
    /// alternative.
    Alt { out: InstIdx, arg: InstIdx },
    /// An alternation that can never backtrack (used once a branch has
    /// already committed, e.g. after a once-only prefix has matched).
    AltMatch { out: InstIdx },
    /// Record the current offset into capture slot `slot`. Slot `2k`/`2k+1`
    /// are group `k`'s start/end; slot 0/1 is the full match.
    Capture { slot: usize, out: InstIdx },
    /// A zero-width assertion.
    EmptyWidth { flags: EmptyFlags, out: InstIdx },
    /// Epsilon transition.
    Nop { out: InstIdx },
}

impl Inst {
    /// The instruction's unconditional/greedy successor, if it has exactly
    /// one outgoing edge that always applies. `Alt` and `AltMatch` are
    /// handled specially by callers that need both branches; `Match`/`Fail`
    /// have none.
    pub fn out(&self) -> Option<InstIdx> {
        match *self {
            Inst::Match | Inst::Fail => None,
            Inst::Rune1 { out, .. }
            | Inst::Rune { out, .. }
            | Inst::RuneAny { out }
            | Inst::RuneAnyNotNL { out }
            | Inst::AltMatch { out }
            | Inst::Capture { out, .. }
            | Inst::EmptyWidth { out, .. }
            | Inst::Nop { out } => Some(out),
            Inst::Alt { out, .. } => Some(out),
        }
    }

    /// Whether this instruction consumes exactly one byte of input on
    /// success.
    pub fn is_byte_consuming(&self) -> bool {
        matches!(
            self,
            Inst::Rune1 { .. } | Inst::Rune { .. } | Inst::RuneAny { .. } | Inst::RuneAnyNotNL { .. }
        )
    }
}

/// A compiled instruction program plus its capture metadata (`spec.md` §3).
#[derive(Clone, Debug)]
pub struct Prog {
    pub insts: Vec<Inst>,
    pub start: InstIdx,
    /// Number of user-visible capture groups, *not* counting the implicit
    /// whole-match group 0.
    pub num_cap: usize,
    /// Indexed by group number; `names[0]` is always `None` (group 0 is the
    /// synthetic full match and is never user-named per `spec.md` §6).
    pub capture_names: Vec<Option<Box<str>>>,
    /// The original pattern text, kept for diagnostics only.
    pub original: String,
}

impl Prog {
    /// Number of capture slots (`2 * (num_cap + 1)`, per the spec's
    /// slot-pair convention).
    pub fn num_slots(&self) -> usize {
        2 * (self.num_cap + 1)
    }

    /// Walk from `from`, following `Nop` and `Capture` instructions, and
    /// return the first instruction that actually tests or consumes
    /// something (`spec.md` §4.1, `required_prefix_byte`'s walk and several
    /// other analyses that need the "real" first instruction).
    pub fn skip_epsilons(&self, from: InstIdx) -> InstIdx {
        let mut cur = from;
        loop {
            match &self.insts[cur] {
                Inst::Nop { out } => cur = *out,
                Inst::Capture { out, .. } => cur = *out,
                _ => return cur,
            }
        }
    }

    #[cfg(debug_assertions)]
    pub(crate) fn check_invariants(&self) {
        let n = self.insts.len();
        assert!(self.start < n, "start index out of range");
        for inst in &self.insts {
            match inst {
                Inst::Match | Inst::Fail => {}
                Inst::Rune1 { out, .. }
                | Inst::Rune { out, .. }
                | Inst::RuneAny { out }
                | Inst::RuneAnyNotNL { out }
                | Inst::AltMatch { out }
                | Inst::Capture { out, .. }
                | Inst::EmptyWidth { out, .. }
                | Inst::Nop { out } => assert!(*out < n, "out index out of range"),
                Inst::Alt { out, arg } => {
                    assert!(*out < n, "out index out of range");
                    assert!(*arg < n, "arg index out of range");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_epsilons_walks_past_nop_and_capture() {
        let prog = Prog {
            insts: vec![
                Inst::Nop { out: 1 },
                Inst::Capture { slot: 0, out: 2 },
                Inst::Rune1 { byte: b'a', out: 3 },
                Inst::Match,
            ],
            start: 0,
            num_cap: 0,
            capture_names: vec![None],
            original: "a".to_string(),
        };
        assert_eq!(prog.skip_epsilons(0), 2);
    }

    #[test]
    fn empty_flags_iterate_individually() {
        let f = EmptyFlags::TEXT_START.union(EmptyFlags::WORD_BOUNDARY);
        let got: Vec<_> = f.iter().collect();
        assert_eq!(got, vec![EmptyFlags::TEXT_START, EmptyFlags::WORD_BOUNDARY]);
    }
}
