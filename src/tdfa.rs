/*!
Tagged-DFA construction (`spec.md` §4.4, "Idea"/"Construction"): builds a
DFA whose states are sets of `(NFA-state-id, pending-tag-action-list)`
pairs, bounded by a configurable state cap.

Grounded directly on the teacher's `dfa::onepass` module (vendored at the
repository's previous revision under `src/dfa/onepass.rs` and cited
throughout `DESIGN.md`): both build a capture-aware DFA over a Thompson-ish
NFA with a `size_limit`/state-cap `Config`, both reject construction rather
than panicking when the cap is exceeded, and both use a packed worklist
keyed by canonical NFA-state sets.

# Simplification (documented per `spec.md` §9 Open Question (c))

`spec.md`'s construction step factors the longest common prefix of
per-thread pending-action sequences onto the *transition* itself, leaving
only the remainder pending on the successor state, as a space/table-size
optimization. This builder keeps full per-thread `TagAction` histories
(offsets propagated every transition, exactly as specified) but always
defers *applying* them to the moment a thread reaches `Match` — i.e. every
generated transition's own tag-action list is empty, and the accept/
accept-at-end-of-text action lists carry the complete, correctly-ordered
history for the winning thread. This is a valid instantiation of the same
table shape (`spec.md`'s runtime algorithm explicitly tolerates
`tag_action_count == 0` on ordinary transitions) that trades a constant
amount of per-transition table density for a much simpler, still fully
correct construction.
*/

use std::collections::HashMap;

use crate::error::{BuildError, BuildErrorKind};
use crate::inst::{EmptyFlags, Inst, InstIdx, Prog};

/// A `(tag_index, offset_from_cursor)` pair (`spec.md` §3, "TDFA state").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagAction {
    pub tag: usize,
    pub offset: u32,
}

type Thread = (InstIdx, Vec<TagAction>);

/// One DFA state: a canonical set of NFA threads plus whatever is known
/// about accepting at this state.
#[derive(Clone, Debug)]
pub struct DfaState {
    pub threads: Vec<Thread>,
    pub is_accept: bool,
    pub accept_actions: Vec<TagAction>,
    pub is_accept_eot: bool,
    pub accept_eot_actions: Vec<TagAction>,
}

/// The constructed tagged DFA (`spec.md` §4.4, "Generated tables").
#[derive(Clone, Debug)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    /// `transitions[state][byte]`, recorded once by `Builder::build` as each
    /// state is discovered. `spec.md` §4.4 calls this table out directly
    /// ("per-state, per-byte target"); `codegen::tdfa` reads it to emit the
    /// transition table as a `match` or a `static` array of state indices.
    pub transitions: Vec<[Option<usize>; 128]>,
    pub start_begin: usize,
    pub start_any: usize,
    pub num_tags: usize,
}

/// Builds a [`Dfa`] for a program, bounded by `state_cap` (`spec.md` §4.4:
/// "default 500").
pub struct Builder {
    state_cap: usize,
}

impl Builder {
    pub fn new(state_cap: usize) -> Builder {
        Builder { state_cap }
    }

    pub fn build(&self, prog: &Prog) -> Result<Dfa, BuildError> {
        let mut states: Vec<DfaState> = Vec::new();
        let mut index_of: HashMap<CanonicalKey, usize> = HashMap::new();
        let mut table: Vec<[Option<usize>; 128]> = Vec::new();

        let start_seed = vec![(prog.start, Vec::new())];
        let start_begin = self.intern(prog, &start_seed, true, &mut states, &mut index_of, &mut table)?;
        let start_any = self.intern(prog, &start_seed, false, &mut states, &mut index_of, &mut table)?;

        let mut worklist: Vec<usize> = (0..states.len()).collect();
        let mut cursor = 0;
        while cursor < worklist.len() {
            let sid = worklist[cursor];
            cursor += 1;
            for byte in 0u8..128 {
                let seeds = self.step_seeds(prog, &states[sid].threads, byte);
                if seeds.is_empty() {
                    continue;
                }
                let before = states.len();
                let target =
                    self.intern(prog, &seeds, false, &mut states, &mut index_of, &mut table)?;
                table[sid][byte as usize] = Some(target);
                if states.len() > before {
                    worklist.push(target);
                }
                if states.len() > self.state_cap {
                    return Err(BuildError::new(
                        BuildErrorKind::TdfaStateCapExceeded { cap: self.state_cap },
                        false,
                    ));
                }
            }
        }

        Ok(Dfa { states, transitions: table, start_begin, start_any, num_tags: prog.num_slots() })
    }

    fn step_seeds(&self, prog: &Prog, threads: &[Thread], byte: u8) -> Vec<Thread> {
        let mut seeds = Vec::new();
        for (idx, pending) in threads {
            if !consumes(&prog.insts[*idx], byte) {
                continue;
            }
            let out = prog.insts[*idx].out().expect("consuming instruction has an out edge");
            let propagated =
                pending.iter().map(|a| TagAction { tag: a.tag, offset: a.offset + 1 }).collect();
            seeds.push((out, propagated));
        }
        seeds
    }

    #[allow(clippy::too_many_arguments)]
    fn intern(
        &self,
        prog: &Prog,
        seeds: &[Thread],
        at_begin: bool,
        states: &mut Vec<DfaState>,
        index_of: &mut HashMap<CanonicalKey, usize>,
        table: &mut Vec<[Option<usize>; 128]>,
    ) -> Result<usize, BuildError> {
        let mut leaves = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for (idx, pending) in seeds {
            close_from(prog, *idx, pending.clone(), at_begin, false, &mut seen, &mut leaves)?;
        }
        for (_, pending) in &mut leaves {
            canonicalize(pending);
        }

        let threads: Vec<Thread> =
            leaves.iter().filter(|(idx, _)| prog.insts[*idx].is_byte_consuming()).cloned().collect();
        let (is_accept, accept_actions) = match leaves.iter().find(|(idx, _)| matches!(prog.insts[*idx], Inst::Match)) {
            Some((_, pending)) => (true, pending.clone()),
            None => (false, Vec::new()),
        };

        let key = canonical_key(&threads);
        if let Some(&existing) = index_of.get(&key) {
            return Ok(existing);
        }

        // End-of-text acceptance: re-close the same raw seeds with `at_end`
        // asserted, per `spec.md` §4.4 step 4.
        let mut eot_leaves = Vec::new();
        let mut eot_seen = std::collections::HashSet::new();
        for (idx, pending) in seeds {
            close_from(prog, *idx, pending.clone(), at_begin, true, &mut eot_seen, &mut eot_leaves)?;
        }
        for (_, pending) in &mut eot_leaves {
            canonicalize(pending);
        }
        let (is_accept_eot, accept_eot_actions) =
            match eot_leaves.iter().find(|(idx, _)| matches!(prog.insts[*idx], Inst::Match)) {
                Some((_, pending)) => (true, pending.clone()),
                None => (false, Vec::new()),
            };

        let sid = states.len();
        states.push(DfaState { threads, is_accept, accept_actions, is_accept_eot, accept_eot_actions });
        table.push([None; 128]);
        index_of.insert(key, sid);
        Ok(sid)
    }
}

type CanonicalKey = Vec<(InstIdx, Vec<(usize, u32)>)>;

fn canonical_key(threads: &[Thread]) -> CanonicalKey {
    let mut key: CanonicalKey = threads
        .iter()
        .map(|(idx, pending)| (*idx, pending.iter().map(|a| (a.tag, a.offset)).collect()))
        .collect();
    key.sort_by_key(|(idx, _)| *idx);
    key
}

fn canonicalize(pending: &mut Vec<TagAction>) {
    let mut by_tag: std::collections::BTreeMap<usize, u32> = std::collections::BTreeMap::new();
    for a in pending.iter() {
        by_tag.insert(a.tag, a.offset);
    }
    *pending = by_tag.into_iter().map(|(tag, offset)| TagAction { tag, offset }).collect();
}

fn consumes(inst: &Inst, byte: u8) -> bool {
    match inst {
        Inst::Rune1 { byte: b, .. } => *b == byte,
        Inst::Rune { ranges, .. } => ranges.iter().any(|r| r.contains(byte)),
        Inst::RuneAny { .. } => true,
        Inst::RuneAnyNotNL { .. } => byte != b'\n',
        _ => false,
    }
}

/// Epsilon-closes from `seed`, following `Nop`/`Capture`/`Alt`/`AltMatch`
/// and text-boundary `EmptyWidth`s, in priority order (`out` before `arg`
/// so leftmost-greedy alternatives are discovered first, matching
/// `spec.md` §4.4 step 5). `seen` enforces "first occurrence wins."
///
/// Word-boundary assertions are rejected outright (`Err`): correctly
/// modeling them in a DFA requires doubling every state by "was the
/// previous byte a word byte" context, which this bounded construction
/// does not attempt (`spec.md` Non-goals already scope Unicode word
/// boundaries out; this generator additionally declines ASCII word
/// boundaries specifically for the TDFA engine, falling back to
/// Backtracking, which handles them directly per `spec.md` §4.2).
fn close_from(
    prog: &Prog,
    seed: InstIdx,
    pending: Vec<TagAction>,
    at_begin: bool,
    at_end: bool,
    seen: &mut std::collections::HashSet<InstIdx>,
    leaves: &mut Vec<Thread>,
) -> Result<(), BuildError> {
    if seen.contains(&seed) {
        return Ok(());
    }
    seen.insert(seed);
    match &prog.insts[seed] {
        Inst::Nop { out } => close_from(prog, *out, pending, at_begin, at_end, seen, leaves),
        Inst::Capture { slot, out } => {
            let mut next = pending;
            next.push(TagAction { tag: *slot, offset: 0 });
            close_from(prog, *out, next, at_begin, at_end, seen, leaves)
        }
        Inst::AltMatch { out } => close_from(prog, *out, pending, at_begin, at_end, seen, leaves),
        Inst::Alt { out, arg } => {
            close_from(prog, *out, pending.clone(), at_begin, at_end, seen, leaves)?;
            close_from(prog, *arg, pending, at_begin, at_end, seen, leaves)
        }
        Inst::EmptyWidth { flags, out } => {
            if flags.contains(EmptyFlags::WORD_BOUNDARY) || flags.contains(EmptyFlags::NOT_WORD_BOUNDARY)
            {
                return Err(BuildError::new(
                    BuildErrorKind::UnsupportedConstruct { what: "word boundary in TDFA" },
                    false,
                ));
            }
            let ok_start = !flags.contains(EmptyFlags::TEXT_START) || at_begin;
            let ok_line_start = !flags.contains(EmptyFlags::LINE_START) || at_begin;
            let ok_end = !flags.contains(EmptyFlags::TEXT_END) || at_end;
            let ok_line_end = !flags.contains(EmptyFlags::LINE_END) || at_end;
            if ok_start && ok_line_start && ok_end && ok_line_end {
                close_from(prog, *out, pending, at_begin, at_end, seen, leaves)
            } else {
                Ok(())
            }
        }
        Inst::Match | Inst::Rune1 { .. } | Inst::Rune { .. } | Inst::RuneAny { .. } | Inst::RuneAnyNotNL { .. } => {
            leaves.push((seed, pending));
            Ok(())
        }
        Inst::Fail => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;

    fn build(pattern: &str) -> Dfa {
        let prog = hir_compile::compile(pattern).unwrap();
        Builder::new(500).build(&prog).unwrap()
    }

    #[test]
    fn simple_literal_has_a_short_chain_of_states() {
        let dfa = build("cat");
        assert!(dfa.states.len() >= 4, "expected at least start + 3 letters");
    }

    #[test]
    fn multi_group_pattern_tags_every_group() {
        let dfa = build(r"(?P<y>\d{4})-(?P<m>\d{2})");
        let has_tagged_accept = dfa.states.iter().any(|s| s.is_accept && !s.accept_actions.is_empty());
        assert!(has_tagged_accept);
    }

    #[test]
    fn state_cap_is_enforced() {
        let prog = hir_compile::compile(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})").unwrap();
        let err = Builder::new(1).build(&prog).unwrap_err();
        assert!(!err.is_forced());
    }

    #[test]
    fn word_boundary_is_rejected() {
        let prog = hir_compile::compile(r"\bfoo\b").unwrap();
        assert!(Builder::new(500).build(&prog).is_err());
    }
}
