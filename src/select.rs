/*!
The engine selector (`spec.md` §4.1, "Engine selection"): turns analysis
facts plus a handful of forcing flags into a concrete choice of match engine
and (if the pattern has capture groups) capture engine.

Grounded on the teacher's `meta::strategy` module: the teacher's `Regex`
holds a `strat: Arc<dyn Strategy>` chosen once at build time by inspecting
`hir::Properties` and trying, in order, a prefilter-only strategy, a
multi-literal Aho-Corasick strategy, and finally falling through to its
general NFA/DFA engines. `Selection` here is the same idea distilled to the
exact three-engine universe `spec.md` §4.1 specifies, with the fallback
chain made explicit instead of trait-object dispatch (this crate has no
runtime polymorphism to dispatch on: the generator commits to one variant
per `spec.md` §9, "the generator itself composes over a sum type").
*/

use log::debug;

use crate::analysis::Facts;
use crate::error::{BuildError, BuildErrorKind};
use crate::inst::Prog;
use crate::tdfa::{self, Dfa};

/// The chosen strategy for boolean-only `Match*` operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchEngine {
    Thompson,
    BacktrackMemo,
    Backtrack,
}

/// The chosen strategy for `Find*` operations. Always selected, even for a
/// pattern with no user capture groups: slots 0/1 (the whole match) always
/// exist (`spec.md` §3), so `Find*` is never reduced to wrapping
/// `MatchEngine`'s boolean result; only the named `{Name}Match` struct is
/// omitted when there are no named groups to put in it.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum CaptureEngine {
    Tdfa(Box<Dfa>),
    BacktrackMemoCheckpoint,
    BacktrackCheckpoint,
}

/// Flags a caller can use to force a specific engine, mirroring the CLI
/// surface in `spec.md` §6 (`-force-thompson`, `-force-tnfa`, `-force-tdfa`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Force {
    pub thompson: bool,
    pub tdfa: bool,
}

/// The state cap used when attempting TDFA construction (`spec.md` §4.4).
pub const DEFAULT_TDFA_STATE_CAP: usize = 500;

/// The instruction-count ceiling under which the Thompson engine may be
/// selected (`spec.md` §4.1).
pub const THOMPSON_MAX_INSTRUCTIONS: usize = 64;

/// The outcome of running the selector over a program. `capture_engine` is
/// always populated: `Find*` reports at least the whole-match span even for
/// a pattern with no user capture groups (`spec.md` §3).
pub struct Selection {
    pub match_engine: MatchEngine,
    pub capture_engine: CaptureEngine,
}

/// Runs `spec.md` §4.1's selection rules over `prog`/`facts`.
///
/// Fails only when an engine was *forced* and could not be built (`spec.md`
/// §7: "Not surfaced unless the user forced that engine"); an unforced TDFA
/// that can't be built for the state cap silently falls back to
/// Backtracking instead of erroring.
pub fn select(
    prog: &Prog,
    facts: &Facts,
    force: Force,
    tdfa_state_cap: usize,
    verbose: bool,
) -> Result<Selection, BuildError> {
    let match_engine = select_match_engine(prog, facts, force, verbose);
    // `Find*` reports the whole-match span even for a pattern with no user
    // capture groups (`spec.md` §3: slots 0/1 always exist), so a capture
    // engine is always selected; only the generated `{Name}Match` struct is
    // skipped when there are no named fields to put in it.
    let capture_engine = select_capture_engine(prog, facts, force, tdfa_state_cap, verbose)?;
    Ok(Selection { match_engine, capture_engine })
}

fn select_match_engine(prog: &Prog, facts: &Facts, force: Force, verbose: bool) -> MatchEngine {
    let thompson_eligible = prog.insts.len() <= THOMPSON_MAX_INSTRUCTIONS && !facts.has_end_anchor;

    if force.thompson {
        if verbose {
            debug!("match engine: Thompson (forced)");
        }
        return MatchEngine::Thompson;
    }
    if facts.catastrophic_risk && thompson_eligible {
        if verbose {
            debug!(
                "match engine: Thompson (catastrophic risk detected, {} instructions <= {}, no end anchor)",
                prog.insts.len(),
                THOMPSON_MAX_INSTRUCTIONS
            );
        }
        return MatchEngine::Thompson;
    }
    if facts.catastrophic_risk {
        if verbose {
            debug!("match engine: Backtracking with memoization (catastrophic risk detected)");
        }
        return MatchEngine::BacktrackMemo;
    }
    if verbose {
        debug!("match engine: plain Backtracking");
    }
    MatchEngine::Backtrack
}

fn select_capture_engine(
    prog: &Prog,
    facts: &Facts,
    force: Force,
    tdfa_state_cap: usize,
    verbose: bool,
) -> Result<CaptureEngine, BuildError> {
    let want_tdfa = force.tdfa || facts.catastrophic_risk;
    if want_tdfa {
        match tdfa::Builder::new(tdfa_state_cap).build(prog) {
            Ok(dfa) => {
                if verbose {
                    debug!(
                        "capture engine: Tagged DFA ({} states, cap {})",
                        dfa.states.len(),
                        tdfa_state_cap
                    );
                }
                return Ok(CaptureEngine::Tdfa(Box::new(dfa)));
            }
            Err(err) => {
                if force.tdfa {
                    // The caller asked specifically for TDFA; surface the
                    // reason why it couldn't be built instead of silently
                    // falling back (`spec.md` §7: "Not surfaced unless the
                    // user forced that engine").
                    return Err(BuildError::new(
                        BuildErrorKind::TdfaStateCapExceeded { cap: tdfa_state_cap },
                        true,
                    ));
                }
                if verbose {
                    debug!("capture engine: TDFA construction rejected ({err}), falling back");
                }
            }
        }
    }
    Ok(if facts.catastrophic_risk {
        if verbose {
            debug!("capture engine: Backtracking with checkpointing and memoization");
        }
        CaptureEngine::BacktrackMemoCheckpoint
    } else {
        if verbose {
            debug!("capture engine: Backtracking with checkpointing");
        }
        CaptureEngine::BacktrackCheckpoint
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir_compile;

    fn select_for(pattern: &str) -> Selection {
        let hir = regex_syntax::Parser::new().parse(pattern).unwrap();
        let prog = hir_compile::compile(pattern).unwrap();
        let facts = Facts::compute(&prog, &hir);
        select(&prog, &facts, Force::default(), DEFAULT_TDFA_STATE_CAP, false).unwrap()
    }

    #[test]
    fn forced_tdfa_that_cannot_build_is_an_error_not_a_panic() {
        let hir = regex_syntax::Parser::new().parse(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})").unwrap();
        let prog = hir_compile::compile(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})").unwrap();
        let facts = Facts::compute(&prog, &hir);
        let force = Force { thompson: false, tdfa: true };
        let err = select(&prog, &facts, force, 1, false).unwrap_err();
        assert!(err.is_forced());
    }

    #[test]
    fn plain_pattern_uses_plain_backtracking() {
        let sel = select_for("abc");
        assert_eq!(sel.match_engine, MatchEngine::Backtrack);
    }

    #[test]
    fn catastrophic_small_program_prefers_thompson_for_match() {
        let sel = select_for("(a+)+b");
        assert_eq!(sel.match_engine, MatchEngine::Thompson);
    }

    #[test]
    fn catastrophic_pattern_with_end_anchor_forces_backtracking() {
        let sel = select_for("(a+)+b$");
        assert_eq!(sel.match_engine, MatchEngine::BacktrackMemo);
    }

    #[test]
    fn multi_group_pattern_without_catastrophic_risk_gets_plain_checkpointing() {
        let sel = select_for(r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})");
        match sel.capture_engine {
            CaptureEngine::BacktrackCheckpoint => {}
            other => panic!("expected plain checkpointing, got {other:?}"),
        }
    }
}
