//! Scenario fixtures for `regexgen` (`spec.md` §8, "Concrete end-to-end
//! scenarios"). This crate has no runtime code of its own: since generated
//! matcher source is never compiled or executed as part of this exercise,
//! `tests/scenarios.rs` asserts each scenario's pattern compiles to the
//! engine and shape `spec.md` §8 implies, rather than running the emitted
//! matcher against the scenario's sample input.
