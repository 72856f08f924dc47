/*!
`regexgen`: a code generator that compiles a regular expression into
specialized, dependency-free matcher source code rather than an interpreter
program (`spec.md` §1).

Given a pattern, [`generator::generate`] produces a `proc_macro2::TokenStream`
(render it to formatted text with `prettyplease`) implementing one of three
matching strategies — Backtracking, Thompson NFA, or a Tagged DFA — chosen by
static analysis (`analysis`/`select`) rather than specified by the caller.
This crate never interprets a regex program at match time and never executes
the code it emits; see `tests/` for how its properties are verified without
running `rustc` on generated output.
*/

pub mod analysis;
pub mod cli;
pub mod codegen;
pub mod error;
pub mod generator;
pub mod hir_compile;
pub mod inst;
pub mod select;
pub mod streaming;
pub mod tdfa;
pub mod template;

pub use error::{BuildError, PatternError, StreamConfigError, TemplateError};
pub use generator::{generate, GeneratorConfig};
