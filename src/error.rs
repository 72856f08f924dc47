/*!
Error types produced while analyzing a pattern, selecting an engine, building
a tagged DFA, resolving a replacement template, or configuring a streaming
reader.

None of the code in this crate panics on untrusted input. Every fallible
operation returns a `Result` whose error type is defined here, following the
same shape as the teacher's `dfa::onepass::Error`-style construction errors:
a small `enum` with a `Kind`-ish set of variants and a `Display` impl, no
`std::error::Error::source` chaining beyond what `regex-syntax` already
gives us.
*/

use core::fmt;

/// The pattern's surface syntax failed to parse.
///
/// This wraps `regex_syntax::Error` verbatim (per `spec.md` §7:
/// "Pattern-invalid: syntactic errors from the upstream parser; surfaced
/// verbatim").
#[derive(Clone, Debug)]
pub struct PatternError {
    pattern: String,
    cause: regex_syntax::Error,
}

impl PatternError {
    pub(crate) fn new(pattern: &str, cause: regex_syntax::Error) -> PatternError {
        PatternError { pattern: pattern.to_string(), cause }
    }

    /// The pattern that failed to parse.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern `{}`: {}", self.pattern, self.cause)
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// An engine could not be built for a pattern under the engine selector's
/// current configuration.
///
/// This is the "Engine-infeasible" case from `spec.md` §7: TDFA state cap
/// exceeded, Thompson instruction-count cap exceeded, or a construct the
/// chosen engine cannot represent (e.g. a Unicode-only word boundary). It is
/// not fatal unless the caller *forced* that specific engine (`forced:
/// true`); the selector otherwise falls back silently (and, in verbose mode,
/// logs the decision via `log::debug!`).
#[derive(Clone, Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
    forced: bool,
}

#[derive(Clone, Debug)]
pub(crate) enum BuildErrorKind {
    TdfaStateCapExceeded { cap: usize },
    ThompsonTooManyInstructions { len: usize, cap: usize },
    UnsupportedConstruct { what: &'static str },
}

impl BuildError {
    pub(crate) fn new(kind: BuildErrorKind, forced: bool) -> BuildError {
        BuildError { kind, forced }
    }

    /// Whether this failure should be surfaced to the caller (the engine was
    /// explicitly forced) or silently triggers fallback to the next engine.
    pub fn is_forced(&self) -> bool {
        self.forced
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BuildErrorKind::TdfaStateCapExceeded { cap } => {
                write!(f, "tagged DFA construction exceeded the state cap ({cap})")
            }
            BuildErrorKind::ThompsonTooManyInstructions { len, cap } => {
                write!(
                    f,
                    "program has {len} instructions, which exceeds the Thompson engine's cap of {cap}"
                )
            }
            BuildErrorKind::UnsupportedConstruct { what } => {
                write!(f, "construct not supported by the requested engine: {what}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// A replacement template referenced a capture group that does not exist.
///
/// Per `spec.md` §7: "Template-invalid: references a group that doesn't
/// exist. Runtime variants return input unchanged; precompiled-template
/// construction returns an error before any matching." This type is that
/// construction-time error; it names the offending segment and group so a
/// caller can produce a useful diagnostic (this resolves Open Question (a)
/// in `spec.md` §9: always return-input-unchanged at runtime, never panic).
#[derive(Clone, Debug)]
pub struct TemplateError {
    pub(crate) segment_index: usize,
    pub(crate) reference: TemplateErrorRef,
}

#[derive(Clone, Debug)]
pub(crate) enum TemplateErrorRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            TemplateErrorRef::Index(n) => write!(
                f,
                "template segment {} references nonexistent group {}",
                self.segment_index, n
            ),
            TemplateErrorRef::Name(name) => write!(
                f,
                "template segment {} references nonexistent group named `{}`",
                self.segment_index, name
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

/// The streaming reader was configured with an impossible buffer size.
///
/// Per `spec.md` §7: "Streaming-config: buffer smaller than `2*max_len` ->
/// config error before reading."
#[derive(Clone, Copy, Debug)]
pub struct StreamConfigError {
    pub(crate) buffer_size: usize,
    pub(crate) minimum: usize,
}

impl fmt::Display for StreamConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer_size ({}) is smaller than the required minimum ({}, i.e. 2*max_len)",
            self.buffer_size, self.minimum
        )
    }
}

impl std::error::Error for StreamConfigError {}

/// The top-level failure of [`crate::generator::generate`] (`spec.md` §7:
/// "Pattern-invalid" and "Engine-infeasible" are the two error classes that
/// can abort code generation outright; everything else either resolves
/// silently via fallback or is a construction-time-only error surfaced by a
/// narrower API like [`TemplateError`]).
#[derive(Debug)]
pub enum GenerateError {
    Pattern(PatternError),
    EngineInfeasible(BuildError),
    /// Writing the generated source to the caller's chosen output path
    /// failed (`spec.md` §6's exit-code contract: "non-zero ... for I/O
    /// failure"). Generation itself already succeeded by the time this can
    /// occur.
    Io(std::io::Error),
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::Pattern(e) => write!(f, "{e}"),
            GenerateError::EngineInfeasible(e) => write!(f, "{e}"),
            GenerateError::Io(e) => write!(f, "failed to write output: {e}"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerateError::Pattern(e) => Some(e),
            GenerateError::EngineInfeasible(e) => Some(e),
            GenerateError::Io(e) => Some(e),
        }
    }
}

impl From<PatternError> for GenerateError {
    fn from(e: PatternError) -> GenerateError {
        GenerateError::Pattern(e)
    }
}

impl From<BuildError> for GenerateError {
    fn from(e: BuildError) -> GenerateError {
        GenerateError::EngineInfeasible(e)
    }
}
