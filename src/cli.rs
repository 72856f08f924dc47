/*!
Shared CLI surface (`spec.md` §6, "CLI surface"): one `clap`-derived
argument struct, used by both `regexgen-cli`'s binary and anything else that
wants the same flags (the teacher's own `regex-cli` crate, referenced in
`other_examples/`, splits its subcommands the same way — a `clap::Parser`
struct living in the library so the binary crate stays a thin `main`).
*/

use clap::Parser;

use crate::error::GenerateError;
use crate::generator::{self, GeneratorConfig};
use crate::select::{Force, DEFAULT_TDFA_STATE_CAP};

/// `regexgen --pattern <PATTERN> --name <NAME> [options]` (`spec.md` §6).
#[derive(Parser, Clone, Debug)]
#[command(name = "regexgen", about = "Compile a regular expression into standalone matcher source code")]
pub struct Args {
    /// The pattern to compile.
    #[arg(long = "pattern")]
    pub pattern: String,

    /// Base name used to derive every generated identifier (`is_match_name`,
    /// `find_name`, `NameMatch`, `NameFindReader`, ...).
    #[arg(long = "name")]
    pub name: String,

    /// Where to write the generated source. Prints to stdout when omitted.
    #[arg(long = "output")]
    pub output: Option<std::path::PathBuf>,

    /// Reserved for a future `#![...]` crate-level package annotation; not
    /// currently read by [`generator::generate`] (`spec.md` has no module
    /// whose output depends on it, so this is accepted and ignored rather
    /// than rejected, matching how the teacher's own CLI tools keep
    /// forward-compatible flags around unused).
    #[arg(long = "package")]
    pub package: Option<String>,

    /// Skip emitting the streaming reader wrappers.
    #[arg(long = "no-streaming")]
    pub no_streaming: bool,

    #[arg(long = "force-thompson", conflicts_with = "force_tdfa")]
    pub force_thompson: bool,

    #[arg(long = "force-tdfa", conflicts_with = "force_thompson")]
    pub force_tdfa: bool,

    /// The TDFA state cap (`spec.md` §4.4).
    #[arg(long = "tdfa-threshold", default_value_t = DEFAULT_TDFA_STATE_CAP)]
    pub tdfa_threshold: usize,

    /// Log each engine-selection decision to stderr via `log`/`env_logger`.
    #[arg(long = "verbose")]
    pub verbose: bool,
}

impl Args {
    pub fn to_generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            name: self.name.clone(),
            force: Force { thompson: self.force_thompson, tdfa: self.force_tdfa },
            tdfa_state_cap: self.tdfa_threshold,
            streaming: !self.no_streaming,
            verbose: self.verbose,
        }
    }
}

/// Runs one generation per [`Args`] and returns the formatted source,
/// writing it to `-output` if given. Shared by the binary's `main` and by
/// library consumers who want the CLI's exact behavior without a process.
pub fn run(args: &Args) -> Result<(), GenerateError> {
    let config = args.to_generator_config();
    let source = generator::generate(&args.pattern, &config)?;
    match &args.output {
        Some(path) => std::fs::write(path, source).map_err(GenerateError::Io)?,
        None => print!("{source}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_the_minimal_invocation() {
        let args = Args::parse_from(["regexgen", "--pattern", "(?P<y>\\d{4})", "--name", "Year"]);
        assert_eq!(args.pattern, r"(?P<y>\d{4})");
        assert_eq!(args.name, "Year");
        assert_eq!(args.tdfa_threshold, DEFAULT_TDFA_STATE_CAP);
        assert!(!args.verbose);
    }

    #[test]
    fn force_flags_are_mutually_exclusive() {
        let result =
            Args::try_parse_from(["regexgen", "--pattern", "a", "--name", "A", "--force-thompson", "--force-tdfa"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_carries_force_flags_through() {
        let args = Args::parse_from(["regexgen", "--pattern", "a", "--name", "A", "--force-tdfa"]);
        let config = args.to_generator_config();
        assert!(config.force.tdfa);
        assert!(!config.force.thompson);
    }
}
