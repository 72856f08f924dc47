//! Thin binary wrapper around [`regexgen::cli`]; see `spec.md` §6 for the
//! exit-code contract this mirrors.

use std::process::ExitCode;

use clap::Parser;
use regexgen::cli::Args;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match regexgen::cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("regexgen: {e}");
            ExitCode::FAILURE
        }
    }
}
