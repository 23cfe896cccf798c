//! Command-line surface for the vlpc driver.
//!
//! A couple of tokens from the reference driver don't map cleanly onto
//! clap's flag grammar — a bare `run` token with no leading dash, and the
//! two-letter short flag `-ll` — so [`normalize_args`] rewrites them to
//! their long-form equivalents before clap ever sees them.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "vlpc", about = "Compiler driver for the VLP language")]
pub struct Cli {
    /// Source file to compile.
    #[arg(default_value = "main.vlp")]
    pub input: PathBuf,

    /// Output executable path.
    #[arg(short = 'o', long = "output", default_value = "a.out")]
    pub output: PathBuf,

    /// Print the generated LLVM IR to stdout after emission.
    #[arg(long = "show-llvm")]
    pub show_llvm: bool,

    /// Execute the resulting binary after linking.
    #[arg(short = 'r', long = "run")]
    pub run: bool,

    /// Remove `<stem>.ll`, the output binary, and `a.out`, then exit.
    #[arg(short = 'c', long = "clean")]
    pub clean: bool,
}

/// Rewrites legacy tokens (`-ll`, bare `run`) to their clap-recognized
/// long form. Everything else passes through untouched.
pub fn normalize_args(args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    args.map(|arg| match arg.to_str() {
        Some("-ll") => OsString::from("--show-llvm"),
        Some("run") => OsString::from("--run"),
        _ => arg,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_tokens() {
        let args = normalize_args(
            vec![OsString::from("main.vlp"), OsString::from("-ll"), OsString::from("run")].into_iter(),
        );
        assert_eq!(
            args,
            vec![OsString::from("main.vlp"), OsString::from("--show-llvm"), OsString::from("--run")]
        );
    }

    #[test]
    fn parses_defaults() {
        let cli = Cli::parse_from(["vlpc"]);
        assert_eq!(cli.input, PathBuf::from("main.vlp"));
        assert_eq!(cli.output, PathBuf::from("a.out"));
        assert!(!cli.show_llvm);
        assert!(!cli.run);
        assert!(!cli.clean);
    }

    #[test]
    fn parses_output_flag_and_positional() {
        let cli = Cli::parse_from(["vlpc", "prog.vlp", "-o", "prog"]);
        assert_eq!(cli.input, PathBuf::from("prog.vlp"));
        assert_eq!(cli.output, PathBuf::from("prog"));
    }

    #[test]
    fn parses_short_flags() {
        let cli = Cli::parse_from(["vlpc", "-r", "-c"]);
        assert!(cli.run);
        assert!(cli.clean);
    }
}
