//! The vlpc driver: reads a `.vlp` source file, runs it through the lexer,
//! parser, and code generator, writes the resulting LLVM IR, and invokes
//! an external toolchain to produce an executable.
//!
//! ```text
//! source text ──► Lexer ──► token stream ──► Parser ──► AST ──► CodeGen ──► IR text
//! ```
//!
//! Everything past IR emission — invoking `clang` (falling back to
//! `llc`+`gcc`), linking, running, and cleaning up artifacts — is thin
//! glue around external tools and carries no compiler semantics of its
//! own.

pub mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, warn};

use cli::Cli;
use vlpc_gen::CodeGenerator;
use vlpc_util::ErrorCollector;

/// Runs the full compile pipeline for one invocation and returns the
/// process exit code. An `Err` means the driver couldn't even get
/// started (e.g. the source file doesn't exist); compile-time problems
/// in the source itself are reported to stderr and surfaced as exit
/// code 1, not as an `Err`.
pub fn run(cli: &Cli) -> Result<i32> {
    if cli.clean {
        clean_artifacts(&cli.input, &cli.output);
        return Ok(0);
    }

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("could not open {}", cli.input.display()))?;

    let filename = cli.input.to_string_lossy().into_owned();
    let mut errors = ErrorCollector::new(&source, filename.clone());
    let program = vlpc_par::parse(&source, &filename, &mut errors);
    if errors.has_errors() {
        errors.print_errors();
        return Ok(1);
    }

    let mut generator = CodeGenerator::new();
    let ir = generator.generate(&program);

    let stem = stem_of(&cli.input);
    let ll_path = format!("{stem}.ll");
    fs::write(&ll_path, &ir).with_context(|| format!("could not write {ll_path}"))?;
    info!(input = %cli.input.display(), ir_path = %ll_path, "emitted LLVM IR");

    if cli.show_llvm {
        println!("{ir}");
    }

    if !link(&ll_path, &stem, &cli.output) {
        eprintln!("Compilation failed (clang/llc/gcc not available?).");
        return Ok(1);
    }
    println!("Executable created: {}", cli.output.display());

    if cli.run {
        let exe = format!("./{}", cli.output.display());
        let _ = Command::new(&exe).status();
    }

    Ok(0)
}

fn stem_of(input: &Path) -> String {
    let s = input.to_string_lossy();
    match s.rfind('.') {
        Some(idx) => s[..idx].to_string(),
        None => s.into_owned(),
    }
}

fn clean_artifacts(input: &Path, output: &Path) {
    let stem = stem_of(input);
    let _ = fs::remove_file(format!("{stem}.ll"));
    let _ = fs::remove_file(output);
    let _ = fs::remove_file("a.out");
}

/// `clang` first; if that fails, `llc` to an object file followed by
/// `gcc`. Returns whether a usable executable was produced.
fn link(ll_path: &str, stem: &str, output: &Path) -> bool {
    let output_str = output.to_string_lossy().into_owned();

    let clang = Command::new("clang").args(["-o", &output_str, ll_path, "-lm"]).status();
    if matches!(clang, Ok(status) if status.success()) {
        return true;
    }
    warn!("clang unavailable or failed, falling back to llc + gcc");

    let obj_path = format!("{stem}.o");
    let llc = Command::new("llc").args(["-filetype=obj", ll_path, "-o", &obj_path]).status();
    if !matches!(llc, Ok(status) if status.success()) {
        return false;
    }

    let gcc = Command::new("gcc").args(["-o", &output_str, &obj_path, "-lm"]).status();
    matches!(gcc, Ok(status) if status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_of_strips_extension() {
        assert_eq!(stem_of(Path::new("main.vlp")), "main");
        assert_eq!(stem_of(Path::new("dir/prog.vlp")), "dir/prog");
        assert_eq!(stem_of(Path::new("noext")), "noext");
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let cli = Cli {
            input: PathBuf::from("/nonexistent/path/does-not-exist.vlp"),
            output: PathBuf::from("a.out"),
            show_llvm: false,
            run: false,
            clean: false,
        };
        assert!(run(&cli).is_err());
    }

    #[test]
    fn parse_errors_exit_with_code_one_without_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("broken.vlp");
        fs::write(&source_path, "fx broken(").unwrap();

        let cli = Cli {
            input: source_path,
            output: dir.path().join("a.out"),
            show_llvm: false,
            run: false,
            clean: false,
        };
        assert_eq!(run(&cli).unwrap(), 1);
    }
}
