//! The VLP parser: a recursive-descent parser over [`vlpc_lex`]'s token
//! stream producing the [`ast`] defined in this crate.
//!
//! Parsing never aborts outright. A malformed declaration is recorded as
//! a diagnostic on the caller's [`vlpc_util::ErrorCollector`] and skipped
//! via panic-mode recovery, so one bad statement doesn't prevent the rest
//! of the file from being checked.

pub mod ast;
pub mod parser;

pub use ast::{Block, Expr, Parameter, Stmt};
pub use parser::{ParseError, Parser};

use vlpc_util::ErrorCollector;

/// Lex and parse a full source file, collecting diagnostics along the way.
pub fn parse(source: &str, filename: &str, errors: &mut ErrorCollector) -> Vec<Stmt> {
    let tokens = vlpc_lex::lex(source);
    let mut parser = Parser::new(tokens, filename, errors);
    parser.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_program() {
        let source = "fx main() { var x = 1; print(x); }";
        let mut errors = ErrorCollector::new(source, "main.vlp");
        let program = parse(source, "main.vlp", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(program.len(), 1);
    }
}
