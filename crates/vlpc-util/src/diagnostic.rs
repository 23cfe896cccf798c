//! Diagnostic collection and reporting.
//!
//! Mirrors the reference compiler's error handler: diagnostics are
//! collected as they're found rather than raised immediately, so a single
//! pass can report many problems before compilation gives up.

use crate::location::SourceLocation;
use std::fmt;

/// How serious a diagnostic is.
///
/// `Warning` never stops compilation. `Error` stops compilation of the
/// current module but is still recorded and printed. `Fatal` is reserved
/// for conditions a caller wants to distinguish from ordinary errors (none
/// of the current passes raise it, but the level exists so callers can).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal Error",
        };
        write!(f, "{s}")
    }
}

/// A single compiler diagnostic, with the source line it applies to
/// captured at the time it was recorded (so the collector doesn't need to
/// keep the whole source text around just to print one caret).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
    pub context: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        location: SourceLocation,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            location,
            message: message.into(),
            context: context.into(),
        }
    }
}

/// Collects diagnostics for one compilation unit (the main source file, or
/// one imported module) and knows how to print them in the reference
/// compiler's exact format.
pub struct ErrorCollector {
    filename: String,
    source_lines: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorCollector {
    pub fn new(source: &str, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source_lines: source.lines().map(str::to_owned).collect(),
            diagnostics: Vec::new(),
        }
    }

    /// The source line a 1-based line number refers to, or an empty string
    /// if it falls outside the known source (e.g. a synthesized location).
    pub fn source_line(&self, line: u32) -> &str {
        if line == 0 {
            return "";
        }
        self.source_lines
            .get((line - 1) as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    fn add(&mut self, severity: Severity, location: SourceLocation, message: impl Into<String>) {
        let context = self.source_line(location.line).to_owned();
        self.diagnostics
            .push(Diagnostic::new(severity, location, message, context));
    }

    pub fn error(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.add(Severity::Error, location, message);
    }

    pub fn warning(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.add(Severity::Warning, location, message);
    }

    pub fn fatal(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.add(Severity::Fatal, location, message);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::Fatal))
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::Fatal))
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error | Severity::Fatal))
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print every collected diagnostic to stderr, one block per
    /// diagnostic: a header line, the offending source line, and a caret
    /// under the reported column.
    pub fn print_errors(&self) {
        for diag in &self.diagnostics {
            self.print_one(diag);
        }
    }

    fn print_one(&self, diag: &Diagnostic) {
        eprint!("{}", diag.severity);
        if !self.filename.is_empty() {
            eprint!(" in {}", self.filename);
        }
        eprintln!(
            " at line {}, column {}: {}",
            diag.location.line, diag.location.column, diag.message
        );

        if !diag.context.is_empty() {
            eprintln!("  {}", diag.context);
            let padding = " ".repeat(diag.location.column.saturating_sub(1) as usize);
            eprintln!("  {padding}^");
        }
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_line_is_one_based() {
        let collector = ErrorCollector::new("a\nb\nc\n", "main.vlp");
        assert_eq!(collector.source_line(1), "a");
        assert_eq!(collector.source_line(3), "c");
        assert_eq!(collector.source_line(0), "");
        assert_eq!(collector.source_line(99), "");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut collector = ErrorCollector::new("x\n", "main.vlp");
        collector.warning(SourceLocation::new(1, 1, "main.vlp"), "unused");
        assert!(!collector.has_errors());
        collector.error(SourceLocation::new(1, 1, "main.vlp"), "bad token");
        assert!(collector.has_errors());
        assert_eq!(collector.error_count(), 1);
    }

    #[test]
    fn fatal_counts_as_error() {
        let mut collector = ErrorCollector::new("x\n", "main.vlp");
        collector.fatal(SourceLocation::new(1, 1, "main.vlp"), "cannot continue");
        assert!(collector.has_errors());
        assert!(collector.has_fatal());
    }

    #[test]
    fn context_is_captured_at_record_time() {
        let mut collector = ErrorCollector::new("let x = 1;\n", "main.vlp");
        collector.error(SourceLocation::new(1, 5, "main.vlp"), "unexpected token");
        assert_eq!(collector.diagnostics()[0].context, "let x = 1;");
    }
}
