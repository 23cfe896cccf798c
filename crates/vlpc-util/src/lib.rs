//! Shared foundation types for the vlpc compiler: source locations and
//! diagnostic collection. Every other crate in the workspace depends on
//! this one and nothing else depends on them.

pub mod diagnostic;
pub mod location;

pub use diagnostic::{Diagnostic, ErrorCollector, Severity};
pub use location::SourceLocation;
