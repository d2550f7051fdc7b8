//! Presentation layer for expert-council
//!
//! This crate contains CLI definitions, output formatters and progress
//! reporters for consultations.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat, resolve_context};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
