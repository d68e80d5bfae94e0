//! Presentation layer for quorum-bench
//!
//! This crate contains CLI definitions, report formatters
//! and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{
    BaselineCommand, BaselineCreateArgs, Cli, Command, CompareArgs, OutputFormat, RunArgs,
    SummaryArgs, ValidateKeyArgs,
};
pub use output::console::ConsoleFormatter;
pub use output::formatter::{JsonFormatter, OutputFormatter, formatter_for};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
