//! chansweep CLI library.
//!
//! Argument parsing, command execution, output formatting, and the
//! file-backed snapshot store the binary runs the engine against.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod snapshot;

pub use cli::{Cli, CliFormat, Command};
pub use error::{CliError, Result};
pub use output::Formatter;
pub use snapshot::SnapshotStore;
