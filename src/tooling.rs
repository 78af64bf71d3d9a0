//! Tooling
//!
//! Command-line front end over a [`crate::session::CaseSession`].

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, StatusCommands};
