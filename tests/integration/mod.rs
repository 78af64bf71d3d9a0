//! Integration tests for casebook

mod cli_commands;
mod local_provider;
mod scan_and_aggregate;
mod session_reload;
mod store_persistence;
