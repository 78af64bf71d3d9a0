//! Configuration sources, lowest precedence first: global file, environment.

pub mod environment;
pub mod global_file;
