// file: src/cli/mod.rs
// version: 1.0.0
// guid: 52e9a7d1-04c8-4f3b-86ad-e72c5b09f314

//! Command line interface for the security operations agent

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
