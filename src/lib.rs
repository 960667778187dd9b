// file: src/lib.rs
// version: 1.0.0
// guid: b1e54d9c-22a7-4f0d-8e63-740ab9c1d5e8

//! # SecOps Agent
//!
//! A conversational security assistant that routes natural-language requests
//! ("scan this host", "assess this web app") to a bounded set of external
//! security tools. Every request passes a multi-layer authorization gate
//! before any process is spawned, and every decision and execution attempt
//! lands in an append-only audit log.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod nlu;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod runner;

pub use error::{AgentError, Result};

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
