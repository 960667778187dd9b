// file: src/logging/mod.rs
// version: 1.0.0
// guid: 6a2f8c40-91b3-4d7e-a5c6-0e9d4b72f1a3

//! Logging initialization

pub mod logger;

pub use logger::init_logger;
