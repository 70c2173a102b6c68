//! # LookMax Library
//!
//! This library exposes the LookMax server and CLI modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;

// Re-export lookmax_core for convenience
pub use lookmax_core;
