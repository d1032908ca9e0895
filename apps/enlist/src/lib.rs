//! # Enlist Library
//!
//! This library exposes the enlist command and configuration modules for
//! testing and integration.
//!
//! The binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;

// Re-export enlist_core for convenience
pub use enlist_core;
