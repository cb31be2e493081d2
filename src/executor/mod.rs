//! Command execution module
//!
//! Provides async command execution with:
//! - Captured or line-streamed output
//! - Optional timeout
//! - Output truncation
//! - Environment variable injection
//! - Working directory control

pub mod runner;

pub use runner::*;
