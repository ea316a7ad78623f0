//! Command implementations for the citekey CLI
//!
//! Each command module handles the CLI interface and delegates to
//! citekey-core for the actual work.

pub mod catalog;
pub mod check;
pub mod generate;
