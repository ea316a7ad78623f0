/*
 * check.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Check command implementation
 */

//! Check command implementation.
//!
//! Compiles a pattern and, on failure, prints the annotated error and exits
//! with a non-zero status.

use std::path::Path;

use anyhow::Result;
use citekey_core::{CompileError, FormatterConfig, compile};

use crate::settings::SettingsFile;

/// Execute the check command
pub fn execute(pattern: &str, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => SettingsFile::read(path)?.formatter,
        None => FormatterConfig::default(),
    };

    match check(pattern, &config) {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.render(pattern));
            anyhow::bail!("pattern does not compile (offset {})", err.offset())
        }
    }
}

fn check(pattern: &str, config: &FormatterConfig) -> Result<(), CompileError> {
    compile(pattern, config).map(|_| ())
}
