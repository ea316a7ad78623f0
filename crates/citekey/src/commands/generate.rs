/*
 * generate.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Generate command implementation
 */

//! Generate command implementation.
//!
//! Reads a JSON array of records, loads the configured pattern through the
//! self-healing loader and prints one `id<TAB>key` line per record.
//! Attachments and notes are skipped.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use citekey_core::{FormatterConfig, Item, KeyGenerator, MemoryStore};
use tracing::{debug, info, warn};

use crate::settings::SettingsFile;

/// Arguments for the generate command
#[derive(Debug)]
pub struct GenerateArgs {
    /// Records file; stdin when `None`
    pub records: Option<PathBuf>,
    /// Settings file
    pub config: Option<PathBuf>,
    /// Pattern overriding the configured one
    pub pattern: Option<String>,
    /// Persist a healed pattern into the settings file
    pub write_back: bool,
}

/// Execute the generate command
pub fn execute(args: GenerateArgs) -> Result<()> {
    let input = read_input(args.records.as_deref())?;
    let records = parse_records(&input)?;

    let mut settings = args
        .config
        .as_deref()
        .map(SettingsFile::read)
        .transpose()?;
    let config = settings
        .as_ref()
        .map(|s| s.formatter.clone())
        .unwrap_or_default();

    let keys = match (&args.pattern, settings.as_mut()) {
        (Some(pattern), _) => load_override(config, pattern),
        (None, Some(settings)) => {
            let keys = KeyGenerator::load(config, settings);
            if settings.is_dirty() {
                if args.write_back {
                    settings.save()?;
                    info!(path = %settings.path().display(), "wrote healed pattern");
                } else {
                    warn!("pattern was healed in memory only; pass --write-back to save it");
                }
            }
            keys
        }
        (None, None) => {
            let mut store = MemoryStore::new();
            KeyGenerator::load(config, &mut store)
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_keys(&mut out, &keys, &records)?;
    Ok(())
}

fn load_override(config: FormatterConfig, pattern: &str) -> KeyGenerator {
    let mut store = MemoryStore::with_pattern(pattern);
    let keys = KeyGenerator::load(config, &mut store);
    for notice in store.notices() {
        warn!("{notice}");
    }
    keys
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records from {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read records from stdin")?;
            Ok(input)
        }
    }
}

pub fn parse_records(input: &str) -> Result<Vec<Item>> {
    serde_json::from_str(input).context("Records must be a JSON array of items")
}

pub fn write_keys(out: &mut dyn Write, keys: &KeyGenerator, records: &[Item]) -> Result<()> {
    for record in records {
        let Some(key) = keys.key_for(record) else {
            debug!(id = %record.id, "skipping record without a key");
            continue;
        };
        writeln!(out, "{}\t{}", record.id, key)?;
    }
    Ok(())
}
