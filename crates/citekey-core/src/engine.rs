/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The long-lived key generator.
//!
//! [`KeyGenerator`] owns the active formatter: a compiled [`Generator`]
//! together with the pattern it came from and the configuration it was
//! compiled with. Replacing the formatter publishes a fully built value with
//! a single pointer swap, so a generation that already loaded the previous
//! snapshot finishes against it.

use crate::compiler::{Compiler, Generator};
use crate::config::FormatterConfig;
use crate::context::RecordContext;
use crate::error::CompileResult;
use crate::loader::{self, PatternStore};
use crate::record::BibliographicRecord;
use crate::sanitize::sanitize;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Record types that are never cited.
pub const KEYLESS_ITEM_TYPES: &[&str] = &["attachment", "note"];

/// A compiled pattern and the settings it was compiled against.
#[derive(Debug)]
pub struct ActiveFormatter {
    pub pattern: String,
    pub generator: Generator,
    pub config: FormatterConfig,
}

#[derive(Debug)]
pub struct KeyGenerator {
    active: ArcSwap<ActiveFormatter>,
}

impl KeyGenerator {
    /// Load the stored pattern through the self-healing loader.
    pub fn load(config: FormatterConfig, store: &mut dyn PatternStore) -> Self {
        let formatter = build(config, store);
        KeyGenerator {
            active: ArcSwap::from_pointee(formatter),
        }
    }

    /// Re-run the loader after a configuration change.
    pub fn reload(&self, config: FormatterConfig, store: &mut dyn PatternStore) {
        let formatter = build(config, store);
        debug!(pattern = %formatter.pattern, "reloaded formatter");
        self.active.store(Arc::new(formatter));
    }

    /// Compile and activate a user-edited pattern.
    ///
    /// On error the active formatter and the store are left untouched.
    pub fn set_pattern(&self, pattern: &str, store: &mut dyn PatternStore) -> CompileResult<()> {
        let current = self.active.load_full();
        let generator = Compiler::new(&current.config).compile(pattern)?;
        store.set_pattern(pattern);
        self.active.store(Arc::new(ActiveFormatter {
            pattern: pattern.to_string(),
            generator,
            config: current.config.clone(),
        }));
        debug!(pattern, "activated pattern");
        Ok(())
    }

    /// The pattern the active formatter was compiled from.
    pub fn pattern(&self) -> String {
        self.active.load().pattern.clone()
    }

    /// Snapshot of the active formatter.
    pub fn active(&self) -> Arc<ActiveFormatter> {
        self.active.load_full()
    }

    /// The key for `record`, or `None` for record types that never carry a
    /// citation key.
    pub fn key_for(&self, record: &dyn BibliographicRecord) -> Option<String> {
        if KEYLESS_ITEM_TYPES.contains(&record.item_type()) {
            trace!(id = record.id(), item_type = record.item_type(), "record takes no key");
            return None;
        }
        Some(self.generate(record))
    }

    /// Compute the sanitized key for one record.
    pub fn generate(&self, record: &dyn BibliographicRecord) -> String {
        let formatter = self.active.load();
        let ctx = RecordContext::new(record);
        let raw = formatter.generator.generate(&ctx);
        let key = sanitize(
            &raw,
            record.id(),
            formatter.config.citekey_fold,
            ctx.language(),
        );
        trace!(id = record.id(), raw = %raw, key = %key, "generated key");
        key
    }
}

fn build(config: FormatterConfig, store: &mut dyn PatternStore) -> ActiveFormatter {
    let loaded = loader::load(&config, store);
    ActiveFormatter {
        pattern: loaded.pattern,
        generator: loaded.generator,
        config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryStore;
    use crate::record::Item;
    use pretty_assertions::assert_eq;

    fn turing() -> Item {
        Item::new("1", "journalArticle")
            .with_field("title", "Computing Machinery and Intelligence")
            .with_field("date", "1950-10")
            .with_creator("author", "Turing", "Alan")
    }

    #[test]
    fn test_generate_with_stored_pattern() {
        let mut store = MemoryStore::with_pattern("[auth][year]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        assert_eq!(keys.generate(&turing()), "Turing1950");
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_set_pattern_persists_and_activates() {
        let mut store = MemoryStore::with_pattern("[auth][year]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        keys.set_pattern("[year]-[auth:lower]", &mut store).unwrap();
        assert_eq!(keys.pattern(), "[year]-[auth:lower]");
        assert_eq!(store.pattern().as_deref(), Some("[year]-[auth:lower]"));
        assert_eq!(keys.generate(&turing()), "1950-turing");
    }

    #[test]
    fn test_rejected_pattern_keeps_active_formatter() {
        let mut store = MemoryStore::with_pattern("[auth][year]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        let err = keys.set_pattern("[auth:nosuchfilter]", &mut store).unwrap_err();
        assert!(err.to_string().contains("nosuchfilter"));
        assert_eq!(keys.pattern(), "[auth][year]");
        assert_eq!(store.pattern().as_deref(), Some("[auth][year]"));
        assert_eq!(keys.generate(&turing()), "Turing1950");
    }

    #[test]
    fn test_attachments_and_notes_take_no_key() {
        let mut store = MemoryStore::with_pattern("[auth][year]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        assert_eq!(keys.key_for(&turing()).as_deref(), Some("Turing1950"));
        assert_eq!(keys.key_for(&Item::new("2", "attachment")), None);
        assert_eq!(keys.key_for(&Item::new("3", "note")), None);
        assert_eq!(keys.generate(&Item::new("3", "note")), "record-3");
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let mut store = MemoryStore::with_pattern("[auth]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        let before = keys.active();
        keys.set_pattern("[year]", &mut store).unwrap();
        assert_eq!(before.pattern, "[auth]");
        assert_eq!(keys.pattern(), "[year]");
    }

    #[test]
    fn test_reload_applies_new_config() {
        let mut store = MemoryStore::with_pattern("[auth]");
        let keys = KeyGenerator::load(FormatterConfig::default(), &mut store);
        let mueller = Item::new("2", "book")
            .with_field("language", "de")
            .with_creator("author", "Müller", "Hans");
        assert_eq!(keys.generate(&mueller), "Müller");

        let config = FormatterConfig {
            citekey_fold: true,
            ..FormatterConfig::default()
        };
        keys.reload(config, &mut store);
        assert_eq!(keys.generate(&mueller), "Mueller");
    }
}
