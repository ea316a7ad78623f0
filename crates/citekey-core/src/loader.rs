/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Self-healing pattern loading.
//!
//! Stored patterns may have been written by older versions and no longer
//! compile. The loader salvages what it can, falls back to the default
//! pattern when nothing useful is left, and writes the healed pattern back
//! through a [`PatternStore`].

use crate::compiler::{Compiler, Generator};
use crate::config::{BUILTIN_PATTERN, FIRST_RUN_MARKER, FormatterConfig};
use std::fmt;
use tracing::{debug, error, warn};

/// Configuration storage for the pattern.
///
/// Implementations are responsible for persisting the pattern and for
/// surfacing healing notices to the user.
pub trait PatternStore {
    /// The stored pattern, or `None` if nothing has been stored yet.
    fn pattern(&self) -> Option<String>;

    /// Persist a corrected or reset pattern.
    fn set_pattern(&mut self, pattern: &str);

    /// Surface a notice about automatic repairs.
    fn notify(&mut self, notice: &HealingNotice);
}

/// What the loader changed while healing a stored pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealingNotice {
    /// Malformed chunks were removed and the rest kept.
    Salvaged { dropped: Vec<String> },
    /// The stored pattern was replaced by the default.
    Reset,
}

impl fmt::Display for HealingNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealingNotice::Salvaged { dropped } => {
                write!(f, "removed malformed patterns:\n{}", dropped.join("\n"))
            }
            HealingNotice::Reset => write!(f, "resetting to default"),
        }
    }
}

/// Store that keeps the pattern in memory and records every notice.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pattern: Option<String>,
    notices: Vec<HealingNotice>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `pattern`.
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn notices(&self) -> &[HealingNotice] {
        &self.notices
    }

    /// Number of times a pattern was persisted.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PatternStore for MemoryStore {
    fn pattern(&self) -> Option<String> {
        self.pattern.clone()
    }

    fn set_pattern(&mut self, pattern: &str) {
        self.pattern = Some(pattern.to_string());
        self.writes += 1;
    }

    fn notify(&mut self, notice: &HealingNotice) {
        self.notices.push(notice.clone());
    }
}

/// Loader state machine.
#[derive(Debug)]
pub enum LoaderState {
    UseStored,
    StripAndRetry,
    ResetToDefault,
    Ready { generator: Generator, pattern: String },
}

/// The outcome of loading: a generator and the pattern it came from.
#[derive(Debug, Clone)]
pub struct LoadedPattern {
    pub generator: Generator,
    pub pattern: String,
}

/// Upper bound on state transitions; every path reaches `Ready` well within
/// it.
const MAX_STEPS: usize = 8;

fn strip_marker(pattern: &str) -> (&str, bool) {
    match pattern.strip_prefix(FIRST_RUN_MARKER) {
        Some(rest) => (rest, true),
        None => (pattern, false),
    }
}

/// Split a pattern into top-level chunks: one bracket group (from `[` up to
/// and including the next unescaped `]`, or the end of input) or one run of
/// literal text.
pub fn split_chunks(pattern: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_group = false;
    let mut escaped = false;

    for (i, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_group => {
                if i > start {
                    chunks.push(&pattern[start..i]);
                }
                start = i;
                in_group = true;
            }
            ']' if in_group => {
                chunks.push(&pattern[start..i + 1]);
                start = i + 1;
                in_group = false;
            }
            _ => {}
        }
    }
    if start < pattern.len() {
        chunks.push(&pattern[start..]);
    }
    chunks
}

/// Runs the healing state machine against one store.
pub struct Loader<'a> {
    compiler: Compiler<'a>,
    config: &'a FormatterConfig,
    store: &'a mut dyn PatternStore,
    salvaged: bool,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a FormatterConfig, store: &'a mut dyn PatternStore) -> Self {
        Self {
            compiler: Compiler::new(config),
            config,
            store,
            salvaged: false,
        }
    }

    /// Run until a generator is ready.
    pub fn run(mut self) -> LoadedPattern {
        let mut state = LoaderState::UseStored;
        for _ in 0..MAX_STEPS {
            debug!(state = ?StateName::of(&state), "loader step");
            state = match state {
                LoaderState::Ready { generator, pattern } => {
                    return LoadedPattern { generator, pattern };
                }
                other => self.step(other),
            };
        }
        match state {
            LoaderState::Ready { generator, pattern } => LoadedPattern { generator, pattern },
            _ => {
                error!("pattern loader did not settle, using an empty pattern");
                LoadedPattern {
                    generator: Generator::default(),
                    pattern: String::new(),
                }
            }
        }
    }

    /// Perform one state transition.
    pub fn step(&mut self, state: LoaderState) -> LoaderState {
        match state {
            LoaderState::UseStored => self.use_stored(),
            LoaderState::StripAndRetry => self.strip_and_retry(),
            LoaderState::ResetToDefault => self.reset_to_default(),
            ready @ LoaderState::Ready { .. } => ready,
        }
    }

    fn stored_pattern(&mut self) -> String {
        let stored = self.store.pattern().unwrap_or_default();
        let (pattern, had_marker) = strip_marker(&stored);
        let pattern = pattern.to_string();
        if had_marker {
            self.store.set_pattern(&pattern);
        }
        if pattern.trim().is_empty() {
            let default = strip_marker(&self.config.default_pattern).0.to_string();
            self.store.set_pattern(&default);
            return default;
        }
        pattern
    }

    fn use_stored(&mut self) -> LoaderState {
        let pattern = self.stored_pattern();
        match self.compiler.compile(&pattern) {
            Ok(generator) => LoaderState::Ready { generator, pattern },
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "stored pattern does not compile");
                if self.salvaged {
                    LoaderState::ResetToDefault
                } else {
                    LoaderState::StripAndRetry
                }
            }
        }
    }

    fn strip_and_retry(&mut self) -> LoaderState {
        let stored = self.stored_pattern();
        let mut candidate = String::new();
        let mut dropped = Vec::new();
        for chunk in split_chunks(&stored) {
            let attempt = format!("{candidate}{chunk}");
            if self.compiler.compile(&attempt).is_ok() {
                candidate = attempt;
            } else {
                dropped.push(chunk.to_string());
            }
        }

        // Trimming can leave a dangling escape behind, e.g. `[auth]\ `.
        let trimmed = candidate.trim();
        let candidate = if self.compiler.compile(trimmed).is_ok() {
            trimmed
        } else {
            candidate.as_str()
        };
        if !candidate.contains('[') {
            return LoaderState::ResetToDefault;
        }

        warn!(pattern = candidate, dropped = dropped.len(), "salvaged stored pattern");
        self.store.set_pattern(candidate);
        if !dropped.is_empty() {
            self.store.notify(&HealingNotice::Salvaged { dropped });
        }
        self.salvaged = true;
        LoaderState::UseStored
    }

    fn reset_to_default(&mut self) -> LoaderState {
        self.store.notify(&HealingNotice::Reset);
        let default = strip_marker(&self.config.default_pattern).0.to_string();
        warn!(pattern = %default, "resetting pattern to default");

        let (pattern, generator) = match self.compiler.compile(&default) {
            Ok(generator) => (default, generator),
            Err(err) => {
                error!(pattern = %default, error = %err, "default pattern does not compile");
                match self.compiler.compile(BUILTIN_PATTERN) {
                    Ok(generator) => (BUILTIN_PATTERN.to_string(), generator),
                    Err(_) => (String::new(), Generator::default()),
                }
            }
        };
        self.store.set_pattern(&pattern);
        LoaderState::Ready { generator, pattern }
    }
}

/// State name for tracing, without the generator payload.
#[derive(Debug)]
enum StateName {
    UseStored,
    StripAndRetry,
    ResetToDefault,
    Ready,
}

impl StateName {
    fn of(state: &LoaderState) -> Self {
        match state {
            LoaderState::UseStored => StateName::UseStored,
            LoaderState::StripAndRetry => StateName::StripAndRetry,
            LoaderState::ResetToDefault => StateName::ResetToDefault,
            LoaderState::Ready { .. } => StateName::Ready,
        }
    }
}

/// Load the stored pattern, healing it if necessary.
pub fn load(config: &FormatterConfig, store: &mut dyn PatternStore) -> LoadedPattern {
    Loader::new(config, store).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load_from(pattern: Option<&str>) -> (LoadedPattern, MemoryStore) {
        let mut store = match pattern {
            Some(p) => MemoryStore::with_pattern(p),
            None => MemoryStore::new(),
        };
        let loaded = load(&FormatterConfig::default(), &mut store);
        (loaded, store)
    }

    // ========================================================================
    // Chunking
    // ========================================================================

    #[test]
    fn test_split_chunks() {
        assert_eq!(
            split_chunks("[auth]_[year][badfilter="),
            vec!["[auth]", "_", "[year]", "[badfilter="]
        );
        assert_eq!(split_chunks("abc"), vec!["abc"]);
        assert_eq!(split_chunks(""), Vec::<&str>::new());
        assert_eq!(split_chunks("a]b[c]"), vec!["a]b", "[c]"]);
    }

    #[test]
    fn test_split_chunks_respects_escapes() {
        assert_eq!(
            split_chunks(r"x\[y[auth:replace=\],z]"),
            vec![r"x\[y", r"[auth:replace=\],z]"]
        );
    }

    // ========================================================================
    // Healing
    // ========================================================================

    #[test]
    fn test_valid_pattern_is_used_unchanged() {
        let (loaded, store) = load_from(Some("[auth][year]"));
        assert_eq!(loaded.pattern, "[auth][year]");
        assert_eq!(store.writes(), 0);
        assert!(store.notices().is_empty());
    }

    #[test]
    fn test_absent_pattern_uses_default() {
        let (loaded, store) = load_from(None);
        assert_eq!(loaded.pattern, BUILTIN_PATTERN);
        assert_eq!(store.pattern().as_deref(), Some(BUILTIN_PATTERN));
        assert!(store.notices().is_empty());

        let (loaded, _) = load_from(Some("   "));
        assert_eq!(loaded.pattern, BUILTIN_PATTERN);
    }

    #[test]
    fn test_first_run_marker_is_stripped_and_persisted() {
        let (loaded, store) = load_from(Some("\u{200B}[auth:lower][year]"));
        assert_eq!(loaded.pattern, "[auth:lower][year]");
        assert_eq!(store.pattern().as_deref(), Some("[auth:lower][year]"));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_malformed_chunks_are_salvaged() {
        let (loaded, store) = load_from(Some("[auth][year][badfilter="));
        assert_eq!(loaded.pattern, "[auth][year]");
        assert_eq!(store.pattern().as_deref(), Some("[auth][year]"));
        assert_eq!(
            store.notices(),
            [HealingNotice::Salvaged {
                dropped: vec!["[badfilter=".to_string()]
            }]
        );
    }

    #[test]
    fn test_salvage_keeps_valid_chunks_after_bad_ones() {
        let (loaded, _) = load_from(Some("[nosuch]_[auth:badfilter][year]"));
        assert_eq!(loaded.pattern, "_[year]");
    }

    #[test]
    fn test_salvaged_pattern_is_trimmed() {
        let (loaded, store) = load_from(Some(" [auth] ]"));
        assert_eq!(loaded.pattern, "[auth]");
        assert_eq!(
            store.notices(),
            [HealingNotice::Salvaged {
                dropped: vec![" ]".to_string()]
            }]
        );
    }

    #[test]
    fn test_trim_keeps_escaped_trailing_space() {
        let (loaded, store) = load_from(Some(r"[auth]\ [nosuch"));
        assert_eq!(loaded.pattern, r"[auth]\ ");
        assert_eq!(store.pattern().as_deref(), Some(r"[auth]\ "));
        assert_eq!(
            store.notices(),
            [HealingNotice::Salvaged {
                dropped: vec!["[nosuch".to_string()]
            }]
        );
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_nothing_salvageable_resets() {
        let (loaded, store) = load_from(Some("[nosuch][alsobad]"));
        assert_eq!(loaded.pattern, BUILTIN_PATTERN);
        assert_eq!(store.pattern().as_deref(), Some(BUILTIN_PATTERN));
        assert_eq!(store.notices(), [HealingNotice::Reset]);
    }

    #[test]
    fn test_broken_default_falls_back_to_builtin() {
        let config = FormatterConfig {
            default_pattern: "[broken".to_string(),
            ..Default::default()
        };
        let mut store = MemoryStore::with_pattern("[nosuch]");
        let loaded = load(&config, &mut store);
        assert_eq!(loaded.pattern, BUILTIN_PATTERN);
        assert_eq!(store.pattern().as_deref(), Some(BUILTIN_PATTERN));
    }

    #[test]
    fn test_notice_messages() {
        let notice = HealingNotice::Salvaged {
            dropped: vec!["[a=".to_string(), "[b]".to_string()],
        };
        assert_eq!(notice.to_string(), "removed malformed patterns:\n[a=\n[b]");
        assert_eq!(HealingNotice::Reset.to_string(), "resetting to default");
    }
}
