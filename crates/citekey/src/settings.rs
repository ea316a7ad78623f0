/*
 * settings.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! YAML settings file and the pattern store backed by it.
//!
//! ```yaml
//! citekey-format: "[auth:lower][year]"
//! formatter:
//!   citekey-fold: true
//!   skip-words: "a,an,the"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use citekey_core::{FormatterConfig, HealingNotice, PatternStore};
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, warn};

const FORMAT_KEY: &str = "citekey-format";
const FORMATTER_KEY: &str = "formatter";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Failed to write settings file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A parsed settings file.
///
/// The raw document is kept so that writing the pattern back preserves any
/// keys this tool does not know about.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    document: Mapping,
    pub formatter: FormatterConfig,
    notices: Vec<HealingNotice>,
    dirty: bool,
}

impl SettingsFile {
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> ConfigResult<Self> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let document = match serde_yaml::from_str::<Value>(contents).map_err(|e| invalid(e.to_string()))? {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(invalid("expected a mapping at the top level".to_string())),
        };

        if let Some(format) = document.get(FORMAT_KEY)
            && !format.is_string()
        {
            return Err(invalid(format!("'{FORMAT_KEY}' must be a string")));
        }

        let formatter = match document.get(FORMATTER_KEY) {
            None | Some(Value::Null) => FormatterConfig::default(),
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| invalid(format!("'{FORMATTER_KEY}': {e}")))?,
        };

        debug!(path = %path.display(), "read settings");
        Ok(SettingsFile {
            path: path.to_path_buf(),
            document,
            formatter,
            notices: Vec::new(),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the loader has replaced the stored pattern.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn notices(&self) -> &[HealingNotice] {
        &self.notices
    }

    /// Write the document back to its file.
    pub fn save(&mut self) -> ConfigResult<()> {
        let write_error = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        let yaml = serde_yaml::to_string(&self.document)
            .map_err(|e| write_error(std::io::Error::other(e)))?;
        fs::write(&self.path, yaml).map_err(write_error)?;
        self.dirty = false;
        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

impl PatternStore for SettingsFile {
    fn pattern(&self) -> Option<String> {
        self.document
            .get(FORMAT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set_pattern(&mut self, pattern: &str) {
        self.document
            .insert(Value::from(FORMAT_KEY), Value::from(pattern));
        self.dirty = true;
    }

    fn notify(&mut self, notice: &HealingNotice) {
        warn!(path = %self.path.display(), "{notice}");
        self.notices.push(notice.clone());
    }
}
