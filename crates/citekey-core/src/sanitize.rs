/*
 * sanitize.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Final clean-up of generated keys.

use crate::filters::fold;
use crate::text::LanguageProfile;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s{},@]").unwrap());

fn strip(key: &str) -> String {
    KEY_UNSAFE.replace_all(key, "").into_owned()
}

/// Turn raw generator output into a usable citation key.
///
/// The result is never empty, and sanitizing a sanitized key again with the
/// same settings returns it unchanged.
pub fn sanitize(
    raw: &str,
    record_id: &str,
    fold_diacritics: bool,
    language: Option<LanguageProfile>,
) -> String {
    let prepare = |key: &str| {
        let key = if fold_diacritics {
            fold(key, language)
        } else {
            key.to_string()
        };
        strip(&key)
    };
    let fallback = || {
        let key = prepare(&format!("record-{record_id}"));
        if key.is_empty() {
            "record".to_string()
        } else {
            key
        }
    };

    if raw.is_empty() {
        return fallback();
    }
    let key = prepare(raw);
    if key.is_empty() { fallback() } else { key }
}
