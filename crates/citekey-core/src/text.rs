/*
 * text.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Text helpers shared by the record context, the functions and the filters.

use once_cell::sync::Lazy;
use regex::Regex;

/// Named language profile resolved from a record's language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageProfile {
    German,
    Japanese,
}

impl LanguageProfile {
    /// Resolve a record language tag through the alias table.
    ///
    /// Only the exact aliases are recognized; `de-AT` does not resolve.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "de" | "german" => Some(LanguageProfile::German),
            "jp" | "japanese" => Some(LanguageProfile::Japanese),
            _ => None,
        }
    }

    /// Resolve an explicit `fold` mode. Only full profile names are accepted.
    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode {
            "german" => Some(LanguageProfile::German),
            "japanese" => Some(LanguageProfile::Japanese),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanguageProfile::German => "german",
            LanguageProfile::Japanese => "japanese",
        }
    }
}

pub(crate) const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^-:\p{L}0-9_!$*+./;\[\]]").unwrap());

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{Nd}\p{Pc}\p{M}]+(?:-[\p{L}\p{Nd}\p{Pc}\p{M}]+)*").unwrap()
});

static NON_PRINTABLE_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^ -~]").unwrap());

static HAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}").unwrap());

pub(crate) static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

fn german_digraph(c: char) -> Option<&'static str> {
    match c {
        '\u{00E4}' => Some("ae"),
        '\u{00F6}' => Some("oe"),
        '\u{00FC}' => Some("ue"),
        '\u{00C4}' => Some("Ae"),
        '\u{00D6}' => Some("Oe"),
        '\u{00DC}' => Some("Ue"),
        _ => None,
    }
}

/// Replace diacritics and non-Latin script with ASCII look-alikes.
///
/// The German profile applies its digraph table first. Characters without a
/// transliteration become U+FFFD and are kept, so folding is idempotent.
pub fn transliterate(text: &str, profile: Option<LanguageProfile>) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() || c == REPLACEMENT_CHARACTER {
            out.push(c);
            continue;
        }
        if profile == Some(LanguageProfile::German) {
            if let Some(digraph) = german_digraph(c) {
                out.push_str(digraph);
                continue;
            }
        }
        match deunicode::deunicode_char(c) {
            Some(ascii) => out.push_str(ascii),
            None => out.push(REPLACEMENT_CHARACTER),
        }
    }
    out
}

/// Transliterate and drop every character that is unsafe in a citation key.
pub fn clean(text: &str, profile: Option<LanguageProfile>) -> String {
    UNSAFE_CHARS
        .replace_all(&transliterate(text, profile), "")
        .trim()
        .to_string()
}

/// Split on whitespace runs and rejoin with single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_non_ascii(text: &str) -> String {
    NON_PRINTABLE_ASCII.replace_all(text, "").into_owned()
}

pub fn contains_han(text: &str) -> bool {
    HAN.is_match(text)
}

/// Surround every Han ideograph with spaces.
pub fn split_ideographs(text: &str) -> String {
    HAN.replace_all(text, " $0 ").trim().to_string()
}

/// Word tokens of a title: letters, digits, connectors and marks, with
/// internal hyphens allowed.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD.find_iter(text).map(|m| m.as_str())
}

/// Remove markup tags and decode character entities.
pub fn inner_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00A0}'),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Strip one pair of surrounding double quotes.
pub fn strip_quotes(name: &str) -> &str {
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

/// The first `n` characters of `text`.
pub fn prefix_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Upper-case the first character of `text`.
pub fn uppercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Index range selected by an array slice with possibly negative bounds.
///
/// Negative bounds count from the end; out-of-range bounds are clamped and an
/// inverted range is empty. Existing keys depend on these exact semantics.
pub fn slice_range(len: usize, start: i64, end: Option<i64>) -> std::ops::Range<usize> {
    let len = len as i64;
    let resolve = |i: i64| {
        if i < 0 {
            (len + i).max(0)
        } else {
            i.min(len)
        }
    };
    let start = resolve(start);
    let end = end.map_or(len, resolve);
    if end <= start {
        start as usize..start as usize
    } else {
        start as usize..end as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ========================================================================
    // Transliteration
    // ========================================================================

    #[test]
    fn test_german_profile_uses_digraphs() {
        assert_eq!(
            transliterate("Müller", Some(LanguageProfile::German)),
            "Mueller"
        );
        assert_eq!(
            transliterate("Ärger Öl Übel", Some(LanguageProfile::German)),
            "Aerger Oel Uebel"
        );
    }

    #[test]
    fn test_generic_folding_strips_diacritics() {
        assert_eq!(transliterate("Müller", None), "Muller");
        assert_eq!(transliterate("Erdős", None), "Erdos");
        assert_eq!(transliterate("plain ascii", None), "plain ascii");
    }

    #[test]
    fn test_japanese_profile_folds_generically() {
        assert_eq!(
            transliterate("Müller", Some(LanguageProfile::Japanese)),
            "Muller"
        );
    }

    #[test]
    fn test_transliterate_is_idempotent() {
        let once = transliterate("Šťastný 北京 Ærø", None);
        assert_eq!(transliterate(&once, None), once);
    }

    #[test]
    fn test_clean_removes_unsafe_characters() {
        assert_eq!(clean("Smith & Jones, (2001)", None), "SmithJones2001");
        assert_eq!(clean("a-b:c_d!e$f*g+h.i/j;k[l]", None), "a-b:c_d!e$f*g+h.i/j;k[l]");
        assert_eq!(clean("Gödel", Some(LanguageProfile::German)), "Goedel");
    }

    // ========================================================================
    // Markup and tokens
    // ========================================================================

    #[test]
    fn test_inner_text_strips_tags_and_entities() {
        assert_eq!(
            inner_text("The <i>E. coli</i> genome &amp; its <b>parts</b>"),
            "The E. coli genome & its parts"
        );
        assert_eq!(inner_text("&#65;&#x42;&unknown;"), "AB&unknown;");
        assert_eq!(inner_text("3 > 2"), "3 > 2");
    }

    #[test]
    fn test_words_keep_internal_hyphens() {
        let found: Vec<&str> = words("A well-known, (short) title!").collect();
        assert_eq!(found, vec!["A", "well-known", "short", "title"]);
    }

    #[test]
    fn test_split_ideographs() {
        assert_eq!(split_ideographs("北京abc"), "北  京 abc");
        assert_eq!(split_ideographs("plain"), "plain");
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"van Gogh\""), "van Gogh");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("Gogh"), "Gogh");
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!(LanguageProfile::from_tag("DE"), Some(LanguageProfile::German));
        assert_eq!(LanguageProfile::from_tag("german"), Some(LanguageProfile::German));
        assert_eq!(LanguageProfile::from_tag("jp"), Some(LanguageProfile::Japanese));
        assert_eq!(LanguageProfile::from_tag("de-AT"), None);
        assert_eq!(LanguageProfile::from_mode("de"), None);
    }

    // ========================================================================
    // Slicing
    // ========================================================================

    #[test]
    fn test_slice_range() {
        assert_eq!(slice_range(4, 0, Some(3)), 0..3);
        assert_eq!(slice_range(4, 2, None), 2..4);
        assert_eq!(slice_range(4, -1, Some(2)), 3..3);
        assert_eq!(slice_range(4, -1, None), 3..4);
        assert_eq!(slice_range(4, 3, Some(10)), 3..4);
        assert_eq!(slice_range(4, 9, None), 4..4);
    }
}
