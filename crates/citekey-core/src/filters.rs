/*
 * filters.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filter catalog.
//!
//! A [`Filter`] transforms one value. It sees only that value, its own
//! literal arguments and the record's language profile.

use crate::catalog::{BoundArgs, FilterSpec};
use crate::config::SkipWords;
use crate::date::{PartialDate, format_date, validate_format};
use crate::error::{CompileError, CompileResult};
use crate::text::{
    LanguageProfile, WHITESPACE_RUN, clean, collapse_whitespace, remove_non_ascii, slice_range,
    split_ideographs, transliterate,
};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::ops::Range;
use std::sync::Arc;

static NOT_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]").unwrap());
static DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\p{Pc}|\p{Pd})+").unwrap());
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Pe}|\p{Pf}|\p{Pi}|\p{Po}|\p{Ps}").unwrap());
static LEADING_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[+-]?[0-9]").unwrap());

/// How `replace` finds its target.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Either argument was empty.
    Disabled,
    /// Case-insensitive literal text.
    Literal { find: Regex, replace: String },
    /// A `/regex/`; `$1` and `${name}` in the replacement expand.
    Pattern { find: Regex, replace: String },
}

/// A resolved filter with bound arguments.
#[derive(Debug, Clone)]
pub enum Filter {
    Lower,
    Upper,
    Capitalize,
    Condense { separator: String },
    Prefix { prefix: String },
    Postfix { postfix: String },
    Abbr,
    SkipWords { words: Arc<SkipWords> },
    Select { start: i64, n: Option<i64> },
    Substring { start: i64, n: Option<i64> },
    Replace(Replacement),
    Ascii,
    Alphanum,
    Fold { mode: Option<LanguageProfile> },
    NoPunct,
    NoPunctOrDash,
    SplitIdeographs,
    Clean,
    Transliterate,
    Numeric,
    FormatDate { format: String },
}

fn invalid(spec: &FilterSpec, message: String, span: &Range<usize>) -> CompileError {
    CompileError::InvalidArguments {
        name: spec.name.to_string(),
        message,
        span: span.clone(),
    }
}

impl Filter {
    /// Instantiate the catalog entry `spec` with already-bound arguments.
    pub(crate) fn bind(
        spec: &FilterSpec,
        args: &BoundArgs,
        skip_words: &Arc<SkipWords>,
        span: &Range<usize>,
    ) -> CompileResult<Filter> {
        let text = |i: usize| args.text(i).unwrap_or_default().to_string();
        let filter = match spec.name {
            "lower" => Filter::Lower,
            "upper" => Filter::Upper,
            "capitalize" => Filter::Capitalize,
            "condense" => Filter::Condense { separator: text(0) },
            "prefix" => Filter::Prefix { prefix: text(0) },
            "postfix" => Filter::Postfix { postfix: text(0) },
            "abbr" => Filter::Abbr,
            "skipwords" => Filter::SkipWords {
                words: Arc::clone(skip_words),
            },
            "select" => Filter::Select {
                start: args.integer(0).unwrap_or(1),
                n: args.integer(1),
            },
            "substring" => Filter::Substring {
                start: args.integer(0).unwrap_or(1),
                n: args.integer(1),
            },
            "replace" => Filter::Replace(bind_replacement(spec, &text(0), &text(1), span)?),
            "ascii" => Filter::Ascii,
            "alphanum" => Filter::Alphanum,
            "fold" => {
                let mode = match args.text(0) {
                    None | Some("") => None,
                    Some(mode) => Some(LanguageProfile::from_mode(mode).ok_or_else(|| {
                        invalid(spec, format!("unsupported fold mode '{}'", mode), span)
                    })?),
                };
                Filter::Fold { mode }
            }
            "nopunct" => Filter::NoPunct,
            "nopunctordash" => Filter::NoPunctOrDash,
            "split_ideographs" => Filter::SplitIdeographs,
            "clean" => Filter::Clean,
            "transliterate" => Filter::Transliterate,
            "numeric" => Filter::Numeric,
            "format_date" => {
                let format = text(0);
                validate_format(&format).map_err(|e| invalid(spec, e.to_string(), span))?;
                Filter::FormatDate { format }
            }
            other => {
                return Err(CompileError::UnknownFilter {
                    name: other.to_string(),
                    span: span.clone(),
                });
            }
        };
        Ok(filter)
    }

    /// Apply this filter to `value`.
    pub fn apply(&self, value: &str, language: Option<LanguageProfile>) -> String {
        match self {
            Filter::Lower => value.to_lowercase(),
            Filter::Upper => value.to_uppercase(),
            Filter::Capitalize => capitalize(value),
            Filter::Condense { separator } => value
                .chars()
                .map(|c| {
                    if c.is_whitespace() {
                        separator.clone()
                    } else {
                        c.to_string()
                    }
                })
                .collect(),
            Filter::Prefix { prefix } => {
                if value.is_empty() || prefix.is_empty() {
                    value.to_string()
                } else {
                    format!("{prefix}{value}")
                }
            }
            Filter::Postfix { postfix } => {
                if value.is_empty() || postfix.is_empty() {
                    value.to_string()
                } else {
                    format!("{value}{postfix}")
                }
            }
            Filter::Abbr => WHITESPACE_RUN
                .split(value)
                .map(|word| word.chars().next().map(String::from).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
            Filter::SkipWords { words } => WHITESPACE_RUN
                .split(value)
                .filter(|word| !words.contains(word))
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string(),
            Filter::Select { start, n } => {
                let words: Vec<&str> = WHITESPACE_RUN.split(value).collect();
                let start = start.saturating_sub(1);
                let end = n.map(|n| start.saturating_add(n));
                words[slice_range(words.len(), start, end)].join(" ")
            }
            Filter::Substring { start, n } => {
                let chars: Vec<char> = value.chars().collect();
                let start = start.saturating_sub(1);
                let n = n.unwrap_or(chars.len() as i64);
                chars[slice_range(chars.len(), start, Some(start.saturating_add(n)))]
                    .iter()
                    .collect()
            }
            Filter::Replace(replacement) => match replacement {
                Replacement::Disabled => value.to_string(),
                Replacement::Literal { find, replace } => find
                    .replace_all(value, NoExpand(replace.as_str()))
                    .into_owned(),
                Replacement::Pattern { find, replace } => {
                    find.replace_all(value, replace.as_str()).into_owned()
                }
            },
            Filter::Ascii => collapse_whitespace(&remove_non_ascii(value)),
            Filter::Alphanum => collapse_whitespace(&NOT_ALPHANUMERIC.replace_all(value, "")),
            Filter::Fold { mode } => fold(value, mode.or(language)),
            Filter::NoPunct => {
                let dashed = DASH.replace_all(value, "-");
                PUNCTUATION.replace_all(&dashed, "").into_owned()
            }
            Filter::NoPunctOrDash => {
                let undashed = DASH.replace_all(value, "");
                PUNCTUATION.replace_all(&undashed, "").into_owned()
            }
            Filter::SplitIdeographs => split_ideographs(value),
            Filter::Clean => clean(value, language),
            Filter::Transliterate => transliterate(value, language),
            Filter::Numeric => {
                if LEADING_INTEGER.is_match(value) {
                    value.to_string()
                } else {
                    String::new()
                }
            }
            Filter::FormatDate { format } => {
                if value.is_empty() {
                    return String::new();
                }
                format_date(&PartialDate::parse(value), format).unwrap_or_default()
            }
        }
    }
}

fn bind_replacement(
    spec: &FilterSpec,
    find: &str,
    replace: &str,
    span: &Range<usize>,
) -> CompileResult<Replacement> {
    if find.is_empty() || replace.is_empty() {
        return Ok(Replacement::Disabled);
    }
    let regex_body = find
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|body| !body.is_empty());
    let source = match regex_body {
        Some(body) => format!("(?i){}", body),
        None => format!("(?i){}", regex::escape(find)),
    };
    let regex = Regex::new(&source)
        .map_err(|e| invalid(spec, format!("invalid regular expression: {}", e), span))?;
    let replace = replace.to_string();
    Ok(match regex_body {
        Some(_) => Replacement::Pattern {
            find: regex,
            replace,
        },
        None => Replacement::Literal {
            find: regex,
            replace,
        },
    })
}

/// Upper-case ASCII lower-case letters at the start and after whitespace.
fn capitalize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_boundary = true;
    for c in value.chars() {
        if at_boundary && c.is_ascii_lowercase() {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = c.is_whitespace();
    }
    out
}

/// Transliterate to ASCII and collapse whitespace.
pub fn fold(value: &str, profile: Option<LanguageProfile>) -> String {
    collapse_whitespace(&transliterate(value, profile))
}
