/*
 * date.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial dates and the `%field` date format interpreter.
//!
//! Record dates are free text. [`PartialDate::parse`] recognizes the common
//! shapes (ISO, slashed and dotted numeric dates, month names, seasons,
//! intervals, `year [original]`) and leaves every field it cannot find empty.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// A date whose fields are each an empty string or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialDate {
    pub year: String,
    pub short_year: String,
    pub month: String,
    pub day: String,
    pub orig_year: String,
    pub orig_short_year: String,
    pub orig_month: String,
    pub orig_day: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
}

/// Year, month and day of one parsed date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Ymd {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

static ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{3,4})(?:[-/.](\d{1,2})(?:[-/.](\d{1,2}))?)?(?:[T ]\d{2}:\d{2}.*)?$")
        .unwrap()
});

static DAY_FIRST_OR_MONTH_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})([./-])(\d{1,2})[./-](\d{4})$").unwrap());

static NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(\d{1,2})(?:st|nd|rd|th)?\.?\s+)?([a-z]+)\.?(?:\s+(\d{1,2})(?:st|nd|rd|th)?,?)?,?\s+(\d{4})$",
    )
    .unwrap()
});

static BRACKETED_ORIGINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\[\s*([^\]]+?)\s*\]\s*(.*?)$").unwrap());

static INTERVAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)\s*/\s*(.*)$").unwrap());

static ANY_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?: |T)([0-9]{2}):([0-9]{2})(?::([0-9]{2}))?(?:[A-Z]+|[-+][0-9]+)?$").unwrap()
});

static FORMAT_SPEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%-?o?[a-z]|%%").unwrap());

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const SEASONS: [&str; 5] = ["spring", "summer", "autumn", "fall", "winter"];

/// Three-letter English abbreviation of a 1-based month number.
pub fn month_abbreviation(month: &str) -> &'static str {
    month
        .parse::<usize>()
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTH_NAMES.get(i).copied())
        .unwrap_or("")
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| name.starts_with(m))
        .map(|i| i as u32 + 1)
}

fn valid(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<Ymd> {
    let month = month.filter(|m| *m != 0);
    if month.is_some_and(|m| m > 12) {
        return None;
    }
    let day = if month.is_some() {
        day.filter(|d| *d != 0)
    } else {
        None
    };
    if day.is_some_and(|d| d > 31) {
        return None;
    }
    Some(Ymd { year, month, day })
}

fn parse_simple(text: &str) -> Option<Ymd> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO.captures(text) {
        let year = caps[1].parse().ok();
        let month = caps.get(2).and_then(|m| m.as_str().parse().ok());
        let day = caps.get(3).and_then(|d| d.as_str().parse().ok());
        return valid(year, month, day);
    }

    if let Some(caps) = DAY_FIRST_OR_MONTH_FIRST.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[3].parse().ok()?;
        let year = caps[4].parse().ok();
        // dotted dates and impossible months are day-first
        if &caps[2] == "." || first > 12 {
            return valid(year, Some(second), Some(first));
        }
        return valid(year, Some(first), Some(second));
    }

    if let Some(caps) = NAMED_MONTH.captures(text) {
        let name = caps[2].to_lowercase();
        let year = caps[4].parse().ok();
        if SEASONS.contains(&name.as_str()) {
            return Some(Ymd {
                year,
                ..Default::default()
            });
        }
        if let Some(month) = month_from_name(&name) {
            let day = caps
                .get(1)
                .or_else(|| caps.get(3))
                .and_then(|d| d.as_str().parse().ok());
            return valid(year, Some(month), day);
        }
    }

    None
}

/// Parse a date that may be an interval; the start of the interval wins.
fn parse_one(text: &str) -> Option<Ymd> {
    if let Some(ymd) = parse_simple(text) {
        return Some(ymd);
    }
    if let Some(caps) = INTERVAL.captures(text) {
        let from = caps[1].trim();
        let to = caps[2].trim();
        if !from.is_empty() && from != ".." {
            if let Some(ymd) = parse_simple(from) {
                return Some(ymd);
            }
        }
        if !to.is_empty() && to != ".." {
            return parse_simple(to);
        }
    }
    None
}

/// Last resort for verbatim strings: any standalone four-digit year.
fn parse_verbatim(text: &str) -> Option<Ymd> {
    ANY_YEAR.captures(text).map(|caps| Ymd {
        year: caps[1].parse().ok(),
        ..Default::default()
    })
}

fn number(value: Option<impl fmt::Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl PartialDate {
    /// Parse a free-text date. Unrecognized input yields an empty date.
    pub fn parse(raw: &str) -> PartialDate {
        let raw = raw.trim();
        if raw.is_empty() {
            return PartialDate::default();
        }

        let mut primary = None;
        let mut original = None;
        let mut verbatim = false;

        if let Some(caps) = BRACKETED_ORIGINAL.captures(raw) {
            let rest = format!("{} {}", &caps[1], &caps[3]);
            primary = parse_one(rest.trim());
            original = parse_one(&caps[2]);
        }
        if primary.is_none() && original.is_none() {
            primary = parse_one(raw);
        }
        if primary.is_none() && original.is_none() {
            primary = parse_verbatim(raw);
            verbatim = true;
        }

        let mut date = PartialDate::from_ymd(primary.unwrap_or_default());
        if let Some(original) = original {
            date.set_original(&PartialDate::from_ymd(original));
        } else {
            date.copy_primary_to_original();
        }

        if !verbatim {
            if let Some(caps) = TIME.captures(raw) {
                date.hour = caps[1].to_string();
                date.minute = caps[2].to_string();
                date.second = caps.get(3).map(|s| s.as_str().to_string()).unwrap_or_default();
            }
        }

        date
    }

    fn from_ymd(ymd: Ymd) -> PartialDate {
        PartialDate {
            year: number(ymd.year),
            short_year: number(ymd.year.map(|y| y % 100)),
            month: number(ymd.month),
            day: number(ymd.day),
            ..Default::default()
        }
    }

    fn copy_primary_to_original(&mut self) {
        self.orig_year = self.year.clone();
        self.orig_short_year = self.short_year.clone();
        self.orig_month = self.month.clone();
        self.orig_day = self.day.clone();
    }

    /// Take the original-date fields from `original` when it has a year.
    ///
    /// When this date has no year of its own, its primary fields are taken
    /// from `original` too.
    pub fn set_original(&mut self, original: &PartialDate) {
        if original.year.is_empty() {
            return;
        }
        self.orig_year = original.year.clone();
        self.orig_short_year = original.short_year.clone();
        self.orig_month = original.month.clone();
        self.orig_day = original.day.clone();
        if self.year.is_empty() {
            self.year = original.year.clone();
            self.short_year = original.short_year.clone();
            self.month = original.month.clone();
            self.day = original.day.clone();
        }
    }

    /// Look up a field by its format letter(s): `Y`, `y`, `m`, `d`, `oY`,
    /// `oy`, `om`, `od`, `H`, `M`, `S`.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "Y" => &self.year,
            "y" => &self.short_year,
            "m" => &self.month,
            "d" => &self.day,
            "oY" => &self.orig_year,
            "oy" => &self.orig_short_year,
            "om" => &self.orig_month,
            "od" => &self.orig_day,
            "H" => &self.hour,
            "M" => &self.minute,
            "S" => &self.second,
            _ => return None,
        };
        Some(value)
    }
}

/// A format spec names a field the date does not have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDateField(pub String);

impl fmt::Display for UnknownDateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported date format spec '{}'", self.0)
    }
}

/// Left-pad the first run of digits in `value` with zeros to `width`.
pub fn pad_year(value: &str, width: usize) -> String {
    DIGITS
        .replacen(value, 1, |caps: &regex::Captures| {
            format!("{:0>width$}", &caps[0], width = width)
        })
        .into_owned()
}

fn render_spec(date: &PartialDate, spec: &str) -> Result<Option<String>, UnknownDateField> {
    if spec == "%%" {
        return Ok(Some("%".to_string()));
    }
    let (pad, field) = match spec.strip_prefix("%-") {
        Some(field) => (false, field),
        None => (true, &spec[1..]),
    };
    let value = date
        .field(field)
        .ok_or_else(|| UnknownDateField(spec.to_string()))?;
    if value.is_empty() {
        return Ok(None);
    }
    if !pad {
        return Ok(Some(value.to_string()));
    }
    let width = if field == "Y" || field == "oY" { 4 } else { 2 };
    Ok(Some(pad_year(value, width)))
}

/// Check that every field spec in `format` names a known field.
pub fn validate_format(format: &str) -> Result<(), UnknownDateField> {
    format_date(&PartialDate::default(), format).map(|_| ())
}

/// Render `date` through a `%field` format.
///
/// Rendering stops at the first missing field, dropping the separator in
/// front of it; trailing text after the last field is never emitted.
pub fn format_date(date: &PartialDate, format: &str) -> Result<String, UnknownDateField> {
    // alternating separators and rendered fields, separators at even indices
    let mut parts: Vec<Option<String>> = Vec::new();
    let mut last = 0;
    for spec in FORMAT_SPEC.find_iter(format) {
        parts.push(Some(format[last..spec.start()].to_string()));
        parts.push(render_spec(date, spec.as_str())?);
        last = spec.end();
    }
    parts.push(Some(format[last..].to_string()));

    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        let present = if i % 2 == 0 {
            parts.get(i + 1).is_some_and(Option::is_some)
        } else {
            part.is_some()
        };
        if !present {
            break;
        }
        if let Some(text) = part {
            out.push_str(text);
        }
    }
    Ok(out)
}
