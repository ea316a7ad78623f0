/*
 * catalog.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Registration tables for functions and filters.
//!
//! Every callable name in a pattern is declared here with its user
//! parameters. The compiler binds arguments against these declarations, and
//! the help text is generated from them.

use crate::ast::Argument;
use crate::error::{CompileError, CompileResult};
use std::fmt::Write;
use std::ops::Range;

/// Kind of a user parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Integer,
    Text,
}

/// A declared user parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: Option<&'static str>,
    pub required: bool,
}

const fn int(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Integer,
        default: None,
        required: false,
    }
}

const fn int_or(name: &'static str, default: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Integer,
        default: Some(default),
        required: false,
    }
}

const fn text(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Text,
        default: None,
        required: false,
    }
}

const fn text_or(name: &'static str, default: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Text,
        default: Some(default),
        required: false,
    }
}

const fn required_text(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Text,
        default: None,
        required: true,
    }
}

/// A declared function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    /// Creator functions accept the `edtr`/`editors` prefix and `+initials`.
    pub creators: bool,
    pub description: &'static str,
}

/// A declared filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub description: &'static str,
}

const fn creator_fn(
    name: &'static str,
    params: &'static [ParamSpec],
    description: &'static str,
) -> FunctionSpec {
    FunctionSpec {
        name,
        params,
        creators: true,
        description,
    }
}

const fn field_fn(
    name: &'static str,
    params: &'static [ParamSpec],
    description: &'static str,
) -> FunctionSpec {
    FunctionSpec {
        name,
        params,
        creators: false,
        description,
    }
}

const fn filter(
    name: &'static str,
    params: &'static [ParamSpec],
    description: &'static str,
) -> FilterSpec {
    FilterSpec {
        name,
        params,
        description,
    }
}

pub static FUNCTIONS: &[FunctionSpec] = &[
    creator_fn(
        "auth",
        &[int("n"), int("m")],
        "last name of the m-th creator, truncated to n characters",
    ),
    creator_fn(
        "authors",
        &[int("n"), text_or("joiner", " ")],
        "last names of up to n creators, with EtAl if there are more",
    ),
    creator_fn(
        "authorsAlpha",
        &[text_or("joiner", " ")],
        "BibTeX alpha style creator abbreviation",
    ),
    creator_fn(
        "authIni",
        &[int("n"), text_or("joiner", ".")],
        "first n characters of every creator's last name",
    ),
    creator_fn(
        "authorIni",
        &[text_or("joiner", ".")],
        "first 5 characters of the first creator plus initials of the rest",
    ),
    creator_fn(
        "auth_auth_ea",
        &[text_or("joiner", ".")],
        "first two creators, plus ea if there are more",
    ),
    creator_fn(
        "authEtAl",
        &[text_or("joiner", " ")],
        "both creators if there are two, otherwise the first plus EtAl",
    ),
    creator_fn(
        "auth_etal",
        &[text_or("joiner", ".")],
        "both creators if there are two, otherwise the first plus etal",
    ),
    creator_fn(
        "authshort",
        &[text_or("joiner", ".")],
        "one creator in full, otherwise initials of up to three plus +",
    ),
    creator_fn(
        "authorLast",
        &[text("joiner")],
        "last name of the last creator",
    ),
    creator_fn("authForeIni", &[], "given-name initial of the first creator"),
    creator_fn(
        "authorLastForeIni",
        &[],
        "given-name initial of the last creator",
    ),
    field_fn("year", &[], "year, at least two digits"),
    field_fn("shortyear", &[], "two-digit year"),
    field_fn("origyear", &[], "year of the original date"),
    field_fn(
        "date",
        &[text_or("format", "%Y-%m-%d")],
        "date rendered through a %-format",
    ),
    field_fn("origdate", &[], "original date as YYYY-MM-DD"),
    field_fn("month", &[], "three-letter English month abbreviation"),
    field_fn(
        "shorttitle",
        &[int_or("n", "3"), int_or("m", "0")],
        "first n significant title words, the first m capitalized",
    ),
    field_fn(
        "veryshorttitle",
        &[int_or("n", "1"), int_or("m", "0")],
        "first n significant title words, the first m capitalized",
    ),
    field_fn("title", &[], "significant title words"),
    field_fn("journal", &[], "journal abbreviation or publication title"),
    field_fn("firstpage", &[], "first page number"),
    field_fn("lastpage", &[], "last page number"),
    field_fn("keyword", &[int_or("n", "0")], "n-th tag in sorted order"),
    field_fn("library", &[], "name of the shared library holding the record"),
    field_fn(
        "property",
        &[required_text("name")],
        "value of the named record field",
    ),
    field_fn("zotero", &[], "the stock reference-manager key"),
];

pub static FILTERS: &[FilterSpec] = &[
    filter("lower", &[], "lower-case"),
    filter("upper", &[], "upper-case"),
    filter("capitalize", &[], "upper-case the first letter of each word"),
    filter(
        "condense",
        &[text_or("sep", "")],
        "replace whitespace with sep",
    ),
    filter("prefix", &[text("prefix")], "prepend to a non-empty value"),
    filter("postfix", &[text("postfix")], "append to a non-empty value"),
    filter("abbr", &[], "first character of each word"),
    filter("skipwords", &[], "remove stop words"),
    filter(
        "select",
        &[int_or("start", "1"), int("n")],
        "n words starting at word start",
    ),
    filter(
        "substring",
        &[int_or("start", "1"), int("n")],
        "n characters starting at character start",
    ),
    filter(
        "replace",
        &[text("find"), text("replace")],
        "replace text, or a /regex/",
    ),
    filter("ascii", &[], "drop characters outside printable ASCII"),
    filter("alphanum", &[], "keep only letters and digits"),
    filter(
        "fold",
        &[text("mode")],
        "transliterate to ASCII (mode: german or japanese)",
    ),
    filter("nopunct", &[], "remove punctuation, dashes become -"),
    filter("nopunctordash", &[], "remove punctuation and dashes"),
    filter("split_ideographs", &[], "space out Han ideographs"),
    filter("clean", &[], "transliterate and drop unsafe characters"),
    filter("transliterate", &[], "transliterate to ASCII"),
    filter("numeric", &[], "the value if it starts with a number"),
    filter(
        "format_date",
        &[text_or("format", "%Y-%m-%d")],
        "parse as a date and render through a %-format",
    ),
];

pub fn function(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

pub fn function_ignore_case(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

pub fn filter_spec(name: &str) -> Option<&'static FilterSpec> {
    FILTERS.iter().find(|f| f.name == name)
}

fn write_signature(out: &mut String, name: &str, params: &[ParamSpec]) {
    out.push_str(name);
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(param.name);
        if let Some(default) = param.default {
            let _ = write!(out, "={:?}", default);
        }
    }
    out.push(')');
}

impl FunctionSpec {
    pub fn signature(&self) -> String {
        let mut out = String::new();
        write_signature(&mut out, self.name, self.params);
        out
    }
}

impl FilterSpec {
    pub fn signature(&self) -> String {
        let mut out = String::new();
        write_signature(&mut out, self.name, self.params);
        out
    }
}

/// Help text listing every function and filter.
pub fn describe() -> String {
    let mut out = String::from("Functions:\n");
    for spec in FUNCTIONS {
        let _ = writeln!(out, "  {:<32} {}", spec.signature(), spec.description);
    }
    out.push_str("\nFilters:\n");
    for spec in FILTERS {
        let _ = writeln!(out, "  {:<32} {}", spec.signature(), spec.description);
    }
    out
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArgValue {
    Integer(i64),
    Text(String),
}

/// Arguments bound positionally to a parameter list, defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BoundArgs {
    values: Vec<Option<ArgValue>>,
}

impl BoundArgs {
    pub(crate) fn integer(&self, index: usize) -> Option<i64> {
        match self.values.get(index) {
            Some(Some(ArgValue::Integer(n))) => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn text(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(Some(ArgValue::Text(s))) => Some(s),
            _ => None,
        }
    }
}

fn parse_integer(
    owner: &str,
    param: &ParamSpec,
    value: &str,
    span: Range<usize>,
) -> CompileResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| CompileError::InvalidArguments {
            name: owner.to_string(),
            message: format!("expected an integer for '{}', got '{}'", param.name, value),
            span,
        })
}

/// Bind `args` positionally onto `params`.
///
/// An empty argument for an integer parameter counts as absent.
pub(crate) fn bind(
    owner: &str,
    params: &[ParamSpec],
    args: &[Argument],
    span: &Range<usize>,
) -> CompileResult<BoundArgs> {
    if args.len() > params.len() {
        let message = match params.len() {
            0 => "takes no arguments".to_string(),
            1 => "takes at most 1 argument".to_string(),
            n => format!("takes at most {} arguments", n),
        };
        return Err(CompileError::InvalidArguments {
            name: owner.to_string(),
            message,
            span: args[params.len()].span.clone(),
        });
    }

    let mut values = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let given = args.get(i);
        let value = match (param.kind, given) {
            (ParamKind::Integer, Some(arg)) if !arg.value.trim().is_empty() => Some(
                ArgValue::Integer(parse_integer(owner, param, &arg.value, arg.span.clone())?),
            ),
            (ParamKind::Text, Some(arg)) => Some(ArgValue::Text(arg.value.clone())),
            _ => match (param.kind, param.default) {
                (ParamKind::Integer, Some(default)) => Some(ArgValue::Integer(parse_integer(
                    owner,
                    param,
                    default,
                    span.clone(),
                )?)),
                (ParamKind::Text, Some(default)) => Some(ArgValue::Text(default.to_string())),
                (_, None) if param.required => {
                    return Err(CompileError::InvalidArguments {
                        name: owner.to_string(),
                        message: format!("missing required argument '{}'", param.name),
                        span: span.clone(),
                    });
                }
                (_, None) => None,
            },
        };
        values.push(value);
    }
    Ok(BoundArgs { values })
}
