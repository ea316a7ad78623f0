/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pattern parser.
//!
//! Turns pattern text into the invocation tree of [`crate::ast`] using the
//! pest grammar in `pattern.pest`. Names are not resolved here; that is the
//! compiler's job.

use crate::ast::{Argument, FilterCall, Flag, FunctionCall, Literal, PatternNode};
use crate::error::{CompileError, CompileResult};
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use std::ops::Range;

#[derive(pest_derive::Parser)]
#[grammar = "pattern.pest"]
struct PatternParser;

/// Parse a pattern into its invocation tree.
pub fn parse(source: &str) -> CompileResult<Vec<PatternNode>> {
    let mut pairs = PatternParser::parse(Rule::pattern, source).map_err(syntax_error)?;
    let Some(pattern) = pairs.next() else {
        return Ok(Vec::new());
    };

    let mut nodes = Vec::new();
    for pair in pattern.into_inner() {
        match pair.as_rule() {
            Rule::literal => nodes.push(PatternNode::Literal(Literal {
                text: unescape(pair.as_str()),
                span: span_of(&pair),
            })),
            Rule::group => nodes.push(PatternNode::FunctionCall(build_group(pair))),
            _ => {}
        }
    }
    Ok(nodes)
}

fn span_of(pair: &Pair<'_, Rule>) -> Range<usize> {
    let span = pair.as_span();
    span.start()..span.end()
}

/// Resolve backslash escapes: `\x` stands for `x`.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn numbers(pair: Pair<'_, Rule>) -> Vec<Argument> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::number)
        .map(|p| Argument {
            value: p.as_str().to_string(),
            span: span_of(&p),
        })
        .collect()
}

fn arguments(pair: Pair<'_, Rule>) -> Vec<Argument> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::argument)
        .map(|p| Argument {
            value: unescape(p.as_str()),
            span: span_of(&p),
        })
        .collect()
}

fn build_group(pair: Pair<'_, Rule>) -> FunctionCall {
    let span = span_of(&pair);
    let mut call = FunctionCall {
        name: String::new(),
        name_span: span.clone(),
        args: Vec::new(),
        flags: Vec::new(),
        filters: Vec::new(),
        span,
    };
    let mut numeric = Vec::new();
    let mut named = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::function => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::function_name => {
                            call.name = part.as_str().to_string();
                            call.name_span = span_of(&part);
                        }
                        Rule::numeric_params => numeric.extend(numbers(part)),
                        Rule::shorthand => {
                            for params in part.into_inner() {
                                numeric.extend(numbers(params));
                            }
                        }
                        Rule::flag => call.flags.push(Flag {
                            name: part.as_str().trim_start_matches('+').to_string(),
                            span: span_of(&part),
                        }),
                        Rule::arguments => named.extend(arguments(part)),
                        _ => {}
                    }
                }
            }
            Rule::filter => call.filters.push(build_filter(inner)),
            _ => {}
        }
    }

    call.args = numeric;
    call.args.extend(named);
    call
}

fn build_filter(pair: Pair<'_, Rule>) -> FilterCall {
    let span = span_of(&pair);
    let mut filter = FilterCall {
        name: String::new(),
        name_span: span.clone(),
        args: Vec::new(),
        span,
    };
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::filter_name => {
                filter.name = part.as_str().to_string();
                filter.name_span = span_of(&part);
            }
            Rule::arguments => filter.args = arguments(part),
            _ => {}
        }
    }
    filter
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of pattern",
        Rule::group => "'['",
        Rule::literal => "literal text",
        Rule::function_name => "a function name",
        Rule::numeric_params | Rule::number => "a number",
        Rule::shorthand => "':' followed by a number",
        Rule::flag => "a '+flag'",
        Rule::filter => "':' followed by a filter",
        Rule::filter_name => "a filter name",
        Rule::arguments => "'=' followed by arguments",
        Rule::argument => "an argument",
        _ => return format!("{:?}", rule),
    }
    .to_string()
}

fn syntax_error(err: pest::error::Error<Rule>) -> CompileError {
    let span = match err.location {
        InputLocation::Pos(pos) => pos..pos,
        InputLocation::Span((start, end)) => start..end,
    };
    let err = err.renamed_rules(describe_rule);
    CompileError::Syntax {
        message: err.variant.message().into_owned(),
        span,
    }
}
