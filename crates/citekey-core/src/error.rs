/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for pattern compilation.
//!
//! Compilation is the only stage that can fail. Evaluating a compiled
//! pattern against a record never raises: missing data turns into empty
//! strings instead.

use std::ops::Range;
use thiserror::Error;

/// Errors that can occur while parsing or compiling a pattern.
///
/// Every variant carries the byte span of the offending part of the pattern
/// so that live editing surfaces can point at it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The pattern does not match the grammar.
    #[error("Syntax error: {message}")]
    Syntax { message: String, span: Range<usize> },

    /// A bracket group names a function that is not in the catalog.
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String, span: Range<usize> },

    /// A filter name is not in the catalog.
    #[error("Unknown filter: {name}")]
    UnknownFilter { name: String, span: Range<usize> },

    /// A function or filter was invoked with arguments it cannot accept.
    #[error("Invalid arguments for '{name}': {message}")]
    InvalidArguments {
        name: String,
        message: String,
        span: Range<usize>,
    },
}

/// Result type for pattern compilation.
pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    /// Byte span of the pattern this error refers to.
    pub fn span(&self) -> Range<usize> {
        match self {
            CompileError::Syntax { span, .. }
            | CompileError::UnknownFunction { span, .. }
            | CompileError::UnknownFilter { span, .. }
            | CompileError::InvalidArguments { span, .. } => span.clone(),
        }
    }

    /// Byte offset where the error starts.
    pub fn offset(&self) -> usize {
        self.span().start
    }

    fn label(&self) -> String {
        match self {
            CompileError::Syntax { message, .. } => message.clone(),
            CompileError::UnknownFunction { .. } => "no function with this name".to_string(),
            CompileError::UnknownFilter { .. } => "no filter with this name".to_string(),
            CompileError::InvalidArguments { message, .. } => message.clone(),
        }
    }

    /// Render this error as an annotated snippet of `pattern`.
    ///
    /// Falls back to the plain display form if the snippet cannot be
    /// produced.
    pub fn render(&self, pattern: &str) -> String {
        use ariadne::{Config, Label, Report, ReportKind, Source};

        if pattern.is_empty() {
            return self.to_string();
        }

        // ariadne counts characters, the grammar reports bytes
        let total = pattern.chars().count();
        let span = self.span();
        let mut start = char_offset(pattern, span.start);
        let mut end = char_offset(pattern, span.end);
        if start >= total {
            start = total - 1;
        }
        if end <= start {
            end = start + 1;
        }

        let report = Report::build(ReportKind::Error, (), start)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new(start..end).with_message(self.label()))
            .finish();

        let mut out = Vec::new();
        match report.write(Source::from(pattern.to_string()), &mut out) {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    let byte_offset = byte_offset.min(text.len());
    text.char_indices()
        .take_while(|(i, _)| *i < byte_offset)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CompileError::UnknownFilter {
            name: "badfilter".to_string(),
            span: 7..16,
        };
        assert_eq!(err.to_string(), "Unknown filter: badfilter");
        assert_eq!(err.offset(), 7);

        let err = CompileError::InvalidArguments {
            name: "select".to_string(),
            message: "expected an integer, got 'x'".to_string(),
            span: 3..4,
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for 'select': expected an integer, got 'x'"
        );
    }

    #[test]
    fn test_char_offset_counts_characters() {
        assert_eq!(char_offset("Müller[x]", 0), 0);
        // 'ü' is two bytes
        assert_eq!(char_offset("Müller[x]", 7), 6);
        assert_eq!(char_offset("abc", 99), 3);
    }

    #[test]
    fn test_render_mentions_message_and_label() {
        let pattern = "[auth][nosuch]";
        let err = CompileError::UnknownFunction {
            name: "nosuch".to_string(),
            span: 7..13,
        };
        let rendered = err.render(pattern);
        assert!(rendered.contains("Unknown function: nosuch"), "{}", rendered);
        assert!(rendered.contains("no function with this name"), "{}", rendered);
    }

    #[test]
    fn test_render_span_at_end_of_input() {
        let pattern = "[auth";
        let err = CompileError::Syntax {
            message: "expected ']'".to_string(),
            span: 5..5,
        };
        let rendered = err.render(pattern);
        assert!(rendered.contains("expected ']'"), "{}", rendered);
    }
}
