/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pattern AST types.
//!
//! This module defines the invocation tree for parsed patterns. Each node
//! carries the byte span it was parsed from so that compile errors can point
//! back into the pattern.

use std::ops::Range;

/// A node in the pattern AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Literal text, copied to the key as-is.
    Literal(Literal),

    /// Bracket group: `[function:filter=arg,...]`
    FunctionCall(FunctionCall),
}

/// Literal text node, with escapes already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// The literal text content.
    pub text: String,
    /// Byte span of this literal.
    pub span: Range<usize>,
}

/// A function invocation with its filter chain: `[authors2+initials:lower]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// Function name as written (e.g. `auth.etal`, `Title`, `edtr`).
    pub name: String,
    /// Byte span of the name.
    pub name_span: Range<usize>,
    /// Positional arguments: numeric parameters first, then `=` arguments.
    pub args: Vec<Argument>,
    /// Flags such as `+initials`, without the leading `+`.
    pub flags: Vec<Flag>,
    /// Filters, applied left to right.
    pub filters: Vec<FilterCall>,
    /// Byte span of the whole bracket group.
    pub span: Range<usize>,
}

/// A filter applied to a function's value: `:select=1,3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    /// Filter name.
    pub name: String,
    /// Byte span of the name.
    pub name_span: Range<usize>,
    /// Positional arguments.
    pub args: Vec<Argument>,
    /// Byte span from the `:` to the end of the arguments.
    pub span: Range<usize>,
}

/// A literal argument value, with escapes already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub value: String,
    pub span: Range<usize>,
}

/// A `+flag` on a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub span: Range<usize>,
}

impl FunctionCall {
    /// True if the call carries the flag `name`.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f.name == name)
    }
}
