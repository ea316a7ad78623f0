/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pattern compiler.
//!
//! Resolves every name in a parsed pattern against the function and filter
//! catalogs, binds and validates all arguments, and produces an immutable
//! [`Generator`]. Nothing is looked up by name once compilation is done.

use crate::ast::{FilterCall, FunctionCall, PatternNode};
use crate::catalog::{self, FunctionSpec};
use crate::config::{FormatterConfig, SkipWords};
use crate::context::RecordContext;
use crate::error::{CompileError, CompileResult};
use crate::filters::Filter;
use crate::functions::{CreatorSelection, Function};
use crate::parser;
use crate::text::uppercase_first;
use std::sync::Arc;
use tracing::{debug, trace};

/// One resolved element of a pattern.
#[derive(Debug, Clone)]
enum Node {
    Literal(String),
    Call(Call),
}

#[derive(Debug, Clone)]
struct Call {
    function: Function,
    /// Upper-case the first letter of every word; set by a capitalized name.
    capitalize_words: bool,
    filters: Vec<Filter>,
}

impl Call {
    fn evaluate(&self, ctx: &RecordContext<'_>, skip_words: &SkipWords) -> String {
        let mut value = self.function.evaluate(ctx, skip_words);
        if self.capitalize_words {
            value = value
                .split(' ')
                .map(uppercase_first)
                .collect::<Vec<_>>()
                .join(" ");
        }
        for filter in &self.filters {
            value = filter.apply(&value, ctx.language());
        }
        value
    }
}

/// A compiled pattern: a pure function from a record context to a raw key.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    nodes: Vec<Node>,
    skip_words: Arc<SkipWords>,
}

impl Generator {
    /// Compile `pattern` with the settings in `config`.
    pub fn compile(pattern: &str, config: &FormatterConfig) -> CompileResult<Generator> {
        Compiler::new(config).compile(pattern)
    }

    /// Render the raw, unsanitized key for one record.
    pub fn generate(&self, ctx: &RecordContext<'_>) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Literal(text) => out.push_str(text),
                Node::Call(call) => out.push_str(&call.evaluate(ctx, &self.skip_words)),
            }
        }
        out
    }

    /// True if the generator renders nothing for every record.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Compiles patterns against a fixed configuration.
pub struct Compiler<'a> {
    config: &'a FormatterConfig,
    skip_words: Arc<SkipWords>,
}

impl<'a> Compiler<'a> {
    pub fn new(config: &'a FormatterConfig) -> Self {
        Compiler {
            config,
            skip_words: Arc::new(config.skip_words()),
        }
    }

    pub fn compile(&self, pattern: &str) -> CompileResult<Generator> {
        let result = parser::parse(pattern).and_then(|nodes| self.resolve(nodes));
        match &result {
            Ok(generator) => debug!(pattern, nodes = generator.nodes.len(), "compiled pattern"),
            Err(err) => debug!(pattern, offset = err.offset(), error = %err, "pattern does not compile"),
        }
        result
    }

    fn resolve(&self, nodes: Vec<PatternNode>) -> CompileResult<Generator> {
        let mut resolved = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                PatternNode::Literal(literal) => resolved.push(Node::Literal(literal.text)),
                PatternNode::FunctionCall(call) => resolved.push(Node::Call(self.resolve_call(&call)?)),
            }
        }
        Ok(Generator {
            nodes: resolved,
            skip_words: Arc::clone(&self.skip_words),
        })
    }

    fn resolve_call(&self, call: &FunctionCall) -> CompileResult<Call> {
        let resolved = self.resolve_name(call)?;
        let Resolved {
            spec,
            only_editors,
            capitalize_words,
            property,
        } = resolved;

        let mut with_initials = false;
        for flag in &call.flags {
            if spec.creators && flag.name == "initials" {
                with_initials = true;
            } else {
                return Err(CompileError::InvalidArguments {
                    name: call.name.clone(),
                    message: format!("unknown flag '+{}'", flag.name),
                    span: flag.span.clone(),
                });
            }
        }

        let function = match property {
            Some(field) => {
                if let Some(arg) = call.args.first() {
                    return Err(CompileError::InvalidArguments {
                        name: call.name.clone(),
                        message: "field accessors take no arguments".to_string(),
                        span: arg.span.clone(),
                    });
                }
                trace!(name = %call.name, field, "resolved as record field");
                Function::Property {
                    name: field.to_string(),
                }
            }
            None => {
                let args = catalog::bind(&call.name, spec.params, &call.args, &call.span)?;
                let select = CreatorSelection {
                    only_editors,
                    with_initials,
                };
                Function::bind(spec, &args, select, &call.span)?
            }
        };

        let filters = call
            .filters
            .iter()
            .map(|filter| self.resolve_filter(filter))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(Call {
            function,
            capitalize_words,
            filters,
        })
    }

    fn resolve_name(&self, call: &FunctionCall) -> CompileResult<Resolved<'a>> {
        let unknown = || CompileError::UnknownFunction {
            name: call.name.clone(),
            span: call.name_span.clone(),
        };

        let name = call.name.replace('.', "_");
        let capitalize_words = name.starts_with(|c: char| c.is_ascii_uppercase());

        let (base, only_editors) = if let Some(rest) = strip_prefix_ignore_case(&name, "edtr") {
            (format!("auth{}", rest), true)
        } else if let Some(rest) = strip_prefix_ignore_case(&name, "editors") {
            (format!("authors{}", rest), true)
        } else {
            (name.clone(), false)
        };

        let spec = if capitalize_words {
            catalog::function_ignore_case(&base)
        } else {
            catalog::function(&base)
        };

        match spec {
            Some(spec) if only_editors && !spec.creators => Err(unknown()),
            Some(spec) => Ok(Resolved {
                spec,
                only_editors,
                capitalize_words,
                property: None,
            }),
            None if only_editors => Err(unknown()),
            None => {
                let field = self.config.field_name(&name).ok_or_else(unknown)?;
                Ok(Resolved {
                    spec: PROPERTY,
                    only_editors: false,
                    capitalize_words,
                    property: Some(field),
                })
            }
        }
    }

    fn resolve_filter(&self, call: &FilterCall) -> CompileResult<Filter> {
        let spec = catalog::filter_spec(&call.name).ok_or_else(|| CompileError::UnknownFilter {
            name: call.name.clone(),
            span: call.name_span.clone(),
        })?;
        let args = catalog::bind(&call.name, spec.params, &call.args, &call.span)?;
        Filter::bind(spec, &args, &self.skip_words, &call.span)
    }
}

/// Outcome of name resolution.
struct Resolved<'a> {
    spec: &'static FunctionSpec,
    only_editors: bool,
    capitalize_words: bool,
    /// Set when the name is a configured record field rather than a function.
    property: Option<&'a str>,
}

static PROPERTY: &FunctionSpec = &FunctionSpec {
    name: "property",
    params: &[],
    creators: false,
    description: "",
};

fn strip_prefix_ignore_case<'s>(name: &'s str, prefix: &str) -> Option<&'s str> {
    let head = name.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &name[prefix.len()..])
}

/// Compile `pattern` with the settings in `config`.
pub fn compile(pattern: &str, config: &FormatterConfig) -> CompileResult<Generator> {
    Generator::compile(pattern, config)
}
