/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Citation key patterns: parsing, compilation and generation.
 *
 * A pattern such as `[auth:lower][shorttitle3_3][year]` is parsed once,
 * resolved against the function and filter catalogs, and compiled into a
 * Generator that turns each bibliographic record into a citation key.
 */

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod context;
pub mod date;
pub mod engine;
pub mod error;
pub mod filters;
pub mod functions;
pub mod loader;
pub mod parser;
pub mod record;
pub mod sanitize;
pub mod text;

pub use compiler::{Generator, compile};
pub use config::FormatterConfig;
pub use context::RecordContext;
pub use engine::KeyGenerator;
pub use error::{CompileError, CompileResult};
pub use loader::{HealingNotice, LoadedPattern, MemoryStore, PatternStore};
pub use record::{BibliographicRecord, CreatorEntry, Item};
pub use sanitize::sanitize;
pub use text::LanguageProfile;
