/*
 * record.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The read-only record surface the formatter works against.
//!
//! The formatter never owns bibliographic data. It sees a record through
//! [`BibliographicRecord`], which the record store implements. [`Item`] is a
//! JSON-backed implementation in the shape of a reference-manager API export,
//! used by the command-line front end and by tests.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// How a creator's name is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldMode {
    /// Separate given and family names.
    #[default]
    TwoField,
    /// One literal name (institutions, mononyms), kept in `last_name`.
    SingleField,
}

/// A single creator of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorEntry {
    /// Creator type, e.g. `author`, `editor`, `seriesEditor`, `translator`.
    pub role: String,
    pub last_name: String,
    pub first_name: String,
    pub field_mode: FieldMode,
}

impl CreatorEntry {
    /// A two-field creator.
    pub fn new(
        role: impl Into<String>,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            field_mode: FieldMode::TwoField,
        }
    }

    /// A single-field creator such as an institution.
    pub fn literal(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            last_name: name.into(),
            first_name: String::new(),
            field_mode: FieldMode::SingleField,
        }
    }
}

/// Capability surface over one bibliographic record.
///
/// Only `id`, `item_type`, `field`, `creators`, `tags` and `extra_field` are
/// required; the remaining accessors default to generic field lookups.
pub trait BibliographicRecord {
    /// Stable internal identifier, used for the fallback key.
    fn id(&self) -> &str;

    /// Record type, e.g. `journalArticle` or `book`.
    fn item_type(&self) -> &str;

    /// Generic field lookup. Returns `None` for absent or unknown fields.
    fn field(&self, name: &str) -> Option<String>;

    fn creators(&self) -> Vec<CreatorEntry>;

    fn tags(&self) -> Vec<String>;

    /// Pre-parsed key/value annotation from the free-text extra field.
    fn extra_field(&self, key: &str) -> Option<String>;

    fn language(&self) -> Option<String> {
        self.field("language")
    }

    fn title(&self) -> Option<String> {
        self.field("title")
    }

    fn date(&self) -> Option<String> {
        self.field("date")
    }

    fn pages(&self) -> Option<String> {
        self.field("pages")
    }

    /// Journal abbreviation, when the abbreviation service has one.
    fn journal_abbreviation(&self) -> Option<String> {
        self.field("journalAbbreviation")
    }

    /// Display name of the shared library holding this record; `None` for the
    /// personal library.
    fn library_name(&self) -> Option<String> {
        None
    }
}

/// A creator as it appears in the JSON export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default = "default_creator_type")]
    pub creator_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Single-field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_creator_type() -> String {
    "author".to_string()
}

impl From<&Creator> for CreatorEntry {
    fn from(creator: &Creator) -> Self {
        match &creator.name {
            Some(name) => CreatorEntry::literal(creator.creator_type.clone(), name.clone()),
            None => CreatorEntry::new(
                creator.creator_type.clone(),
                creator.last_name.clone().unwrap_or_default(),
                creator.first_name.clone().unwrap_or_default(),
            ),
        }
    }
}

/// A tag, either `{"tag": "..."}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Object { tag: String },
    Plain(String),
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Object { tag } => tag,
            Tag::Plain(tag) => tag,
        }
    }
}

/// A record in the shape of a reference-manager JSON export.
///
/// Every field that has no dedicated member is kept in `fields` and is
/// reachable through [`BibliographicRecord::field`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(deserialize_with = "deserialize_string_or_int")]
    pub id: String,

    #[serde(default)]
    pub item_type: String,

    #[serde(default)]
    pub creators: Vec<Creator>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Key/value annotations already extracted from the extra field.
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

fn deserialize_string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("expected string or number for id")),
    }
}

impl Item {
    pub fn new(id: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type: item_type.into(),
            ..Default::default()
        }
    }

    /// Set a plain field, e.g. `title` or `date`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .insert(name.into(), serde_json::Value::String(value.into()));
        self
    }

    pub fn with_creator(mut self, creator_type: &str, last_name: &str, first_name: &str) -> Self {
        self.creators.push(Creator {
            creator_type: creator_type.to_string(),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            name: None,
        });
        self
    }

    pub fn with_literal_creator(mut self, creator_type: &str, name: &str) -> Self {
        self.creators.push(Creator {
            creator_type: creator_type.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(Tag::Plain(tag.into()));
        self
    }

    pub fn with_extra_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }
}

impl BibliographicRecord for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn item_type(&self) -> &str {
        &self.item_type
    }

    fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn creators(&self) -> Vec<CreatorEntry> {
        self.creators.iter().map(CreatorEntry::from).collect()
    }

    fn tags(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name().to_string()).collect()
    }

    fn extra_field(&self, key: &str) -> Option<String> {
        self.extra_fields.get(key).cloned()
    }

    fn library_name(&self) -> Option<String> {
        self.library_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_json() {
        let json = r#"{
            "id": 42,
            "itemType": "journalArticle",
            "title": "On Computable Numbers",
            "date": "1936",
            "volume": 2,
            "creators": [
                {"creatorType": "author", "firstName": "Alan", "lastName": "Turing"},
                {"creatorType": "editor", "name": "London Mathematical Society"}
            ],
            "tags": [{"tag": "computability"}, "logic"],
            "extraFields": {"original-date": "1935"}
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();

        assert_eq!(item.id(), "42");
        assert_eq!(item.item_type(), "journalArticle");
        assert_eq!(item.title().as_deref(), Some("On Computable Numbers"));
        assert_eq!(item.field("volume").as_deref(), Some("2"));
        assert_eq!(item.field("publisher"), None);
        assert_eq!(item.tags(), vec!["computability", "logic"]);
        assert_eq!(item.extra_field("original-date").as_deref(), Some("1935"));

        let creators = item.creators();
        assert_eq!(creators[0], CreatorEntry::new("author", "Turing", "Alan"));
        assert_eq!(
            creators[1],
            CreatorEntry::literal("editor", "London Mathematical Society")
        );
    }

    #[test]
    fn test_creator_type_defaults_to_author() {
        let creator: Creator = serde_json::from_str(r#"{"lastName": "Lovelace"}"#).unwrap();
        assert_eq!(creator.creator_type, "author");
    }

    #[test]
    fn test_library_name_defaults_to_personal() {
        let item = Item::new("1", "book");
        assert_eq!(item.library_name(), None);
        assert_eq!(item.journal_abbreviation(), None);
    }
}
