/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-generation view of one record.
//!
//! A [`RecordContext`] is built fresh for every key generation. Everything
//! that several functions read (creators, tags, title words) is derived on
//! first use and memoized for the rest of that call only.

use crate::config::SkipWords;
use crate::date::PartialDate;
use crate::record::{BibliographicRecord, CreatorEntry};
use crate::text::{
    LanguageProfile, clean, contains_han, inner_text, remove_non_ascii, strip_quotes,
    transliterate, words,
};
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;

static NOT_UPPER_OR_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{Lu}\p{Lt}]").unwrap());
static NOT_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{Lu}]").unwrap());

/// Marker some imports leave between a compound initial and the rest of the
/// given name.
const INITIAL_SEPARATOR: char = '\u{0097}';

/// How each creator's name is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    LastName,
    WithInitials,
    InitialOnly,
}

impl NameStyle {
    fn index(self) -> usize {
        match self {
            NameStyle::LastName => 0,
            NameStyle::WithInitials => 1,
            NameStyle::InitialOnly => 2,
        }
    }
}

/// Creator names partitioned by role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorLists {
    pub authors: Vec<String>,
    pub editors: Vec<String>,
    pub translators: Vec<String>,
    pub collaborators: Vec<String>,
}

/// Creator type that counts as "author" for a record type.
pub fn primary_creator_type(item_type: &str) -> &'static str {
    match item_type {
        "artwork" => "artist",
        "computerProgram" => "programmer",
        "film" | "videoRecording" | "tvBroadcast" | "radioBroadcast" => "director",
        "interview" => "interviewee",
        "patent" => "inventor",
        "presentation" => "presenter",
        "podcast" => "podcaster",
        "audioRecording" => "performer",
        "bill" => "sponsor",
        _ => "author",
    }
}

pub struct RecordContext<'a> {
    record: &'a dyn BibliographicRecord,
    language: Option<LanguageProfile>,
    date: PartialDate,
    title: String,
    pages: String,
    tags: OnceCell<Vec<String>>,
    creators: [OnceCell<CreatorLists>; 3],
    title_words: OnceCell<Vec<String>>,
    short_title_words: OnceCell<Vec<String>>,
}

impl<'a> RecordContext<'a> {
    pub fn new(record: &'a dyn BibliographicRecord) -> Self {
        let language = record
            .language()
            .and_then(|tag| LanguageProfile::from_tag(tag.trim()));

        let mut date = PartialDate::parse(&record.date().unwrap_or_default());
        let original = record
            .extra_field("original-date")
            .or_else(|| record.extra_field("priorityDate"));
        if let Some(original) = original {
            date.set_original(&PartialDate::parse(&original));
        }

        let title = record.title().unwrap_or_default();
        let title = if title.contains('<') {
            inner_text(&title)
        } else {
            title
        };

        RecordContext {
            record,
            language,
            date,
            title,
            pages: record.pages().unwrap_or_default(),
            tags: OnceCell::new(),
            creators: [OnceCell::new(), OnceCell::new(), OnceCell::new()],
            title_words: OnceCell::new(),
            short_title_words: OnceCell::new(),
        }
    }

    pub fn record(&self) -> &'a dyn BibliographicRecord {
        self.record
    }

    pub fn language(&self) -> Option<LanguageProfile> {
        self.language
    }

    pub fn date(&self) -> &PartialDate {
        &self.date
    }

    /// Plain-text title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &str {
        &self.pages
    }

    /// Tags sorted case-insensitively.
    pub fn tags(&self) -> &[String] {
        self.tags.get_or_init(|| {
            let mut tags = self.record.tags();
            tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
            tags
        })
    }

    pub fn creator_lists(&self, style: NameStyle) -> &CreatorLists {
        self.creators[style.index()].get_or_init(|| self.partition_creators(style))
    }

    /// The creators a creator function works on: editors only when asked,
    /// otherwise the first non-empty role list.
    pub fn creators(&self, only_editors: bool, style: NameStyle) -> &[String] {
        let lists = self.creator_lists(style);
        if only_editors {
            return &lists.editors;
        }
        [
            &lists.authors,
            &lists.editors,
            &lists.translators,
            &lists.collaborators,
        ]
        .into_iter()
        .find(|list| !list.is_empty())
        .map_or(&[][..], |list| list.as_slice())
    }

    /// Title words after stop-word filtering, optionally restricted to ASCII.
    pub fn title_words(&self, skip_words: &SkipWords, ascii_only: bool) -> &[String] {
        let cell = if ascii_only {
            &self.short_title_words
        } else {
            &self.title_words
        };
        cell.get_or_init(|| title_words(&self.title, skip_words, ascii_only, self.language))
    }

    fn partition_creators(&self, style: NameStyle) -> CreatorLists {
        let primary = primary_creator_type(self.record.item_type());
        let mut lists = CreatorLists::default();
        for creator in self.record.creators() {
            let name = creator_name(&creator, style, self.language);
            if name.is_empty() {
                continue;
            }
            match creator.role.as_str() {
                "editor" | "seriesEditor" => lists.editors.push(name),
                "translator" => lists.translators.push(name),
                role if role == primary => lists.authors.push(name),
                _ => lists.collaborators.push(name),
            }
        }
        lists
    }
}

fn initial(creator: &CreatorEntry, language: Option<LanguageProfile>) -> String {
    let first_name = creator.first_name.as_str();
    let initial = match first_name.split_once(INITIAL_SEPARATOR) {
        Some((compound, _)) => compound.to_string(),
        None => first_name.chars().next().map(String::from).unwrap_or_default(),
    };
    transliterate(&initial, language)
}

fn creator_name(
    creator: &CreatorEntry,
    style: NameStyle,
    language: Option<LanguageProfile>,
) -> String {
    let mut name = match style {
        NameStyle::InitialOnly => initial(creator, language),
        _ => strip_quotes(&inner_text(&creator.last_name)).to_string(),
    };

    if name.is_empty() {
        return strip_quotes(&inner_text(&creator.first_name)).to_string();
    }

    if style == NameStyle::WithInitials && !creator.first_name.is_empty() {
        let initials = NOT_UPPER_OR_TITLE.replace_all(strip_quotes(&creator.first_name), "");
        let initials = transliterate(&initials, language);
        name.push_str(&NOT_UPPER.replace_all(&initials, ""));
    }
    name
}

/// Tokenize a title into cleaned words.
///
/// Words that are stop words or a single character are dropped, except that
/// words containing Han ideographs are always kept.
pub(crate) fn title_words(
    title: &str,
    skip_words: &SkipWords,
    ascii_only: bool,
    language: Option<LanguageProfile>,
) -> Vec<String> {
    let title = inner_text(title);
    words(&title)
        .map(|word| clean(word, language).replace('-', ""))
        .map(|word| {
            if ascii_only {
                remove_non_ascii(&word)
            } else {
                word
            }
        })
        .filter(|word| !word.is_empty())
        .filter(|word| {
            (!skip_words.contains(word) && word.chars().count() > 1) || contains_han(word)
        })
        .collect()
}
