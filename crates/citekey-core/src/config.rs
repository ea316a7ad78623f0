/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Formatter configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pattern used when nothing else compiles.
pub const BUILTIN_PATTERN: &str = "[auth:lower][shorttitle3_3][year]";

/// Leading marker that earlier versions put in front of a freshly installed
/// pattern.
pub const FIRST_RUN_MARKER: char = '\u{200B}';

pub const DEFAULT_SKIP_WORDS: &str = "a,ab,aboard,about,above,across,after,against,al,along,\
amid,among,an,and,anti,around,as,at,before,behind,below,beneath,beside,besides,between,\
beyond,but,by,d,da,das,de,del,dell,dello,dei,degli,della,dell,delle,dem,den,der,des,\
despite,die,do,down,du,during,ein,eine,einem,einen,einer,eines,el,en,et,except,for,from,\
gli,i,il,in,inside,into,is,l,la,las,le,les,like,lo,los,near,nor,of,off,on,onto,or,over,\
past,per,plus,round,save,since,so,some,sur,than,the,through,to,toward,towards,un,una,\
unas,under,underneath,une,unlike,uno,unos,until,up,upon,versus,via,von,while,with,\
within,without,yet,zu,zum";

const DEFAULT_FIELD_NAMES: &[&str] = &[
    "abstractNote",
    "accessDate",
    "applicationNumber",
    "archive",
    "archiveLocation",
    "artworkMedium",
    "artworkSize",
    "assignee",
    "billNumber",
    "blogTitle",
    "bookTitle",
    "callNumber",
    "caseName",
    "code",
    "codeNumber",
    "codePages",
    "codeVolume",
    "committee",
    "company",
    "conferenceName",
    "country",
    "court",
    "dateDecided",
    "dateEnacted",
    "dictionaryTitle",
    "distributor",
    "docketNumber",
    "documentNumber",
    "DOI",
    "edition",
    "encyclopediaTitle",
    "episodeNumber",
    "extra",
    "filingDate",
    "firstPage",
    "forumTitle",
    "genre",
    "history",
    "institution",
    "interviewMedium",
    "ISBN",
    "ISSN",
    "issue",
    "issueDate",
    "issuingAuthority",
    "journalAbbreviation",
    "label",
    "language",
    "legalStatus",
    "legislativeBody",
    "letterType",
    "libraryCatalog",
    "manuscriptType",
    "mapType",
    "medium",
    "meetingName",
    "nameOfAct",
    "network",
    "number",
    "numberOfVolumes",
    "numPages",
    "pages",
    "patentNumber",
    "place",
    "postType",
    "presentationType",
    "priorityNumbers",
    "proceedingsTitle",
    "programmingLanguage",
    "programTitle",
    "publicationTitle",
    "publicLawNumber",
    "publisher",
    "references",
    "reportNumber",
    "reportType",
    "reporter",
    "reporterVolume",
    "rights",
    "runningTime",
    "scale",
    "section",
    "series",
    "seriesNumber",
    "seriesText",
    "seriesTitle",
    "session",
    "shortTitle",
    "studio",
    "subject",
    "system",
    "thesisType",
    "type",
    "university",
    "url",
    "versionNumber",
    "websiteTitle",
    "websiteType",
];

/// Settings that shape how patterns compile and how keys are sanitized.
///
/// Changing any of these requires recompiling the active pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormatterConfig {
    /// Comma-separated stop words dropped from titles.
    pub skip_words: String,

    /// Transliterate every generated key to ASCII.
    pub citekey_fold: bool,

    /// Pattern persisted when the stored one is absent or unsalvageable.
    pub default_pattern: String,

    /// Record fields reachable by bare name, e.g. `[publisher]`.
    pub field_names: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            skip_words: DEFAULT_SKIP_WORDS.to_string(),
            citekey_fold: false,
            default_pattern: BUILTIN_PATTERN.to_string(),
            field_names: DEFAULT_FIELD_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FormatterConfig {
    pub fn skip_words(&self) -> SkipWords {
        SkipWords::from_list(&self.skip_words)
    }

    /// Canonical spelling of a configured field name, matched
    /// case-insensitively.
    pub fn field_name(&self, name: &str) -> Option<&str> {
        self.field_names
            .iter()
            .find(|f| f.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

/// Stop-word set, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipWords(HashSet<String>);

impl SkipWords {
    pub fn from_list(list: &str) -> Self {
        Self(
            list.split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormatterConfig::default();
        assert_eq!(config.default_pattern, BUILTIN_PATTERN);
        assert!(!config.citekey_fold);
        assert!(config.skip_words().contains("the"));
        assert!(config.skip_words().contains("zum"));
        assert_eq!(config.field_name("doi"), Some("DOI"));
        assert_eq!(config.field_name("title"), None);
    }

    #[test]
    fn test_skip_words_are_case_insensitive() {
        let words = SkipWords::from_list(" The, of ,,AND");
        assert_eq!(words.len(), 3);
        assert!(words.contains("the"));
        assert!(words.contains("THE"));
        assert!(words.contains("and"));
        assert!(!words.contains("fox"));
    }

    #[test]
    fn test_deserialize_kebab_case_with_defaults() {
        let config: FormatterConfig =
            serde_json::from_str(r#"{"citekey-fold": true, "skip-words": "the"}"#).unwrap();
        assert!(config.citekey_fold);
        assert_eq!(config.skip_words().len(), 1);
        assert_eq!(config.default_pattern, BUILTIN_PATTERN);
        assert!(config.field_name("publisher").is_some());
    }
}
