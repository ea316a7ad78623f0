/*
 * scenarios.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end key generation through the public API.
 */

use citekey_core::{
    FormatterConfig, Generator, Item, KeyGenerator, MemoryStore, RecordContext, compile,
};
use pretty_assertions::assert_eq;

fn keys_for(pattern: &str, config: FormatterConfig) -> KeyGenerator {
    let mut store = MemoryStore::with_pattern(pattern);
    KeyGenerator::load(config, &mut store)
}

fn raw(generator: &Generator, item: &Item) -> String {
    generator.generate(&RecordContext::new(item))
}

fn four_authors() -> Item {
    Item::new("4", "journalArticle")
        .with_creator("author", "Smith", "Ann")
        .with_creator("author", "Jones", "Bob")
        .with_creator("author", "Lee", "Cy")
        .with_creator("author", "Park", "Di")
}

#[test]
fn test_author_and_year() {
    let turing = Item::new("1", "journalArticle")
        .with_field("date", "1950")
        .with_creator("author", "Turing", "Alan");
    let keys = keys_for("[auth][year]", FormatterConfig::default());
    assert_eq!(keys.generate(&turing), "Turing1950");
}

#[test]
fn test_word_selection_on_creator_list() {
    let generator = compile("[authors:lower:select=1,3]", &FormatterConfig::default()).unwrap();
    assert_eq!(raw(&generator, &four_authors()), "smith jones lee");
}

#[test]
fn test_empty_key_falls_back_to_record_id() {
    let bare = Item::new("ABCD1234", "document");
    let keys = keys_for("[auth][year]", FormatterConfig::default());
    assert_eq!(keys.generate(&bare), "record-ABCD1234");
}

#[test]
fn test_short_title_skips_stop_words() {
    let config = FormatterConfig {
        skip_words: "the".to_string(),
        ..FormatterConfig::default()
    };
    let item = Item::new("5", "book").with_field("title", "the quick BROWN fox");

    let generator = compile("[shorttitle:3]", &config).unwrap();
    assert_eq!(raw(&generator, &item), "quick BROWN fox");

    let keys = keys_for("[shorttitle:3]", config);
    assert_eq!(keys.generate(&item), "quickBROWNfox");
}

#[test]
fn test_global_folding_uses_language_profile() {
    let config = FormatterConfig {
        citekey_fold: true,
        ..FormatterConfig::default()
    };
    let keys = keys_for("[auth]", config);

    let german = Item::new("6", "book")
        .with_field("language", "de")
        .with_creator("author", "Müller", "Hans");
    assert_eq!(keys.generate(&german), "Mueller");

    let unknown = Item::new("7", "book").with_creator("author", "Müller", "Hans");
    assert_eq!(keys.generate(&unknown), "Muller");
}

#[test]
fn test_editor_prefix_and_capitalized_names() {
    let item = Item::new("8", "book")
        .with_field("title", "gödel escher bach")
        .with_creator("author", "Hofstadter", "Douglas")
        .with_creator("editor", "Nagel", "Ernest");
    let config = FormatterConfig::default();

    let generator = compile("[edtr]-[auth.etal]-[Title]", &config).unwrap();
    assert_eq!(raw(&generator, &item), "Nagel-Hofstadter-Godel Escher Bach");
}

#[test]
fn test_field_name_fallback() {
    let item = Item::new("9", "book").with_field("publisher", "Addison Wesley");
    let generator = compile("[publisher:abbr:condense]", &FormatterConfig::default()).unwrap();
    assert_eq!(raw(&generator, &item), "AW");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_generation_is_deterministic() {
    let keys = keys_for(
        "[auth:lower][shorttitle3_3][year]",
        FormatterConfig::default(),
    );
    let item = four_authors()
        .with_field("title", "A Study of Things")
        .with_field("date", "2020-02-02");
    let first = keys.generate(&item);
    for _ in 0..10 {
        assert_eq!(keys.generate(&item), first);
    }
}

#[test]
fn test_upper_after_lower_matches_upper() {
    let config = FormatterConfig::default();
    let both = compile("[title:lower:upper]", &config).unwrap();
    let upper = compile("[title:upper]", &config).unwrap();
    for title in ["Gödel, Escher, Bach", "the ÆSIR saga", "mixed CaSe Words"] {
        let item = Item::new("p", "book").with_field("title", title);
        assert_eq!(raw(&both, &item), raw(&upper, &item), "{}", title);
    }
}

#[test]
fn test_capitalize_is_idempotent_on_ascii() {
    let config = FormatterConfig::default();
    let once = compile("[title:capitalize]", &config).unwrap();
    let twice = compile("[title:capitalize:capitalize]", &config).unwrap();
    let item = Item::new("c", "book").with_field("title", "structure and interpretation");
    assert_eq!(raw(&once, &item), "Structure Interpretation");
    assert_eq!(raw(&twice, &item), raw(&once, &item));
}

#[test]
fn test_extreme_integer_arguments_do_not_fail_generation() {
    let item = four_authors().with_field("date", "2001");
    for pattern in [
        "[auth:substring=9223372036854775807,9223372036854775807][year]",
        "[auth:select=-9223372036854775808][year]",
        "[auth=0,-9223372036854775808][year]",
        "[authors=-9223372036854775808][year]",
        "[shorttitle=9223372036854775807,9223372036854775807][year]",
    ] {
        let keys = keys_for(pattern, FormatterConfig::default());
        assert_eq!(keys.pattern(), pattern);
        assert!(keys.generate(&item).ends_with("2001"), "{}", pattern);
    }
}
