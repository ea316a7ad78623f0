/*
 * functions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Function catalog.
//!
//! A [`Function`] is a catalog entry with its arguments already bound and
//! validated. Evaluating one reads the [`RecordContext`] and never fails:
//! missing data becomes an empty string.

use crate::catalog::{BoundArgs, FunctionSpec};
use crate::config::SkipWords;
use crate::context::{NameStyle, RecordContext};
use crate::date::{format_date, month_abbreviation, pad_year, validate_format};
use crate::error::{CompileError, CompileResult};
use crate::text::{
    WHITESPACE_RUN, inner_text, prefix_chars, slice_range, transliterate, uppercase_first,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static PAGE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s,\u{2013}]").unwrap());

static STOCK_KEY_STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:a|an|the|some|from|on|in|to|of|do|with|der|die|das|ein|eine|einer|eines|einem|einen|un|une|la|le|l'|el|las|los|al|uno|una|unos|unas|de|des|del|d')(?:\s+|\b)",
    )
    .unwrap()
});

static STOCK_KEY_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9!$&*+\-./:;<>?\[\]^_`|]+").unwrap());

/// Which creators a creator function reads, and how their names look.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatorSelection {
    /// Only editors, selected by an `edtr`/`editors` name prefix.
    pub only_editors: bool,
    /// Append given-name initials, selected by `+initials`.
    pub with_initials: bool,
}

impl CreatorSelection {
    fn names<'c>(&self, ctx: &'c RecordContext<'_>) -> &'c [String] {
        let style = if self.with_initials {
            NameStyle::WithInitials
        } else {
            NameStyle::LastName
        };
        ctx.creators(self.only_editors, style)
    }
}

/// A resolved function with bound arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Auth {
        select: CreatorSelection,
        n: Option<i64>,
        m: Option<i64>,
    },
    Authors {
        select: CreatorSelection,
        n: Option<i64>,
        joiner: String,
    },
    AuthorsAlpha {
        select: CreatorSelection,
        joiner: String,
    },
    AuthIni {
        select: CreatorSelection,
        n: Option<i64>,
        joiner: String,
    },
    AuthorIni {
        select: CreatorSelection,
        joiner: String,
    },
    AuthAuthEa {
        select: CreatorSelection,
        joiner: String,
    },
    AuthEtAl {
        select: CreatorSelection,
        joiner: String,
    },
    AuthEtal {
        select: CreatorSelection,
        joiner: String,
    },
    AuthShort {
        select: CreatorSelection,
        joiner: String,
    },
    AuthorLast {
        select: CreatorSelection,
    },
    AuthForeIni {
        only_editors: bool,
    },
    AuthorLastForeIni {
        only_editors: bool,
    },
    Year,
    ShortYear,
    OrigYear,
    Date {
        format: String,
    },
    OrigDate,
    Month,
    ShortTitle {
        n: i64,
        m: i64,
    },
    Title,
    Journal,
    FirstPage,
    LastPage,
    Keyword {
        n: i64,
    },
    Library,
    Property {
        name: String,
    },
    Zotero,
}

impl Function {
    /// Instantiate the catalog entry `spec` with already-bound arguments.
    pub(crate) fn bind(
        spec: &FunctionSpec,
        args: &BoundArgs,
        select: CreatorSelection,
        span: &Range<usize>,
    ) -> CompileResult<Function> {
        let joiner = |i: usize| args.text(i).unwrap_or_default().to_string();
        let function = match spec.name {
            "auth" => Function::Auth {
                select,
                n: args.integer(0),
                m: args.integer(1),
            },
            "authors" => Function::Authors {
                select,
                n: args.integer(0),
                joiner: joiner(1),
            },
            "authorsAlpha" => Function::AuthorsAlpha {
                select,
                joiner: joiner(0),
            },
            "authIni" => Function::AuthIni {
                select,
                n: args.integer(0),
                joiner: joiner(1),
            },
            "authorIni" => Function::AuthorIni {
                select,
                joiner: joiner(0),
            },
            "auth_auth_ea" => Function::AuthAuthEa {
                select,
                joiner: joiner(0),
            },
            "authEtAl" => Function::AuthEtAl {
                select,
                joiner: joiner(0),
            },
            "auth_etal" => Function::AuthEtal {
                select,
                joiner: joiner(0),
            },
            "authshort" => Function::AuthShort {
                select,
                joiner: joiner(0),
            },
            "authorLast" => Function::AuthorLast { select },
            "authForeIni" => Function::AuthForeIni {
                only_editors: select.only_editors,
            },
            "authorLastForeIni" => Function::AuthorLastForeIni {
                only_editors: select.only_editors,
            },
            "year" => Function::Year,
            "shortyear" => Function::ShortYear,
            "origyear" => Function::OrigYear,
            "date" => {
                let format = args.text(0).unwrap_or_default().to_string();
                validate_format(&format).map_err(|e| CompileError::InvalidArguments {
                    name: spec.name.to_string(),
                    message: e.to_string(),
                    span: span.clone(),
                })?;
                Function::Date { format }
            }
            "origdate" => Function::OrigDate,
            "month" => Function::Month,
            "shorttitle" | "veryshorttitle" => Function::ShortTitle {
                n: args.integer(0).unwrap_or_default(),
                m: args.integer(1).unwrap_or_default(),
            },
            "title" => Function::Title,
            "journal" => Function::Journal,
            "firstpage" => Function::FirstPage,
            "lastpage" => Function::LastPage,
            "keyword" => Function::Keyword {
                n: args.integer(0).unwrap_or_default(),
            },
            "library" => Function::Library,
            "property" => Function::Property {
                name: args.text(0).unwrap_or_default().to_string(),
            },
            "zotero" => Function::Zotero,
            other => {
                return Err(CompileError::UnknownFunction {
                    name: other.to_string(),
                    span: span.clone(),
                });
            }
        };
        Ok(function)
    }

    /// Evaluate against one record.
    pub fn evaluate(&self, ctx: &RecordContext<'_>, skip_words: &SkipWords) -> String {
        match self {
            Function::Auth { select, n, m } => {
                let index = match m {
                    Some(m) if *m != 0 => m.saturating_sub(1),
                    _ => 0,
                };
                let names = select.names(ctx);
                let Some(author) = usize::try_from(index).ok().and_then(|i| names.get(i)) else {
                    return String::new();
                };
                truncate(author, *n)
            }
            Function::Authors { select, n, joiner } => {
                let names = select.names(ctx);
                if names.is_empty() {
                    return String::new();
                }
                let mut selected: Vec<&str> = match n {
                    Some(n) if *n != 0 => names[slice_range(names.len(), 0, Some(*n))]
                        .iter()
                        .map(String::as_str)
                        .collect(),
                    _ => names.iter().map(String::as_str).collect(),
                };
                if n.is_some_and(|n| n != 0 && (names.len() as i64) > n) {
                    selected.push("EtAl");
                }
                selected.join(joiner)
            }
            Function::AuthorsAlpha { select, joiner } => {
                let names = select.names(ctx);
                match names.len() {
                    0 => String::new(),
                    1 => prefix_chars(&names[0], 3),
                    2..=4 => join_initials(names, joiner),
                    _ => join_initials(&names[..3], joiner) + "+",
                }
            }
            Function::AuthIni { select, n, joiner } => select
                .names(ctx)
                .iter()
                .map(|name| match n {
                    Some(n) => prefix_chars(name, (*n).max(0) as usize),
                    None => name.clone(),
                })
                .collect::<Vec<_>>()
                .join(joiner),
            Function::AuthorIni { select, joiner } => {
                let names = select.names(ctx);
                let Some((first, rest)) = names.split_first() else {
                    return String::new();
                };
                std::iter::once(prefix_chars(first, 5))
                    .chain(rest.iter().map(|name| prefix_chars(name, 1)))
                    .collect::<Vec<_>>()
                    .join(joiner)
            }
            Function::AuthAuthEa { select, joiner } => {
                let names = select.names(ctx);
                let mut selected: Vec<&str> = names.iter().take(2).map(String::as_str).collect();
                if names.len() > 2 {
                    selected.push("ea");
                }
                selected.join(joiner)
            }
            Function::AuthEtAl { select, joiner } => et_al(select.names(ctx), joiner, "EtAl"),
            Function::AuthEtal { select, joiner } => et_al(select.names(ctx), joiner, "etal"),
            Function::AuthShort { select, joiner } => {
                let names = select.names(ctx);
                match names.len() {
                    0 => String::new(),
                    1 => names[0].clone(),
                    len => {
                        let initials = join_initials(&names[..len.min(3)], joiner);
                        if len > 3 { initials + "+" } else { initials }
                    }
                }
            }
            Function::AuthorLast { select } => {
                select.names(ctx).last().cloned().unwrap_or_default()
            }
            Function::AuthForeIni { only_editors } => ctx
                .creators(*only_editors, NameStyle::InitialOnly)
                .first()
                .cloned()
                .unwrap_or_default(),
            Function::AuthorLastForeIni { only_editors } => ctx
                .creators(*only_editors, NameStyle::InitialOnly)
                .last()
                .cloned()
                .unwrap_or_default(),
            Function::Year => pad_year(&fixed_format(ctx, "%-Y"), 2),
            Function::ShortYear => fixed_format(ctx, "%y"),
            Function::OrigYear => pad_year(&fixed_format(ctx, "%-oY"), 2),
            Function::Date { format } => fixed_format(ctx, format),
            Function::OrigDate => fixed_format(ctx, "%oY-%om-%od"),
            Function::Month => month_abbreviation(&ctx.date().month).to_string(),
            Function::ShortTitle { n, m } => {
                let words = ctx.title_words(skip_words, true);
                words[slice_range(words.len(), 0, Some(*n))]
                    .iter()
                    .enumerate()
                    .map(|(i, word)| {
                        if (i as i64) < *m {
                            uppercase_first(word)
                        } else {
                            word.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            Function::Title => ctx.title_words(skip_words, false).join(" "),
            Function::Journal => {
                let record = ctx.record();
                record
                    .journal_abbreviation()
                    .filter(|abbr| !abbr.is_empty())
                    .or_else(|| record.field("publicationTitle"))
                    .unwrap_or_default()
            }
            Function::FirstPage => PAGE_SEPARATOR
                .split(ctx.pages())
                .next()
                .unwrap_or_default()
                .to_string(),
            Function::LastPage => PAGE_SEPARATOR
                .split(ctx.pages())
                .last()
                .unwrap_or_default()
                .to_string(),
            Function::Keyword { n } => usize::try_from(*n)
                .ok()
                .and_then(|i| ctx.tags().get(i))
                .cloned()
                .unwrap_or_default(),
            Function::Library => ctx.record().library_name().unwrap_or_default(),
            Function::Property { name } => property(ctx, name),
            Function::Zotero => stock_key(ctx),
        }
    }
}

fn truncate(name: &str, n: Option<i64>) -> String {
    match n {
        Some(n) if n != 0 => prefix_chars(name, n.max(0) as usize),
        _ => name.to_string(),
    }
}

fn join_initials(names: &[String], joiner: &str) -> String {
    names
        .iter()
        .map(|name| prefix_chars(name, 1))
        .collect::<Vec<_>>()
        .join(joiner)
}

fn et_al(names: &[String], joiner: &str, marker: &str) -> String {
    match names {
        [] => String::new(),
        [first, second] => format!("{first}{joiner}{second}"),
        [first] => first.clone(),
        [first, ..] => format!("{first}{joiner}{marker}"),
    }
}

fn fixed_format(ctx: &RecordContext<'_>, format: &str) -> String {
    format_date(ctx.date(), format).unwrap_or_default()
}

fn property(ctx: &RecordContext<'_>, name: &str) -> String {
    let record = ctx.record();
    if let Some(value) = record.field(name) {
        return inner_text(&value);
    }
    let mut chars = name.chars();
    let lowered: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => return String::new(),
    };
    record
        .field(&lowered)
        .map(|value| inner_text(&value))
        .unwrap_or_default()
}

/// `lastname_firstword_year` as the reference manager builds it.
fn stock_key(ctx: &RecordContext<'_>) -> String {
    let record = ctx.record();

    let author = record
        .creators()
        .first()
        .filter(|c| !c.last_name.is_empty())
        .map(|c| c.last_name.to_lowercase().replace(' ', "_").replace(',', ""))
        .unwrap_or_else(|| "noauthor".to_string());

    let title = record
        .title()
        .filter(|t| !t.is_empty())
        .map(|t| {
            let lowered = t.to_lowercase();
            let stripped = STOCK_KEY_STOP_WORDS.replace_all(&lowered, "");
            WHITESPACE_RUN
                .split(&stripped)
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_else(|| "notitle".to_string());

    let year = &ctx.date().year;
    let year = if !year.is_empty() && year.chars().all(|c| c.is_ascii_digit()) {
        year.as_str()
    } else {
        "nodate"
    };

    let key = transliterate(&format!("{author}_{title}_{year}"), None);
    STOCK_KEY_UNSAFE.replace_all(&key, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::record::Item;
    use pretty_assertions::assert_eq;

    fn call(name: &str, args: &[&str], select: CreatorSelection, item: &Item) -> String {
        let spec = catalog::function(name).unwrap();
        let args: Vec<crate::ast::Argument> = args
            .iter()
            .map(|v| crate::ast::Argument {
                value: v.to_string(),
                span: 0..0,
            })
            .collect();
        let bound = catalog::bind(name, spec.params, &args, &(0..0)).unwrap();
        let function = Function::bind(spec, &bound, select, &(0..0)).unwrap();
        let ctx = RecordContext::new(item);
        function.evaluate(&ctx, &SkipWords::from_list("the,of,a,on"))
    }

    fn plain(name: &str, args: &[&str], item: &Item) -> String {
        call(name, args, CreatorSelection::default(), item)
    }

    fn with_authors(names: &[&str]) -> Item {
        names.iter().fold(Item::new("1", "journalArticle"), |item, name| {
            item.with_creator("author", name, "")
        })
    }

    // ========================================================================
    // Creator functions
    // ========================================================================

    #[test]
    fn test_auth() {
        let item = with_authors(&["Turing", "Church"]);
        assert_eq!(plain("auth", &[], &item), "Turing");
        assert_eq!(plain("auth", &["3"], &item), "Tur");
        assert_eq!(plain("auth", &["0", "2"], &item), "Church");
        assert_eq!(plain("auth", &["0", "3"], &item), "");
        assert_eq!(plain("auth", &[], &Item::new("2", "book")), "");
        assert_eq!(plain("auth", &["0", &i64::MIN.to_string()], &item), "");
        assert_eq!(plain("auth", &["0", &i64::MAX.to_string()], &item), "");
    }

    #[test]
    fn test_authors() {
        let item = with_authors(&["Smith", "Jones", "Lee", "Park"]);
        assert_eq!(plain("authors", &[], &item), "Smith Jones Lee Park");
        assert_eq!(plain("authors", &["2"], &item), "Smith Jones EtAl");
        assert_eq!(plain("authors", &["4", "-"], &item), "Smith-Jones-Lee-Park");
    }

    #[test]
    fn test_authors_alpha() {
        assert_eq!(plain("authorsAlpha", &[], &with_authors(&["Knuth"])), "Knu");
        assert_eq!(
            plain("authorsAlpha", &[], &with_authors(&["Aho", "Sethi", "Ullman"])),
            "A S U"
        );
        assert_eq!(
            plain("authorsAlpha", &[""], &with_authors(&["A", "B", "C", "D", "E"])),
            "ABC+"
        );
    }

    #[test]
    fn test_auth_ini_and_author_ini() {
        let item = with_authors(&["Abelson", "Sussman", "Sussman"]);
        assert_eq!(plain("authIni", &["2"], &item), "Ab.Su.Su");
        assert_eq!(plain("authIni", &[], &item), "Abelson.Sussman.Sussman");
        assert_eq!(plain("authorIni", &[], &item), "Abels.S.S");
    }

    #[test]
    fn test_et_al_variants() {
        let two = with_authors(&["Kernighan", "Ritchie"]);
        let three = with_authors(&["Aho", "Sethi", "Ullman"]);
        let one = with_authors(&["Knuth"]);

        assert_eq!(plain("auth_auth_ea", &[], &two), "Kernighan.Ritchie");
        assert_eq!(plain("auth_auth_ea", &[], &three), "Aho.Sethi.ea");
        assert_eq!(plain("authEtAl", &[], &two), "Kernighan Ritchie");
        assert_eq!(plain("authEtAl", &[], &three), "Aho EtAl");
        assert_eq!(plain("authEtAl", &[], &one), "Knuth");
        assert_eq!(plain("auth_etal", &[], &three), "Aho.etal");
        assert_eq!(plain("auth_etal", &["_"], &two), "Kernighan_Ritchie");
    }

    #[test]
    fn test_authshort() {
        assert_eq!(plain("authshort", &[], &with_authors(&["Knuth"])), "Knuth");
        assert_eq!(
            plain("authshort", &[], &with_authors(&["Aho", "Sethi", "Ullman"])),
            "A.S.U"
        );
        assert_eq!(
            plain("authshort", &[], &with_authors(&["Aho", "Sethi", "Ullman", "Lam"])),
            "A.S.U+"
        );
    }

    #[test]
    fn test_last_and_initial_functions() {
        let item = Item::new("1", "book")
            .with_creator("author", "Aho", "Alfred")
            .with_creator("author", "Ullman", "Jeffrey")
            .with_creator("editor", "Lam", "Monica");
        assert_eq!(plain("authorLast", &[], &item), "Ullman");
        assert_eq!(plain("authForeIni", &[], &item), "A");
        assert_eq!(plain("authorLastForeIni", &[], &item), "J");

        let editors = CreatorSelection {
            only_editors: true,
            with_initials: false,
        };
        assert_eq!(call("auth", &[], editors, &item), "Lam");
        let initials = CreatorSelection {
            only_editors: false,
            with_initials: true,
        };
        assert_eq!(call("auth", &[], initials, &item), "AhoA");
    }

    // ========================================================================
    // Dates
    // ========================================================================

    #[test]
    fn test_date_functions() {
        let item = Item::new("1", "book")
            .with_field("date", "2003-04-05")
            .with_extra_field("original-date", "1867");
        assert_eq!(plain("year", &[], &item), "2003");
        assert_eq!(plain("shortyear", &[], &item), "03");
        assert_eq!(plain("origyear", &[], &item), "1867");
        assert_eq!(plain("date", &[], &item), "2003-04-05");
        assert_eq!(plain("date", &["%-d.%-m.%Y"], &item), "5.4.2003");
        assert_eq!(plain("origdate", &[], &item), "1867");
        assert_eq!(plain("month", &[], &item), "apr");

        let undated = Item::new("2", "book");
        assert_eq!(plain("year", &[], &undated), "");
        assert_eq!(plain("month", &[], &undated), "");
    }

    #[test]
    fn test_year_pads_to_two_digits() {
        let item = Item::new("1", "book").with_field("date", "0950-01-01");
        assert_eq!(plain("year", &[], &item), "950");
        let item = Item::new("1", "book").with_field("date", "-5");
        assert_eq!(plain("year", &[], &item), "");
    }

    #[test]
    fn test_date_rejects_unknown_format_field() {
        let spec = catalog::function("date").unwrap();
        let args = vec![crate::ast::Argument {
            value: "%Y-%q".to_string(),
            span: 0..0,
        }];
        let bound = catalog::bind("date", spec.params, &args, &(0..0)).unwrap();
        let err = Function::bind(spec, &bound, CreatorSelection::default(), &(3..7)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArguments { .. }));
    }

    // ========================================================================
    // Titles and fields
    // ========================================================================

    #[test]
    fn test_shorttitle() {
        let item = Item::new("1", "book").with_field("title", "The Art of Computer Programming");
        assert_eq!(plain("shorttitle", &[], &item), "Art Computer Programming");
        assert_eq!(plain("shorttitle", &["2", "1"], &item), "Art Computer");
        assert_eq!(plain("veryshorttitle", &[], &item), "Art");
        assert_eq!(plain("title", &[], &item), "Art Computer Programming");

        let item = Item::new("1", "book").with_field("title", "the quick brown fox");
        assert_eq!(plain("shorttitle", &["3", "3"], &item), "Quick Brown Fox");
    }

    #[test]
    fn test_pages() {
        let item = Item::new("1", "journalArticle").with_field("pages", "7,41,73--97");
        assert_eq!(plain("firstpage", &[], &item), "7");
        assert_eq!(plain("lastpage", &[], &item), "97");

        let item = Item::new("1", "journalArticle").with_field("pages", "230\u{2013}265");
        assert_eq!(plain("firstpage", &[], &item), "230");
        assert_eq!(plain("lastpage", &[], &item), "265");
        assert_eq!(plain("firstpage", &[], &Item::new("2", "book")), "");
    }

    #[test]
    fn test_keyword() {
        let item = Item::new("1", "book").with_tag("zeta").with_tag("Alpha");
        assert_eq!(plain("keyword", &[], &item), "Alpha");
        assert_eq!(plain("keyword", &["1"], &item), "zeta");
        assert_eq!(plain("keyword", &["2"], &item), "");
    }

    #[test]
    fn test_journal_library_property() {
        let item = Item::new("1", "journalArticle")
            .with_field("publicationTitle", "Journal of Examples")
            .with_field("publisher", "ACM <b>Press</b>");
        assert_eq!(plain("journal", &[], &item), "Journal of Examples");
        assert_eq!(plain("library", &[], &item), "");
        assert_eq!(plain("property", &["publisher"], &item), "ACM Press");
        assert_eq!(plain("property", &["Publisher"], &item), "ACM Press");
        assert_eq!(plain("property", &["volume"], &item), "");

        let item = item.with_field("journalAbbreviation", "J. Ex.");
        assert_eq!(plain("journal", &[], &item), "J. Ex.");

        let mut shared = Item::new("2", "book");
        shared.library_name = Some("Lab Group".to_string());
        assert_eq!(plain("library", &[], &shared), "Lab Group");
    }

    #[test]
    fn test_stock_key() {
        let item = Item::new("1", "journalArticle")
            .with_creator("author", "Van Rossum", "Guido")
            .with_field("title", "The Python Language")
            .with_field("date", "1995");
        assert_eq!(plain("zotero", &[], &item), "van_rossum_python_1995");

        let item = Item::new("2", "book").with_creator("author", "Müller", "Hans");
        assert_eq!(plain("zotero", &[], &item), "muller_notitle_nodate");
        assert_eq!(plain("zotero", &[], &Item::new("3", "book")), "noauthor_notitle_nodate");
    }
}
