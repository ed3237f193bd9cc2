//! File-name parsing for the `NNN-slug[.lang]` convention.
//!
//! Articles and pages are named with an optional numeric prefix for ordering,
//! a slug, and an optional language suffix:
//!
//! - `010-hello.md` → number 10, slug `hello`, no language
//! - `010-hello.de.md` → number 10, slug `hello`, language `de`
//! - `about.pt_BR.md` → no number, slug `about`, language `pt_BR`
//!
//! Files sharing a slug are translations of one another.
//!
//! Any 2-3 letter suffix looks like a language (`intro.api` would be slug
//! `intro` in language `api`), so builds parse with
//! [`parse_entry_name_with`] and only accept the languages of their run.

/// Result of parsing a file stem like `010-hello.de`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `10` from `010-hello`)
    pub number: Option<u32>,
    /// Name part after `NNN-` and before the language suffix.
    pub slug: String,
    /// Language suffix (`de` from `hello.de`), if the stem carries one.
    pub lang: Option<String>,
    /// Slug with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a file stem following the `NNN-slug[.lang]` convention.
///
/// - `"010-hello-world"` → number=Some(10), slug="hello-world", lang=None
/// - `"010-hello.de"` → number=Some(10), slug="hello", lang=Some("de")
/// - `"notes"` → number=None, slug="notes", lang=None
/// - `"release-1.2"` → number=None, slug="release-1.2", lang=None
pub fn parse_entry_name(stem: &str) -> ParsedName {
    parse_entry_name_with(stem, is_lang_tag)
}

/// Like [`parse_entry_name`], but a suffix only counts as a language when
/// `is_lang` accepts it. Otherwise it stays part of the slug.
///
/// - `"intro.api"` with languages `en`, `de` → slug="intro.api", lang=None
pub fn parse_entry_name_with(stem: &str, is_lang: impl Fn(&str) -> bool) -> ParsedName {
    let (name, lang) = match stem.rsplit_once('.') {
        Some((name, suffix)) if !name.is_empty() && is_lang(suffix) => {
            (name, Some(suffix.to_string()))
        }
        _ => (stem, None),
    };

    let (number, slug) = match name.split_once('-') {
        Some((prefix, rest)) if !rest.is_empty() => match prefix.parse::<u32>() {
            Ok(num) => (Some(num), rest),
            Err(_) => (None, name),
        },
        _ => (None, name),
    };

    ParsedName {
        number,
        slug: slug.to_string(),
        lang,
        display_title: slug.replace('-', " "),
    }
}

/// `de`, `cz`, `pt_BR`, `zh-Hant`: a 2-3 letter language code with an
/// optional region or script.
pub fn is_lang_tag(tag: &str) -> bool {
    let (language, region) = match tag.split_once(['_', '-']) {
        Some((language, region)) => (language, Some(region)),
        None => (tag, None),
    };
    let language_ok =
        (2..=3).contains(&language.len()) && language.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = region.is_none_or(|r| {
        (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
    });
    language_ok && region_ok
}
