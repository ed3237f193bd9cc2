//! Content types shared between site builders and the subsite orchestrator.
//!
//! A site builder reads the whole corpus on every build and hands its output
//! to the orchestrator one [`Generator`] per content kind. Items carry a
//! `source_id` that stays the same across every locale build of the corpus,
//! which is what lets a later pass find "the same document" in another
//! build's output.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The two kinds of content a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Page,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Page => "page",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Published,
    /// Rendered nowhere in this build; kept as a link target.
    Hidden,
    Draft,
}

/// A link from one content item to a sibling variant in another language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRef {
    /// `source_id` of the sibling document.
    pub source_id: String,
    pub lang: String,
    /// Address the builder computed, relative to its own site root.
    pub url: String,
    /// Address assigned during finalization, relative to the referring
    /// item's site root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_url: Option<String>,
}

impl TranslationRef {
    pub fn resolved_url(&self) -> &str {
        self.override_url.as_deref().unwrap_or(&self.url)
    }
}

/// One article or page as produced by one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable identity of the source document, e.g. `articles/010-hello.de.md`.
    pub source_id: String,
    pub kind: ContentKind,
    pub lang: String,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// `date` formatted in the producing build's locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale_date: Option<String>,
    /// Raw markdown body.
    pub body: String,
    /// Address relative to the producing site's root.
    pub url: String,
    /// Output file path relative to the producing site's output directory.
    pub save_as: String,
    pub status: ContentStatus,
    pub translations: Vec<TranslationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_url: Option<String>,
}

impl ContentItem {
    pub fn resolved_url(&self) -> &str {
        self.override_url.as_deref().unwrap_or(&self.url)
    }

    /// A reference to this item as seen from one of its siblings.
    pub fn as_translation(&self) -> TranslationRef {
        TranslationRef {
            source_id: self.source_id.clone(),
            lang: self.lang.clone(),
            url: self.url.clone(),
            override_url: None,
        }
    }
}

/// All content of one kind produced by one build.
///
/// `items` is the published set, `hidden` the suppressed set and
/// `translations` the variants the builder set aside as translations of
/// published items.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub kind: ContentKind,
    /// Language of the build that produced this generator.
    pub locale: String,
    pub items: Vec<ContentItem>,
    pub hidden: Vec<ContentItem>,
    pub translations: Vec<ContentItem>,
}

impl Generator {
    pub fn new(kind: ContentKind, locale: impl Into<String>) -> Self {
        Self {
            kind,
            locale: locale.into(),
            items: Vec::new(),
            hidden: Vec::new(),
            translations: Vec::new(),
        }
    }

    /// Every item held, in list order: published, hidden, translations.
    pub fn all_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.items
            .iter()
            .chain(self.hidden.iter())
            .chain(self.translations.iter())
    }

    pub fn all_items_mut(&mut self) -> impl Iterator<Item = &mut ContentItem> {
        self.items
            .iter_mut()
            .chain(self.hidden.iter_mut())
            .chain(self.translations.iter_mut())
    }
}

/// A non-document file a build publishes (image, download, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticAsset {
    /// Path relative to the content root.
    pub source_path: String,
    /// Address relative to the publishing site's root.
    pub url: String,
    /// Set when the asset lives in another site's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_url: Option<String>,
}

impl StaticAsset {
    pub fn resolved_url(&self) -> &str {
        self.override_url.as_deref().unwrap_or(&self.url)
    }
}
