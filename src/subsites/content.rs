//! Canonical content lookup and the per-build content filter.

use crate::config::UntranslatedPolicy;
use crate::content::{ContentItem, ContentKind, ContentStatus, Generator};
use serde::Serialize;
use std::collections::HashMap;

/// The authoritative instance of a document: the one produced by the build
/// whose language matches the document's own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalContent {
    pub source_id: String,
    pub kind: ContentKind,
    pub lang: String,
    pub title: String,
    /// Address relative to the canonical site's root.
    pub url: String,
}

/// `source_id` → canonical instance.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    entries: HashMap<String, CanonicalContent>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `item` as the canonical instance of its document.
    pub fn record(&mut self, item: &ContentItem) {
        let entry = CanonicalContent {
            source_id: item.source_id.clone(),
            kind: item.kind,
            lang: item.lang.clone(),
            title: item.title.clone(),
            url: item.resolved_url().to_string(),
        };
        if let Some(existing) = self.entries.get(&item.source_id) {
            if existing.lang != entry.lang || existing.url != entry.url {
                tracing::warn!(
                    source = %item.source_id,
                    lang1 = %existing.lang,
                    lang2 = %entry.lang,
                    "Two builds claim the same document, keeping the latest"
                );
            }
        }
        self.entries.insert(item.source_id.clone(), entry);
    }

    pub fn get(&self, source_id: &str) -> Option<&CanonicalContent> {
        self.entries.get(source_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalContent> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Partition a generator's content for the build of `active_lang`.
///
/// Native items are recorded as canonical. Items in other languages are
/// handled per `policy`. The generator's translations list is emptied: each
/// language is published by its own subsite. Returns the items taken out of
/// the generator, which stay link owners for finalization.
pub fn filter_generator(
    generator: &mut Generator,
    active_lang: &str,
    policy: UntranslatedPolicy,
    registry: &mut ContentRegistry,
) -> Vec<ContentItem> {
    let mut removed = Vec::new();

    // Native content that the builder already hid or set aside still
    // defines the canonical address of its document.
    for item in generator.hidden.iter().chain(&generator.translations) {
        if item.lang == active_lang {
            registry.record(item);
        }
    }

    let mut published = Vec::with_capacity(generator.items.len());
    for mut item in generator.items.drain(..) {
        if item.lang == active_lang {
            registry.record(&item);
            published.push(item);
            continue;
        }
        match policy {
            UntranslatedPolicy::Keep => published.push(item),
            UntranslatedPolicy::Hide => {
                item.status = ContentStatus::Hidden;
                generator.hidden.push(item);
            }
            UntranslatedPolicy::Remove => removed.push(item),
        }
    }
    generator.items = published;

    removed.append(&mut generator.translations);
    removed
}
