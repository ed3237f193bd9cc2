//! Builds whose output is deferred until every site root is known.

use crate::builder::PageRenderer;
use crate::config::SiteConfig;
use crate::content::{ContentItem, Generator, StaticAsset};
use std::fmt;

/// Everything one build handed over before its output was written.
pub struct PendingBuild {
    pub lang: String,
    pub config: SiteConfig,
    pub generators: Vec<Generator>,
    /// Items the content filter took out of the generators. They are never
    /// rendered but their translation links are still resolved.
    pub removed: Vec<ContentItem>,
    pub static_assets: Vec<StaticAsset>,
    pub renderer: Option<Box<dyn PageRenderer>>,
}

impl PendingBuild {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            lang: config.default_lang.clone(),
            config: config.clone(),
            generators: Vec::new(),
            removed: Vec::new(),
            static_assets: Vec::new(),
            renderer: None,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.generators
            .iter()
            .flat_map(|g| g.all_items())
            .chain(self.removed.iter())
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut ContentItem> {
        self.generators
            .iter_mut()
            .flat_map(|g| g.all_items_mut())
            .chain(self.removed.iter_mut())
    }
}

impl fmt::Debug for PendingBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBuild")
            .field("lang", &self.lang)
            .field("generators", &self.generators.len())
            .field("removed", &self.removed.len())
            .field("static_assets", &self.static_assets.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Pending builds in the order they started.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    builds: Vec<PendingBuild>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the build configured by `config`, once per language.
    pub fn register(&mut self, config: &SiteConfig) -> &mut PendingBuild {
        let lang = &config.default_lang;
        match self.builds.iter().position(|b| &b.lang == lang) {
            Some(idx) => {
                tracing::warn!(lang = %lang, "Build registered twice in one run, replacing it");
                self.builds[idx] = PendingBuild::new(config);
                &mut self.builds[idx]
            }
            None => {
                self.builds.push(PendingBuild::new(config));
                let last = self.builds.len() - 1;
                &mut self.builds[last]
            }
        }
    }

    pub fn get(&self, lang: &str) -> Option<&PendingBuild> {
        self.builds.iter().find(|b| b.lang == lang)
    }

    pub fn get_mut(&mut self, lang: &str) -> Option<&mut PendingBuild> {
        self.builds.iter_mut().find(|b| b.lang == lang)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingBuild> {
        self.builds.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PendingBuild> {
        self.builds.iter_mut()
    }

    /// Every content item of every pending build.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut ContentItem> {
        self.builds.iter_mut().flat_map(|b| b.items_mut())
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn clear(&mut self) {
        self.builds.clear();
    }
}
