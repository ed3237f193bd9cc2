//! Shared test utilities.
//!
//! Provides content and config builders plus a recording site builder that
//! logs every lifecycle step and captures what its renderer was handed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let recorder = Recorder::default();
//! let corpus = vec![item("hello.md", "en", "hello"), item("hello.de.md", "de", "hello")];
//! let mut orchestrator = Orchestrator::new(recording_builders(&recorder, corpus, None));
//! orchestrator.run(recording_config("en")).unwrap();
//!
//! assert_eq!(recorder.renders.borrow()[0].published_ids(), vec!["hello.md"]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::builder::{
    BuildError, BuildOutput, BuilderRegistry, LifecycleHooks, PageRenderer, SiteBuilder,
};
use crate::config::SiteConfig;
use crate::content::{ContentItem, ContentKind, ContentStatus, Generator, StaticAsset};
use crate::locale::current_locale;
use crate::scan;
use crate::subsites::CrossSiteContext;

// =========================================================================
// Content and config
// =========================================================================

/// A published article with an empty body, saved as `{slug}.html`.
pub fn item(source_id: &str, lang: &str, slug: &str) -> ContentItem {
    ContentItem {
        source_id: source_id.to_string(),
        kind: ContentKind::Article,
        lang: lang.to_string(),
        slug: slug.to_string(),
        title: slug.to_string(),
        date: None,
        locale_date: None,
        body: String::new(),
        url: format!("{slug}.html"),
        save_as: format!("{slug}.html"),
        status: ContentStatus::Published,
        translations: Vec::new(),
        override_url: None,
    }
}

/// Stock config for a build of `lang`.
pub fn config_for(lang: &str) -> SiteConfig {
    SiteConfig {
        default_lang: lang.to_string(),
        ..SiteConfig::default()
    }
}

/// Config that runs the recording builder. No locale, so builds run in
/// their language tag.
pub fn recording_config(lang: &str) -> SiteConfig {
    SiteConfig {
        default_lang: lang.to_string(),
        builder: "recording".to_string(),
        locale: Vec::new(),
        ..SiteConfig::default()
    }
}

// =========================================================================
// Recording builder
// =========================================================================

/// What one renderer saw when the orchestrator finalized.
#[derive(Debug, Clone)]
pub struct RenderRecord {
    pub lang: String,
    pub locale: String,
    pub config: SiteConfig,
    pub generators: Vec<Generator>,
    pub static_assets: Vec<StaticAsset>,
    pub context: CrossSiteContext,
}

impl RenderRecord {
    fn all_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.generators
            .iter()
            .flat_map(|g| g.items.iter().chain(&g.hidden))
    }

    /// Resolved translation urls of the item with `source_id`.
    pub fn translation_urls(&self, source_id: &str) -> Vec<String> {
        self.all_items()
            .find(|i| i.source_id == source_id)
            .map(|i| {
                i.translations
                    .iter()
                    .map(|t| t.resolved_url().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn published_ids(&self) -> Vec<&str> {
        self.generators
            .iter()
            .flat_map(|g| &g.items)
            .map(|i| i.source_id.as_str())
            .collect()
    }

    pub fn hidden_ids(&self) -> Vec<&str> {
        self.generators
            .iter()
            .flat_map(|g| &g.hidden)
            .map(|i| i.source_id.as_str())
            .collect()
    }
}

/// Shared log of a recording run.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub log: Rc<RefCell<Vec<String>>>,
    pub renders: Rc<RefCell<Vec<RenderRecord>>>,
}

struct RecordingBuilder {
    config: SiteConfig,
    corpus: Vec<ContentItem>,
    fail_in: Option<String>,
    recorder: Recorder,
}

impl SiteBuilder for RecordingBuilder {
    fn run(&mut self, hooks: &mut dyn LifecycleHooks) -> Result<(), BuildError> {
        hooks.on_init(&mut self.config);
        let lang = self.config.default_lang.clone();
        self.recorder
            .log
            .borrow_mut()
            .push(format!("init {lang} locale={}", current_locale()));
        if self.fail_in.as_deref() == Some(lang.as_str()) {
            return Err(BuildError::Failed {
                lang,
                message: "recording builder told to fail".to_string(),
            });
        }

        hooks.on_content_filter(scan::assemble(
            ContentKind::Article,
            &lang,
            self.corpus.clone(),
        ));
        let assets = self
            .config
            .static_paths
            .iter()
            .map(|dir| {
                let path = format!("{dir}/logo.png");
                StaticAsset {
                    source_path: path.clone(),
                    url: path,
                    override_url: None,
                }
            })
            .collect();
        hooks.on_static_assets_finalized(&lang, assets);

        self.recorder.log.borrow_mut().push(format!("pre_write {lang}"));
        let renderer = RecordingRenderer {
            lang: lang.clone(),
            recorder: self.recorder.clone(),
        };
        hooks.on_pre_write(&lang, Box::new(renderer))
    }
}

struct RecordingRenderer {
    lang: String,
    recorder: Recorder,
}

impl PageRenderer for RecordingRenderer {
    fn render(&mut self, output: &BuildOutput<'_>) -> Result<(), BuildError> {
        let locale = current_locale();
        self.recorder
            .log
            .borrow_mut()
            .push(format!("render {} locale={locale}", self.lang));
        self.recorder.renders.borrow_mut().push(RenderRecord {
            lang: self.lang.clone(),
            locale,
            config: output.config.clone(),
            generators: output.generators.to_vec(),
            static_assets: output.static_assets.to_vec(),
            context: output.context.clone(),
        });
        Ok(())
    }
}

/// Builder registry with the recording builder under `"recording"`.
///
/// The build of `fail_in` fails right after `on_init`.
pub fn recording_builders(
    recorder: &Recorder,
    corpus: Vec<ContentItem>,
    fail_in: Option<&str>,
) -> BuilderRegistry {
    let recorder = recorder.clone();
    let fail_in = fail_in.map(str::to_string);
    let mut builders = BuilderRegistry::with_defaults();
    builders.register("recording", move |config| {
        Box::new(RecordingBuilder {
            config,
            corpus: corpus.clone(),
            fail_in: fail_in.clone(),
            recorder: recorder.clone(),
        }) as Box<dyn SiteBuilder>
    });
    builders
}
