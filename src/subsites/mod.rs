//! Multi-language builds from one content corpus.
//!
//! The default-language site is built first. Every language under
//! `[i18n.subsites]` is then built as a subsite of its own, with a
//! configuration derived from the default one. Builds run one after the
//! other and nest: each build's write phase launches the next queued
//! subsite, and the last one finalizes the whole run.
//!
//! ```text
//! Orchestrator::run(config)
//! └── en build ── on_init ─────────── snapshot config, queue [cz, de]
//!     ├── on_content_filter ───────── canonical content, hide foreign items
//!     └── on_pre_write ────────────── pop cz
//!         └── cz build (LocaleGuard "cz")
//!             └── on_pre_write ────── pop de
//!                 └── de build (LocaleGuard "de")
//!                     └── on_pre_write  queue empty: finalize
//!                         ├── interlink translations and static assets
//!                         ├── render en, cz, de
//!                         └── reset to Idle
//! ```
//!
//! Nothing is written before finalization: a link from one site to another
//! can only be made relative once both site roots are known.
//!
//! | Module | Role |
//! |--------|------|
//! | [`sites`] | Site roots and relative paths between them |
//! | [`content`] | Canonical content lookup and the per-build content filter |
//! | [`pending`] | Builds waiting for finalization |
//! | [`jobs`] | Subsite queue and effective subsite configuration |
//! | [`finalize`] | Link resolution, cross-site context, deferred rendering |

pub mod content;
pub mod finalize;
pub mod jobs;
pub mod pending;
pub mod sites;

pub use content::{CanonicalContent, ContentRegistry, filter_generator};
pub use finalize::{CrossSiteContext, LinkStats, SiteSummary};
pub use jobs::{Job, JobQueue};
pub use pending::{PendingBuild, PendingRegistry};
pub use sites::{SiteRegistry, join_url, relpath, site_path};

use crate::builder::{
    BuildError, BuilderRegistry, LifecycleHooks, PageRenderer, SiteBuilder, UnknownBuilder,
};
use crate::config::SiteConfig;
use crate::content::{Generator, StaticAsset};
use crate::locale::LocaleGuard;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    UnknownBuilder(#[from] UnknownBuilder),
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Builder returned before its write phase, the run was never finalized")]
    Unfinished,
}

/// Where a run is.
///
/// `Idle → Initialized → BuildingLocale* → Finalizing → Idle`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    /// The default site is building.
    Initialized,
    BuildingLocale(String),
    Finalizing,
}

/// A subsite that was not built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSubsite {
    pub lang: String,
    pub reason: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Finished sites, default first.
    pub sites: Vec<SiteSummary>,
    pub skipped: Vec<SkippedSubsite>,
    pub links: LinkStats,
}

/// A site a run would build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSite {
    pub lang: String,
    pub root: String,
    pub output_path: PathBuf,
    pub builder: String,
    pub theme_static_dir: String,
}

impl PlannedSite {
    fn from_config(config: &SiteConfig, root: &str) -> Self {
        Self {
            lang: config.default_lang.clone(),
            root: root.to_string(),
            output_path: config.output_path.clone(),
            builder: config.builder.clone(),
            theme_static_dir: config.theme_static_dir.clone(),
        }
    }
}

/// Every site a run of `config` would build, without building anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub sites: Vec<PlannedSite>,
    pub skipped: Vec<SkippedSubsite>,
}

/// Derive every subsite configuration of `config`.
pub fn plan(config: &SiteConfig, builders: &BuilderRegistry) -> Result<Plan, UnknownBuilder> {
    builders.resolve(&config.builder)?;
    let mut base = config.clone();
    base.disable_lang_urls();

    let mut plan = Plan::default();
    plan.sites.push(PlannedSite::from_config(&base, main_root(&base)));

    let mut queue = JobQueue::from_config(&base);
    while let Some(job) = queue.pop() {
        let prepared = jobs::derive_config(&job, &base)
            .map_err(|e| e.to_string())
            .and_then(|derived| match builders.resolve(&derived.builder) {
                Ok(()) => Ok(derived),
                Err(e) => Err(e.to_string()),
            });
        match prepared {
            Ok(derived) => plan
                .sites
                .push(PlannedSite::from_config(&derived, &derived.site_url)),
            Err(reason) => plan.skipped.push(SkippedSubsite {
                lang: job.lang,
                reason,
            }),
        }
    }
    Ok(plan)
}

/// Root of the default site; empty means `/`.
fn main_root(config: &SiteConfig) -> &str {
    if config.site_url.is_empty() {
        "/"
    } else {
        &config.site_url
    }
}

/// Owns every registry of a run and answers the builders' lifecycle hooks.
#[derive(Debug)]
pub struct Orchestrator {
    builders: BuilderRegistry,
    state: RunState,
    base: Option<SiteConfig>,
    sites: SiteRegistry,
    canonical: ContentRegistry,
    pending: PendingRegistry,
    jobs: JobQueue,
    main_assets: Vec<StaticAsset>,
    summary: RunSummary,
}

impl Orchestrator {
    pub fn new(builders: BuilderRegistry) -> Self {
        Self {
            builders,
            state: RunState::Idle,
            base: None,
            sites: SiteRegistry::default(),
            canonical: ContentRegistry::new(),
            pending: PendingRegistry::new(),
            jobs: JobQueue::new(),
            main_assets: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn base(&self) -> Option<&SiteConfig> {
        self.base.as_ref()
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    pub fn canonical(&self) -> &ContentRegistry {
        &self.canonical
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    pub fn queued_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Build the default site of `config` and every subsite.
    ///
    /// Registries are reset when the run ends, whether it succeeded or not.
    pub fn run(&mut self, config: SiteConfig) -> Result<RunSummary, OrchestratorError> {
        let _locale = LocaleGuard::acquire(config.format_locale());
        let mut builder = self.builders.create(config)?;
        if let Err(e) = builder.run(self) {
            self.reset();
            return Err(e.into());
        }
        if self.state != RunState::Idle {
            self.reset();
            return Err(OrchestratorError::Unfinished);
        }
        Ok(std::mem::take(&mut self.summary))
    }

    /// Start a run from the settings of the default build.
    ///
    /// Only acts when no run is in progress.
    pub fn on_top_level_init(&mut self, settings: &mut SiteConfig) {
        if self.state != RunState::Idle {
            tracing::debug!(state = ?self.state, "Run already in progress, ignoring init");
            return;
        }
        settings.disable_lang_urls();
        self.sites = SiteRegistry::new(&settings.default_lang, main_root(settings));
        self.jobs = JobQueue::from_config(settings);
        self.base = Some(settings.clone());
        self.summary = RunSummary::default();
        self.state = RunState::Initialized;
        tracing::info!(
            lang = %settings.default_lang,
            subsites = self.jobs.len(),
            "Starting multi-language run"
        );
    }

    /// Pop jobs until one can be built. Jobs whose configuration cannot be
    /// derived are skipped.
    fn next_job(&mut self) -> Option<(SiteConfig, Box<dyn SiteBuilder>)> {
        while let Some(job) = self.jobs.pop() {
            let base = self.base.as_ref()?;
            let prepared = jobs::derive_config(&job, base)
                .map_err(|e| e.to_string())
                .and_then(|config| match self.builders.create(config.clone()) {
                    Ok(builder) => Ok((config, builder)),
                    Err(e) => Err(e.to_string()),
                });
            match prepared {
                Ok(next) => return Some(next),
                Err(reason) => {
                    tracing::warn!(lang = %job.lang, error = %reason, "Skipping subsite");
                    self.summary.skipped.push(SkippedSubsite {
                        lang: job.lang,
                        reason,
                    });
                }
            }
        }
        None
    }

    fn finalize(&mut self) -> Result<(), BuildError> {
        self.state = RunState::Finalizing;
        let result = finalize::run(
            &mut self.pending,
            &mut self.sites,
            &self.canonical,
            &self.main_assets,
        );
        self.reset();
        let report = result?;
        self.summary.sites = report.sites;
        self.summary.links = report.links;
        Ok(())
    }

    /// Forget everything about the current run except its summary.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.base = None;
        self.sites.clear();
        self.canonical.clear();
        self.pending.clear();
        self.jobs.clear();
        self.main_assets.clear();
    }
}

impl LifecycleHooks for Orchestrator {
    fn on_init(&mut self, settings: &mut SiteConfig) {
        if self.state == RunState::Idle {
            self.on_top_level_init(settings);
        }
        settings.disable_lang_urls();
        self.pending.register(settings);
    }

    fn on_content_filter(&mut self, mut generator: Generator) {
        let Some(build) = self.pending.get_mut(&generator.locale) else {
            tracing::warn!(lang = %generator.locale, "Content from an unregistered build, ignoring it");
            return;
        };
        let policy = build.config.i18n.untranslated_policy;
        let removed = filter_generator(&mut generator, &build.lang, policy, &mut self.canonical);
        tracing::debug!(
            lang = %build.lang,
            kind = generator.kind.as_str(),
            published = generator.items.len(),
            hidden = generator.hidden.len(),
            removed = removed.len(),
            "Filtered content"
        );
        build.removed.extend(removed);
        build.generators.push(generator);
    }

    fn on_static_assets_finalized(&mut self, lang: &str, assets: Vec<StaticAsset>) {
        if lang == self.sites.default_lang() {
            self.main_assets = assets.clone();
        }
        match self.pending.get_mut(lang) {
            Some(build) => build.static_assets = assets,
            None => tracing::warn!(lang = %lang, "Static assets of an unregistered build, ignoring them"),
        }
    }

    fn on_pre_write(
        &mut self,
        lang: &str,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<(), BuildError> {
        match self.pending.get_mut(lang) {
            Some(build) => build.renderer = Some(renderer),
            None => tracing::warn!(lang = %lang, "Renderer of an unregistered build, ignoring it"),
        }

        if let Some((config, mut builder)) = self.next_job() {
            let lang = config.default_lang.clone();
            self.sites.register(&lang, &config.site_url);
            tracing::info!(
                lang = %lang,
                root = %config.site_url,
                output = %config.output_path.display(),
                "Building subsite"
            );
            self.state = RunState::BuildingLocale(lang);
            let _locale = LocaleGuard::acquire(config.format_locale());
            return builder.run(self);
        }

        self.finalize()
    }
}
