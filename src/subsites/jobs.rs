//! Subsite jobs and the effective configuration of each subsite build.
//!
//! A subsite's configuration is the base configuration with a few keys
//! defaulted per language and the subsite's sparse overrides merged on top:
//!
//! | Key | Default when not overridden |
//! |-----|-----------------------------|
//! | `site_url` | `<base site_url>/<lang>` |
//! | `output_path` | `<base output_path>/<lang>` |
//! | `static_paths` | `[]` (assets are linked from the default site) |
//! | `theme_static_dir` | `<relpath to default site>/<base theme_static_dir>` |
//! | `theme_static_paths` | `[]` |
//! | `i18n.content_lang` | the default site's content language |
//!
//! The two theme keys are only defaulted when the overrides set none of
//! `theme`, `theme_static_dir` or `theme_static_paths`.

use super::sites::{join_url, relpath, site_path};
use crate::config::{ConfigError, OverrideSource, SiteConfig, merge_toml};

/// One subsite build waiting to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub lang: String,
    pub source: OverrideSource,
}

/// Jobs of one run, consumed last-in first-out.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// One job per configured subsite, popped in language order.
    ///
    /// A subsite for the base configuration's own language is ignored: the
    /// default site already covers it.
    pub fn from_config(base: &SiteConfig) -> Self {
        let mut queue = Self::new();
        for (lang, source) in base.i18n.subsites.iter().rev() {
            if *lang == base.default_lang {
                tracing::warn!(lang = %lang, "Subsite has the default language, ignoring it");
                continue;
            }
            queue.push(Job {
                lang: lang.clone(),
                source: source.clone(),
            });
        }
        queue
    }

    pub fn push(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn pop(&mut self) -> Option<Job> {
        self.jobs.pop()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

/// Root of a subsite that does not set its own `site_url`.
pub fn default_root(main_root: &str, lang: &str) -> String {
    format!("{}/{}", main_root.trim_end_matches('/'), lang)
}

const THEME_KEYS: [&str; 3] = ["theme", "theme_static_dir", "theme_static_paths"];

/// Derive the configuration of `job` from the base configuration.
///
/// Fails if the overrides cannot be read, name unknown keys or produce an
/// invalid configuration. Nothing is registered anywhere; the caller decides
/// what to do with the result.
pub fn derive_config(job: &Job, base: &SiteConfig) -> Result<SiteConfig, ConfigError> {
    let overrides = job.source.load(&job.lang, &base.content_root)?;

    let mut defaults = base.clone();
    defaults.i18n.subsites.clear();
    defaults.i18n.content_lang = Some(base.content_lang().to_string());
    defaults.default_lang = job.lang.clone();
    defaults.site_url = default_root(&base.site_url, &job.lang);
    defaults.output_path = base.output_path.join(&job.lang);
    defaults.static_paths = Vec::new();

    let merged = merge_toml(
        toml::Value::try_from(defaults)?,
        toml::Value::Table(overrides.clone()),
    );
    let mut config: SiteConfig = merged.try_into()?;
    config.default_lang = job.lang.clone();
    config.i18n.subsites.clear();
    config.i18n.run_langs = base.site_langs().into_iter().map(str::to_string).collect();
    config.validate()?;

    if !THEME_KEYS.iter().any(|key| overrides.contains_key(*key)) {
        let to_main = relpath(&site_path(&base.site_url), &site_path(&config.site_url));
        config.theme_static_dir = join_url(&to_main, &base.theme_static_dir);
        config.theme_static_paths = Vec::new();
    }

    Ok(config)
}
