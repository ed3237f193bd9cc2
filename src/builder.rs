//! The seam between the subsite orchestrator and a site builder.
//!
//! A site builder turns one configuration into one site. It reports to the
//! orchestrator at four fixed points of its lifecycle through
//! [`LifecycleHooks`]:
//!
//! ```text
//! on_init                    settings are final (may be adjusted in place)
//! on_content_filter          once per content kind
//! on_static_assets_finalized static files are known
//! on_pre_write               hands over the renderer; may run nested builds
//! ```
//!
//! Output is written later, when every site root is known, by the
//! [`PageRenderer`] the builder handed over at `on_pre_write`.
//!
//! Builders are looked up by the `builder` config key in a
//! [`BuilderRegistry`] instead of being named by type at runtime.

use crate::config::{ConfigError, SiteConfig};
use crate::content::{Generator, StaticAsset};
use crate::generate::GenerateError;
use crate::scan::{self, ScanError};
use crate::subsites::CrossSiteContext;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),
    #[error("Build of '{lang}' failed: {message}")]
    Failed { lang: String, message: String },
}

/// Lifecycle points a site builder reports to.
pub trait LifecycleHooks {
    /// Settings of the starting build. Implementations may rewrite them.
    fn on_init(&mut self, settings: &mut SiteConfig);

    /// One content kind is generated. The generator's `locale` names the build.
    fn on_content_filter(&mut self, generator: Generator);

    /// Static files of the build of `lang` are known.
    fn on_static_assets_finalized(&mut self, lang: &str, assets: Vec<StaticAsset>);

    /// The build of `lang` is ready to write. Nested builds run from here,
    /// and their errors are returned.
    fn on_pre_write(
        &mut self,
        lang: &str,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<(), BuildError>;
}

/// A site builder run against one configuration.
pub trait SiteBuilder {
    fn run(&mut self, hooks: &mut dyn LifecycleHooks) -> Result<(), BuildError>;
}

/// Everything a renderer sees when the deferred output is written.
#[derive(Debug)]
pub struct BuildOutput<'a> {
    pub config: &'a SiteConfig,
    pub generators: &'a [Generator],
    pub static_assets: &'a [StaticAsset],
    pub context: &'a CrossSiteContext,
}

/// Writes one build's output once cross-site links are resolved.
pub trait PageRenderer {
    fn render(&mut self, output: &BuildOutput<'_>) -> Result<(), BuildError>;
}

// ============================================================================
// Builder registry
// ============================================================================

pub type BuilderFactory = Box<dyn Fn(SiteConfig) -> Box<dyn SiteBuilder>>;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown builder '{name}' (available: {})", available.join(", "))]
pub struct UnknownBuilder {
    pub name: String,
    pub available: Vec<String>,
}

/// Builder key → constructor.
#[derive(Default)]
pub struct BuilderRegistry {
    factories: BTreeMap<String, BuilderFactory>,
}

impl BuilderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the builders shipped in this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("static", |config| Box::new(scan::StaticBuilder::new(config)));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(SiteConfig) -> Box<dyn SiteBuilder> + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check that `name` is registered.
    pub fn resolve(&self, name: &str) -> Result<(), UnknownBuilder> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(UnknownBuilder {
                name: name.to_string(),
                available: self.names(),
            })
        }
    }

    /// Construct the builder named by `config.builder`.
    pub fn create(&self, config: SiteConfig) -> Result<Box<dyn SiteBuilder>, UnknownBuilder> {
        match self.factories.get(&config.builder) {
            Some(factory) => Ok(factory(config)),
            None => Err(UnknownBuilder {
                name: config.builder.clone(),
                available: self.names(),
            }),
        }
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("builders", &self.names())
            .finish()
    }
}
