//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. The content
//! root holds the base configuration for the default-language site; each
//! subsite's configuration is derived from it by layering a sparse override
//! table on top (see [`crate::subsites::jobs`]).
//!
//! ## Config File Location
//!
//! ```text
//! content/
//! ├── config.toml              # Base config (overrides stock defaults)
//! ├── i18n/
//! │   └── de.toml              # Optional subsite override file
//! ├── articles/
//! └── pages/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! site_name = "My Site"
//! site_url = ""                 # Root of the default-language site
//! default_lang = "en"
//! locale = []                   # Formatting locales, first wins (e.g. ["en_US"])
//! date_format = "%a %d %B %Y"
//! output_path = "output"
//! static_paths = ["images"]     # Relative to the content root
//! theme_static_dir = "theme"
//! theme_static_paths = ["static"]
//! builder = "static"
//!
//! [urls]
//! article_url = "{slug}.html"
//! article_lang_url = "{slug}-{lang}.html"
//! page_url = "pages/{slug}.html"
//! page_lang_url = "pages/{slug}-{lang}.html"
//!
//! [i18n]
//! untranslated_policy = "hide"  # hide | keep | remove
//! content_lang = "en"           # Language of files that declare none
//! use_catalog = false
//! gettext_domain = "messages"
//! translations_dir = "translations"
//!
//! [i18n.subsites.de]            # Inline overrides
//! site_name = "Meine Seite"
//!
//! [i18n.subsites.cz]            # Overrides read from a file
//! file = "i18n/cz.toml"
//! ```
//!
//! A bare path (`fr = "i18n/fr.toml"` under `[i18n.subsites]`) also names an
//! override file.
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early, which also applies to subsite override
//! tables once they are merged over the base configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Cannot read overrides '{path}' for lang '{lang}': {source}")]
    Overrides {
        lang: String,
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Human-readable site title.
    pub site_name: String,
    /// Address of this site's root. Empty means the filesystem/URL root.
    pub site_url: String,
    /// Language this build is authoritative for.
    pub default_lang: String,
    /// Candidate formatting locales (e.g. `de_DE.UTF-8`). The first one is
    /// used; when empty the build's language is used.
    pub locale: Vec<String>,
    /// strftime pattern for article dates, formatted in the build's locale.
    pub date_format: String,
    /// Directory holding `articles/`, `pages/` and static files.
    pub content_root: PathBuf,
    /// Where this build writes its output.
    pub output_path: PathBuf,
    /// Static asset directories relative to the content root.
    pub static_paths: Vec<String>,
    /// Optional theme directory providing static files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<PathBuf>,
    /// Output directory (relative to the site output) for theme assets.
    pub theme_static_dir: String,
    /// Directories inside the theme copied into `theme_static_dir`.
    pub theme_static_paths: Vec<String>,
    /// Key of the site builder implementation, see [`crate::builder::BuilderRegistry`].
    pub builder: String,
    /// URL and output path patterns for content.
    pub urls: UrlConfig,
    /// Subsite and translation settings.
    pub i18n: I18nConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "My Site".to_string(),
            site_url: String::new(),
            default_lang: "en".to_string(),
            locale: Vec::new(),
            date_format: "%a %d %B %Y".to_string(),
            content_root: PathBuf::from("content"),
            output_path: PathBuf::from("output"),
            static_paths: vec!["images".to_string()],
            theme: None,
            theme_static_dir: "theme".to_string(),
            theme_static_paths: vec!["static".to_string()],
            builder: "static".to_string(),
            urls: UrlConfig::default(),
            i18n: I18nConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_lang(&self.default_lang) {
            return Err(ConfigError::Validation(format!(
                "default_lang '{}' must be a non-empty language tag without path separators",
                self.default_lang
            )));
        }
        if let Some(lang) = self.i18n.subsites.keys().find(|l| !is_valid_lang(l)) {
            return Err(ConfigError::Validation(format!(
                "i18n.subsites key '{lang}' must be a non-empty language tag without path separators"
            )));
        }
        if self.builder.is_empty() {
            return Err(ConfigError::Validation("builder must not be empty".into()));
        }
        if self.date_format.is_empty() {
            return Err(ConfigError::Validation(
                "date_format must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The formatting locale this build should run under.
    pub fn format_locale(&self) -> &str {
        self.locale
            .first()
            .map(String::as_str)
            .unwrap_or(&self.default_lang)
    }

    /// Language of content files that do not name one.
    pub fn content_lang(&self) -> &str {
        self.i18n.content_lang.as_deref().unwrap_or(&self.default_lang)
    }

    /// Every language of the run: this site's, the content language, the
    /// configured subsites and the languages inherited from the default site.
    pub fn site_langs(&self) -> Vec<&str> {
        let mut langs = vec![self.default_lang.as_str(), self.content_lang()];
        langs.extend(self.i18n.subsites.keys().map(String::as_str));
        langs.extend(self.i18n.run_langs.iter().map(String::as_str));
        langs.sort_unstable();
        langs.dedup();
        langs
    }

    /// Collapse the language-specific URL patterns onto the plain ones.
    ///
    /// Content in another language is published by that language's own
    /// subsite, so a build must not invent `-{lang}` addresses for it.
    pub fn disable_lang_urls(&mut self) {
        self.urls.article_lang_url = self.urls.article_url.clone();
        self.urls.page_lang_url = self.urls.page_url.clone();
        self.urls.article_lang_save_as = self.urls.article_save_as.clone();
        self.urls.page_lang_save_as = self.urls.page_save_as.clone();
    }
}

fn is_valid_lang(lang: &str) -> bool {
    !lang.is_empty() && !lang.contains(['/', '\\']) && lang != "." && lang != ".."
}

/// URL and save-path patterns. `{slug}` and `{lang}` are substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    pub article_url: String,
    pub article_lang_url: String,
    pub article_save_as: String,
    pub article_lang_save_as: String,
    pub page_url: String,
    pub page_lang_url: String,
    pub page_save_as: String,
    pub page_lang_save_as: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            article_url: "{slug}.html".to_string(),
            article_lang_url: "{slug}-{lang}.html".to_string(),
            article_save_as: "{slug}.html".to_string(),
            article_lang_save_as: "{slug}-{lang}.html".to_string(),
            page_url: "pages/{slug}.html".to_string(),
            page_lang_url: "pages/{slug}-{lang}.html".to_string(),
            page_save_as: "pages/{slug}.html".to_string(),
            page_lang_save_as: "pages/{slug}-{lang}.html".to_string(),
        }
    }
}

/// Expand a URL pattern for one content item.
pub fn expand_pattern(pattern: &str, slug: &str, lang: &str) -> String {
    pattern.replace("{slug}", slug).replace("{lang}", lang)
}

/// What a build does with content that is not in its own language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UntranslatedPolicy {
    /// Move it to the build's suppressed set and mark it hidden.
    #[default]
    Hide,
    /// Leave it where the builder put it.
    Keep,
    /// Drop it from the build; it only serves as a link target.
    Remove,
}

/// Subsite and translation settings (`[i18n]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I18nConfig {
    pub untranslated_policy: UntranslatedPolicy,
    /// Language of content that does not declare one. Defaults to
    /// `default_lang`; subsites inherit the default site's value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_lang: Option<String>,
    /// Install a translation catalog into each build's template context.
    pub use_catalog: bool,
    /// Catalog file name (without extension) inside each language directory.
    pub gettext_domain: String,
    /// Catalog root, relative to the theme directory if set, otherwise
    /// to the content root.
    pub translations_dir: PathBuf,
    /// Language → overrides for every subsite to build.
    pub subsites: BTreeMap<String, OverrideSource>,
    /// Languages of every site in the run. Set on derived subsite configs,
    /// which carry no `subsites` of their own.
    #[serde(skip)]
    pub run_langs: Vec<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            untranslated_policy: UntranslatedPolicy::Hide,
            content_lang: None,
            use_catalog: false,
            gettext_domain: "messages".to_string(),
            translations_dir: PathBuf::from("translations"),
            subsites: BTreeMap::new(),
            run_langs: Vec::new(),
        }
    }
}

/// Where a subsite's overrides come from.
///
/// Any value is accepted when the config is loaded. A value that is neither
/// a table nor a file path only fails when its subsite is built, so one bad
/// entry cannot stop the other sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideSource {
    /// `de = "i18n/de.toml"`, relative to the content root.
    Path(PathBuf),
    /// `{ file = "i18n/de.toml" }`, relative to the content root.
    File(OverrideFile),
    /// Any other table is taken as the overrides themselves.
    Inline(toml::Table),
    /// Anything else. Loading it is an error.
    Invalid(toml::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideFile {
    pub file: PathBuf,
}

impl OverrideSource {
    /// Read the override table for `lang`.
    pub fn load(&self, lang: &str, content_root: &Path) -> Result<toml::Table, ConfigError> {
        match self {
            OverrideSource::Inline(table) => Ok(table.clone()),
            OverrideSource::Path(file) | OverrideSource::File(OverrideFile { file }) => {
                let path = content_root.join(file);
                let read = || -> Result<toml::Table, ConfigError> {
                    let content = fs::read_to_string(&path)?;
                    Ok(toml::from_str(&content)?)
                };
                read().map_err(|e| ConfigError::Overrides {
                    lang: lang.to_string(),
                    path: path.clone(),
                    source: Box::new(e),
                })
            }
            OverrideSource::Invalid(value) => Err(ConfigError::Validation(format!(
                "i18n.subsites.{lang} must be a table or a file path, not {}",
                value.type_str()
            ))),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given content root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. `content_root` is set to `root`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let mut config = resolve_config(base, overlay)?;
    config.content_root = root.to_path_buf();
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# i18n-subsites Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# This file configures the default-language site. Every entry under
# [i18n.subsites] adds one language subsite whose configuration is this
# file with the subsite's overrides layered on top.
# Unknown keys will cause an error.

site_name = "My Site"

# Root address of the default site. Empty means "/". Subsites default to
# <site_url>/<lang>.
site_url = ""

# Language this site is authoritative for.
default_lang = "en"

# Formatting locales for dates; the first entry wins. Empty = default_lang.
locale = []

# strftime pattern for article dates.
date_format = "%a %d %B %Y"

# Output directory. Subsites default to <output_path>/<lang>.
output_path = "output"

# Static directories (relative to the content root). Subsites default to
# none and link to the default site's copies instead.
static_paths = ["images"]

# Theme static files. Subsites without theme overrides link to the default
# site's theme directory.
# theme = "themes/simple"
theme_static_dir = "theme"
theme_static_paths = ["static"]

# Site builder implementation.
builder = "static"

# ---------------------------------------------------------------------------
# URL patterns ({slug} and {lang} are substituted)
# ---------------------------------------------------------------------------
[urls]
article_url = "{slug}.html"
article_lang_url = "{slug}-{lang}.html"
article_save_as = "{slug}.html"
article_lang_save_as = "{slug}-{lang}.html"
page_url = "pages/{slug}.html"
page_lang_url = "pages/{slug}-{lang}.html"
page_save_as = "pages/{slug}.html"
page_lang_save_as = "pages/{slug}-{lang}.html"

# ---------------------------------------------------------------------------
# Subsites
# ---------------------------------------------------------------------------
[i18n]
# What a build does with content in another language:
#   hide   - keep it as a hidden link target (default)
#   keep   - leave it published
#   remove - drop it from the build
untranslated_policy = "hide"

# Language of content files without a language suffix or `lang` front
# matter. Defaults to default_lang.
# content_lang = "en"

# Install template translation catalogs from
# <translations_dir>/<lang>/<gettext_domain>.toml
use_catalog = false
gettext_domain = "messages"
translations_dir = "translations"

# One table per subsite language. Either inline overrides:
#
# [i18n.subsites.de]
# site_name = "Meine Seite"
#
# or a file with overrides, relative to the content root:
#
# [i18n.subsites.cz]
# file = "i18n/cz.toml"
#
# A bare path works too:
#
# [i18n.subsites]
# fr = "i18n/fr.toml"
"##
}
