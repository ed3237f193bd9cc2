//! Template translation catalogs.
//!
//! UI strings in templates ("Translations", "Other languages", ...) are
//! looked up in a per-language message catalog:
//!
//! ```text
//! translations/
//! ├── de/
//! │   └── messages.toml        # "Translations" = "Übersetzungen"
//! └── cz/
//!     └── messages.toml
//! ```
//!
//! A build whose catalog is missing or unreadable gets the identity catalog,
//! which returns every message id unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse catalog {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    lang: String,
    messages: HashMap<String, String>,
}

impl Catalog {
    /// A catalog that translates nothing.
    pub fn identity(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            messages: HashMap::new(),
        }
    }

    /// Path of the catalog file for `lang`.
    pub fn path(dir: &Path, domain: &str, lang: &str) -> PathBuf {
        dir.join(lang).join(format!("{domain}.toml"))
    }

    pub fn load(dir: &Path, domain: &str, lang: &str) -> Result<Self, CatalogError> {
        let path = Self::path(dir, domain, lang);
        let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let messages = toml::from_str(&content).map_err(|source| CatalogError::Toml {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            lang: lang.to_string(),
            messages,
        })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn is_identity(&self) -> bool {
        self.messages.is_empty()
    }

    /// Translate `msgid`, or return it unchanged.
    pub fn gettext<'a>(&'a self, msgid: &'a str) -> &'a str {
        self.messages.get(msgid).map(String::as_str).unwrap_or(msgid)
    }
}

/// Load the catalog for `lang`, falling back to the identity catalog.
pub fn install(dir: &Path, domain: &str, lang: &str) -> Catalog {
    match Catalog::load(dir, domain, lang) {
        Ok(catalog) => {
            tracing::debug!(lang = %lang, messages = catalog.messages.len(), "Installed translation catalog");
            catalog
        }
        Err(e) => {
            tracing::error!(lang = %lang, error = %e, "Missing translation catalog, templates stay untranslated");
            Catalog::identity(lang)
        }
    }
}
