//! Site roots of every locale and relative paths between them.
//!
//! Roots can be full URLs (`https://example.com/de`) or bare paths (`/de`);
//! only the path component takes part in the path algebra. An empty root is
//! the root path `/`.

use std::collections::HashMap;
use url::Url;

/// Locale → site root, default locale first, then in registration order.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    default_lang: String,
    sites: Vec<(String, String)>,
    relpaths: HashMap<(String, String), String>,
}

impl SiteRegistry {
    /// Start a registry with the default locale's root registered.
    pub fn new(default_lang: &str, default_root: &str) -> Self {
        let mut registry = Self {
            default_lang: default_lang.to_string(),
            ..Self::default()
        };
        registry.register(default_lang, default_root);
        registry
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Record or replace the root of `lang`.
    pub fn register(&mut self, lang: &str, root: &str) {
        match self.sites.iter_mut().find(|(l, _)| l == lang) {
            Some(entry) => {
                entry.1 = root.to_string();
                self.relpaths.retain(|(from, to), _| from != lang && to != lang);
            }
            None => self.sites.push((lang.to_string(), root.to_string())),
        }
    }

    /// The root of `lang`, or the default site's root if `lang` is unknown.
    pub fn root(&self, lang: &str) -> &str {
        self.lookup(lang)
            .or_else(|| self.lookup(&self.default_lang))
            .unwrap_or_default()
    }

    fn lookup(&self, lang: &str) -> Option<&str> {
        self.sites
            .iter()
            .find(|(l, _)| l == lang)
            .map(|(_, root)| root.as_str())
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.lookup(lang).is_some()
    }

    /// Relative path from the root of `from` to the root of `to`. Cached per
    /// ordered pair until the registry is cleared or either root changes.
    pub fn relative_path(&mut self, from: &str, to: &str) -> String {
        let key = (from.to_string(), to.to_string());
        if let Some(cached) = self.relpaths.get(&key) {
            return cached.clone();
        }
        let relpath = relpath(&site_path(self.root(to)), &site_path(self.root(from)));
        self.relpaths.insert(key, relpath.clone());
        relpath
    }

    /// Number of cached relative paths.
    pub fn cached_relpaths(&self) -> usize {
        self.relpaths.len()
    }

    /// All sites, default first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sites.iter().map(|(l, r)| (l.as_str(), r.as_str()))
    }

    pub fn langs(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn clear(&mut self) {
        self.default_lang.clear();
        self.sites.clear();
        self.relpaths.clear();
    }
}

/// Path component of a site root, as an absolute path.
///
/// ```
/// use i18n_subsites::subsites::site_path;
/// assert_eq!(site_path("http://example.com"), "/");
/// assert_eq!(site_path("http://example.com/de"), "/de");
/// assert_eq!(site_path(""), "/");
/// ```
pub fn site_path(root: &str) -> String {
    let path = match Url::parse(root) {
        Ok(url) if url.has_host() || url.scheme() == "file" => url.path().to_string(),
        _ => root.to_string(),
    };
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

/// Join `path` onto `base` like a POSIX path join: an absolute `path`
/// replaces `base`.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') || base.is_empty() {
        path.to_string()
    } else if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Normalize a `/`-separated path, collapsing `.` and `..` segments.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Relative path from directory `start` to `target`; both absolute.
pub fn relpath(target: &str, start: &str) -> String {
    let target = normalize_path(target);
    let start = normalize_path(start);
    let target_parts: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let start_parts: Vec<&str> = start.split('/').filter(|s| !s.is_empty()).collect();

    let common = target_parts
        .iter()
        .zip(&start_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; start_parts.len() - common];
    parts.extend(&target_parts[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
