//! Content scanning for the reference site builder.
//!
//! Reads the corpus of one build: markdown articles and pages plus the
//! static files the build publishes.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                         # Content root
//! ├── config.toml                  # Site configuration (optional)
//! ├── articles/
//! │   ├── 010-hello.md             # Article in the content language
//! │   ├── 010-hello.de.md          # Its German translation (same slug)
//! │   └── 020-nur-deutsch.de.md    # German only
//! ├── pages/
//! │   └── about.md
//! ├── images/                      # Static files (static_paths)
//! │   └── logo.png
//! └── translations/                # Template catalogs (optional)
//!     └── de/messages.toml
//! ```
//!
//! ## Front Matter
//!
//! A document may start with a TOML block between `+++` lines:
//!
//! ```text
//! +++
//! title = "Hallo Welt"
//! date = 2024-03-05
//! lang = "de"          # overrides the file-name suffix
//! slug = "hello"       # overrides the file-name slug
//! status = "hidden"    # published | hidden | draft
//! +++
//! ```
//!
//! Without a `title`, the first `# heading` is used, then the file name.
//! Drafts are not read at all.
//!
//! A file-name suffix is a language only when some site of the run uses it:
//! `intro.api.md` is the article `intro.api` in the content language.

use crate::builder::{BuildError, LifecycleHooks, SiteBuilder};
use crate::config::{SiteConfig, expand_pattern};
use crate::content::{
    ContentItem, ContentKind, ContentStatus, Generator, StaticAsset, TranslationRef,
};
use crate::generate::HtmlRenderer;
use crate::locale::format_date;
use crate::naming::{parse_entry_name, parse_entry_name_with};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Front matter is not closed with +++ in {0}")]
    UnclosedFrontMatter(PathBuf),
    #[error("Invalid date '{value}' in {path}")]
    InvalidDate { path: PathBuf, value: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FrontMatter {
    title: Option<String>,
    date: Option<toml::value::Datetime>,
    lang: Option<String>,
    slug: Option<String>,
    status: Option<ContentStatus>,
}

/// Directory of a content kind under the content root.
pub fn kind_dir(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Article => "articles",
        ContentKind::Page => "pages",
    }
}

/// Split a document into its front matter and body.
///
/// Returns `Ok(None)` for the front matter when the text does not start
/// with a `+++` line, and `Err(())` when the block is never closed.
fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), ()> {
    let Some(rest) = text
        .strip_prefix("+++\n")
        .or_else(|| text.strip_prefix("+++\r\n"))
    else {
        return Ok((None, text));
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "+++" {
            let body = &rest[offset + line.len()..];
            return Ok((Some(&rest[..offset]), body));
        }
        offset += line.len();
    }
    Err(())
}

/// First `# heading` of a markdown body.
fn first_heading(body: &str) -> Option<&str> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

fn to_naive_date(datetime: &toml::value::Datetime, path: &Path) -> Result<NaiveDate, ScanError> {
    datetime
        .date
        .and_then(|d| NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into()))
        .ok_or_else(|| ScanError::InvalidDate {
            path: path.to_path_buf(),
            value: datetime.to_string(),
        })
}

/// `path` relative to `root`, with `/` separators.
fn relative_id(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read one markdown document as seen by the build of `config`.
///
/// Returns `Ok(None)` for drafts.
pub fn read_document(
    config: &SiteConfig,
    path: &Path,
    kind: ContentKind,
) -> Result<Option<ContentItem>, ScanError> {
    let text = fs::read_to_string(path)?;
    let (front, body) = split_front_matter(&text)
        .map_err(|()| ScanError::UnclosedFrontMatter(path.to_path_buf()))?;
    let front: FrontMatter = match front {
        Some(block) => toml::from_str(block).map_err(|source| ScanError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?,
        None => FrontMatter::default(),
    };

    let status = front.status.unwrap_or_default();
    if status == ContentStatus::Draft {
        tracing::debug!(path = %path.display(), "Skipping draft");
        return Ok(None);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let langs = config.site_langs();
    let parsed = parse_entry_name_with(&stem, |tag| langs.iter().any(|l| *l == tag));
    if let (None, None, Some(tag)) = (&parsed.lang, &front.lang, parse_entry_name(&stem).lang) {
        tracing::debug!(
            path = %path.display(),
            suffix = %tag,
            "Suffix is not a language of this run, keeping it in the slug"
        );
    }
    let slug = front.slug.unwrap_or(parsed.slug);
    let lang = front
        .lang
        .or(parsed.lang)
        .unwrap_or_else(|| config.content_lang().to_string());
    let title = front
        .title
        .or_else(|| first_heading(body).map(str::to_string))
        .unwrap_or(parsed.display_title);
    let date = front
        .date
        .as_ref()
        .map(|d| to_naive_date(d, path))
        .transpose()?;

    let urls = &config.urls;
    let native = lang == config.default_lang;
    let (url_pattern, save_pattern) = match (kind, native) {
        (ContentKind::Article, true) => (&urls.article_url, &urls.article_save_as),
        (ContentKind::Article, false) => (&urls.article_lang_url, &urls.article_lang_save_as),
        (ContentKind::Page, true) => (&urls.page_url, &urls.page_save_as),
        (ContentKind::Page, false) => (&urls.page_lang_url, &urls.page_lang_save_as),
    };

    Ok(Some(ContentItem {
        source_id: relative_id(path, &config.content_root),
        kind,
        url: expand_pattern(url_pattern, &slug, &lang),
        save_as: expand_pattern(save_pattern, &slug, &lang),
        locale_date: date.map(|d| format_date(d, &config.date_format)),
        date,
        lang,
        slug,
        title,
        body: body.trim_start().to_string(),
        status,
        translations: Vec::new(),
        override_url: None,
    }))
}

/// Markdown files of one kind, sorted by file name.
fn document_paths(config: &SiteConfig, kind: ContentKind) -> Result<Vec<PathBuf>, ScanError> {
    let dir = config.content_root.join(kind_dir(kind));
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Group items into translation sets and pick the item each set publishes.
///
/// Items with the same slug are translations of one another. The item in
/// `lang` is published, otherwise the one with the lowest language tag. The
/// rest go to the generator's translations. Every item references all its
/// siblings.
pub fn assemble(kind: ContentKind, lang: &str, items: Vec<ContentItem>) -> Generator {
    let mut groups: Vec<Vec<ContentItem>> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g[0].slug == item.slug) {
            Some(group) => group.push(item),
            None => groups.push(vec![item]),
        }
    }

    let mut generator = Generator::new(kind, lang);
    for mut group in groups {
        let refs: Vec<TranslationRef> = group.iter().map(ContentItem::as_translation).collect();
        for item in &mut group {
            item.translations = refs
                .iter()
                .filter(|r| r.source_id != item.source_id)
                .cloned()
                .collect();
        }

        let main = group
            .iter()
            .position(|i| i.lang == lang)
            .or_else(|| {
                group
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.lang.cmp(&b.lang))
                    .map(|(idx, _)| idx)
            })
            .unwrap_or(0);
        let main_item = group.remove(main);
        if main_item.status == ContentStatus::Hidden {
            generator.hidden.push(main_item);
        } else {
            generator.items.push(main_item);
        }
        generator.translations.extend(group);
    }
    generator
}

/// Read all content of `kind` for the build of `config`.
pub fn scan_kind(config: &SiteConfig, kind: ContentKind) -> Result<Generator, ScanError> {
    let mut items = Vec::new();
    for path in document_paths(config, kind)? {
        if let Some(item) = read_document(config, &path, kind)? {
            items.push(item);
        }
    }
    Ok(assemble(kind, &config.default_lang, items))
}

/// Files under the build's `static_paths`, sorted by path.
pub fn scan_static(config: &SiteConfig) -> Result<Vec<StaticAsset>, ScanError> {
    let mut assets = Vec::new();
    for static_path in &config.static_paths {
        let dir = config.content_root.join(static_path);
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "Static path does not exist");
            continue;
        }
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let id = relative_id(entry.path(), &config.content_root);
            assets.push(StaticAsset {
                source_path: id.clone(),
                url: id,
                override_url: None,
            });
        }
    }
    Ok(assets)
}

/// The reference site builder: markdown in, HTML out.
#[derive(Debug, Clone)]
pub struct StaticBuilder {
    config: SiteConfig,
}

impl StaticBuilder {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }
}

impl SiteBuilder for StaticBuilder {
    fn run(&mut self, hooks: &mut dyn LifecycleHooks) -> Result<(), BuildError> {
        hooks.on_init(&mut self.config);
        let lang = self.config.default_lang.clone();
        tracing::info!(
            lang = %lang,
            content = %self.config.content_root.display(),
            "Scanning content"
        );

        for kind in [ContentKind::Article, ContentKind::Page] {
            let generator = scan_kind(&self.config, kind)?;
            hooks.on_content_filter(generator);
        }
        let assets = scan_static(&self.config)?;
        hooks.on_static_assets_finalized(&lang, assets);
        hooks.on_pre_write(&lang, Box::new(HtmlRenderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::item;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn config_at(root: &Path, lang: &str) -> SiteConfig {
        let mut config = SiteConfig {
            content_root: root.to_path_buf(),
            default_lang: lang.to_string(),
            ..SiteConfig::default()
        };
        config.i18n.content_lang = Some("en".to_string());
        config.i18n.run_langs = vec!["cz".to_string(), "de".to_string()];
        config
    }

    #[test]
    fn front_matter_is_split_from_body() {
        let (front, body) = split_front_matter("+++\ntitle = \"x\"\n+++\n# Body\n").unwrap();
        assert_eq!(front, Some("title = \"x\"\n"));
        assert_eq!(body, "# Body\n");

        let (front, body) = split_front_matter("# Just markdown\n").unwrap();
        assert_eq!(front, None);
        assert_eq!(body, "# Just markdown\n");

        assert!(split_front_matter("+++\ntitle = \"x\"\n").is_err());
    }

    #[test]
    fn read_document_uses_file_name_and_heading() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/010-hello.de.md", "# Hallo Welt\n\nText.");
        let config = config_at(tmp.path(), "en");

        let item = read_document(
            &config,
            &tmp.path().join("articles/010-hello.de.md"),
            ContentKind::Article,
        )
        .unwrap()
        .unwrap();
        assert_eq!(item.source_id, "articles/010-hello.de.md");
        assert_eq!(item.slug, "hello");
        assert_eq!(item.lang, "de");
        assert_eq!(item.title, "Hallo Welt");
        assert_eq!(item.url, "hello-de.html");
        assert_eq!(item.save_as, "hello-de.html");
        assert_eq!(item.status, ContentStatus::Published);
    }

    #[test]
    fn suffix_outside_the_run_languages_is_part_of_the_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/intro.api.md", "# API\n");
        let config = config_at(tmp.path(), "en");

        let item = read_document(
            &config,
            &tmp.path().join("articles/intro.api.md"),
            ContentKind::Article,
        )
        .unwrap()
        .unwrap();
        assert_eq!(item.slug, "intro.api");
        assert_eq!(item.lang, "en");
        assert_eq!(item.url, "intro.api.html");
    }

    #[test]
    fn read_document_front_matter_wins() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "pages/about.md",
            "+++\ntitle = \"Über uns\"\nlang = \"de\"\nslug = \"ueber\"\ndate = 2024-03-05\nstatus = \"hidden\"\n+++\n# Ignored\n",
        );
        let config = config_at(tmp.path(), "de");
        let item = read_document(&config, &tmp.path().join("pages/about.md"), ContentKind::Page)
            .unwrap()
            .unwrap();
        assert_eq!(item.title, "Über uns");
        assert_eq!(item.lang, "de");
        assert_eq!(item.slug, "ueber");
        assert_eq!(item.url, "pages/ueber.html");
        assert_eq!(item.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(item.locale_date.is_some());
        assert_eq!(item.status, ContentStatus::Hidden);
    }

    #[test]
    fn read_document_without_lang_uses_content_lang() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/notes.md", "Plain text");
        let config = config_at(tmp.path(), "de");
        let item = read_document(&config, &tmp.path().join("articles/notes.md"), ContentKind::Article)
            .unwrap()
            .unwrap();
        assert_eq!(item.lang, "en");
        assert_eq!(item.title, "notes");
    }

    #[test]
    fn drafts_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/wip.md", "+++\nstatus = \"draft\"\n+++\nLater");
        let config = config_at(tmp.path(), "en");
        let item = read_document(&config, &tmp.path().join("articles/wip.md"), ContentKind::Article)
            .unwrap();
        assert!(item.is_none());
    }

    #[test]
    fn bad_front_matter_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/bad.md", "+++\nauthor = \"me\"\n+++\n");
        let config = config_at(tmp.path(), "en");
        let result = read_document(&config, &tmp.path().join("articles/bad.md"), ContentKind::Article);
        assert!(matches!(result, Err(ScanError::FrontMatter { .. })));
    }

    #[test]
    fn assemble_publishes_build_language() {
        let items = vec![
            item("articles/hello.md", "en", "hello"),
            item("articles/hello.de.md", "de", "hello"),
            item("articles/only.cz.md", "cz", "only"),
            item("articles/only.fr.md", "fr", "only"),
        ];
        let generator = assemble(ContentKind::Article, "de", items);

        let published: Vec<&str> = generator.items.iter().map(|i| i.source_id.as_str()).collect();
        assert_eq!(published, vec!["articles/hello.de.md", "articles/only.cz.md"]);
        let set_aside: Vec<&str> = generator
            .translations
            .iter()
            .map(|i| i.source_id.as_str())
            .collect();
        assert_eq!(set_aside, vec!["articles/hello.md", "articles/only.fr.md"]);

        let hello = &generator.items[0];
        assert_eq!(hello.translations.len(), 1);
        assert_eq!(hello.translations[0].source_id, "articles/hello.md");
        assert_eq!(generator.translations[0].translations[0].source_id, "articles/hello.de.md");
    }

    #[test]
    fn scan_kind_reads_sorted_documents() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "articles/020-second.md", "# Second");
        write(tmp.path(), "articles/010-first.md", "# First");
        write(tmp.path(), "articles/010-first.de.md", "# Erster");
        write(tmp.path(), "articles/readme.txt", "not content");
        let config = config_at(tmp.path(), "en");

        let generator = scan_kind(&config, ContentKind::Article).unwrap();
        let titles: Vec<&str> = generator.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(generator.translations.len(), 1);
        assert_eq!(generator.locale, "en");
    }

    #[test]
    fn scan_kind_without_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let generator = scan_kind(&config_at(tmp.path(), "en"), ContentKind::Page).unwrap();
        assert!(generator.items.is_empty());
    }

    #[test]
    fn scan_static_lists_files() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "images/logo.png", "png");
        write(tmp.path(), "images/sub/photo.jpg", "jpg");
        let config = config_at(tmp.path(), "en");

        let assets = scan_static(&config).unwrap();
        let urls: Vec<&str> = assets.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["images/logo.png", "images/sub/photo.jpg"]);
    }

    #[test]
    fn scan_static_without_paths_is_empty() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "images/logo.png", "png");
        let mut config = config_at(tmp.path(), "de");
        config.static_paths.clear();
        assert!(scan_static(&config).unwrap().is_empty());
    }
}
