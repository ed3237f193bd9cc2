//! HTML site generation for the reference site builder.
//!
//! Runs when the orchestrator finalizes, so every translation link already
//! points at the site that publishes the translated document.
//!
//! ## Generated Files
//!
//! ```text
//! output/                        # Default site
//! ├── index.html                 # Article list
//! ├── hello.html                 # Articles (article_save_as)
//! ├── pages/about.html           # Pages (page_save_as)
//! ├── images/logo.png            # Static files of this build
//! ├── theme/style.css            # Theme static files (if a theme is set)
//! ├── manifest.json              # Pages and resolved translation links
//! └── de/                        # Subsite, same layout
//!     └── ...
//! ```
//!
//! Only published items in the build's language become pages. Hidden items,
//! and foreign items kept by the `keep` policy, are link targets for other
//! sites and are never written here.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating and
//! pulldown-cmark for markdown bodies. UI strings go through the build's
//! translation catalog.

use crate::builder::{BuildError, BuildOutput, PageRenderer};
use crate::config::SiteConfig;
use crate::content::{ContentItem, ContentKind, ContentStatus, Generator, StaticAsset};
use crate::subsites::{CrossSiteContext, join_url, site_path};
use crate::subsites::sites::normalize_path;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

const CSS: &str = "\
body { font-family: system-ui, sans-serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; }
header.site-header { display: flex; justify-content: space-between; align-items: baseline; }
nav.languages a, nav.translations a { margin-left: 0.5rem; }
article .date { color: #666; font-size: 0.9rem; }
";

/// Absolute address of `url`, a path relative to the site at `site_url`.
///
/// Full URLs stay full URLs; bare roots produce root-relative paths.
pub fn site_href(site_url: &str, url: &str) -> String {
    let root = format!("{}/", site_url.trim_end_matches('/'));
    if let Ok(joined) = Url::parse(&root).and_then(|base| base.join(url)) {
        return joined.to_string();
    }
    normalize_path(&join_url(&site_path(&root), url))
}

/// Writes a build's pages when the orchestrator finalizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl PageRenderer for HtmlRenderer {
    fn render(&mut self, output: &BuildOutput<'_>) -> Result<(), BuildError> {
        write_site(output)?;
        Ok(())
    }
}

// ============================================================================
// Manifest
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SiteManifest<'a> {
    pub lang: &'a str,
    pub site_url: &'a str,
    pub sites: Vec<ManifestSite<'a>>,
    pub pages: Vec<ManifestPage<'a>>,
    pub static_assets: &'a [StaticAsset],
}

#[derive(Debug, Serialize)]
pub struct ManifestSite<'a> {
    pub lang: &'a str,
    pub root: &'a str,
    pub relpath: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ManifestPage<'a> {
    pub source_id: &'a str,
    pub kind: ContentKind,
    pub lang: &'a str,
    pub title: &'a str,
    pub url: &'a str,
    pub save_as: &'a str,
    pub translations: Vec<ManifestLink<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ManifestLink<'a> {
    pub lang: &'a str,
    pub url: &'a str,
}

pub fn build_manifest<'a>(output: &BuildOutput<'a>) -> SiteManifest<'a> {
    let context = output.context;
    SiteManifest {
        lang: &output.config.default_lang,
        site_url: &output.config.site_url,
        sites: context
            .lang_siteurls
            .iter()
            .map(|(lang, root)| ManifestSite {
                lang,
                root,
                relpath: context.relpath_to(lang),
            })
            .collect(),
        pages: published(output.generators, &output.config.default_lang)
            .map(|item| ManifestPage {
                source_id: &item.source_id,
                kind: item.kind,
                lang: &item.lang,
                title: &item.title,
                url: item.resolved_url(),
                save_as: &item.save_as,
                translations: item
                    .translations
                    .iter()
                    .map(|t| ManifestLink {
                        lang: &t.lang,
                        url: t.resolved_url(),
                    })
                    .collect(),
            })
            .collect(),
        static_assets: output.static_assets,
    }
}

/// Items this build writes as pages: published and in the build's language.
/// Foreign items kept in the list only serve as link targets.
fn published<'a>(
    generators: &'a [Generator],
    lang: &'a str,
) -> impl Iterator<Item = &'a ContentItem> {
    generators
        .iter()
        .flat_map(|g| g.items.iter())
        .filter(move |i| i.status == ContentStatus::Published && i.lang == lang)
}

// ============================================================================
// Writing
// ============================================================================

/// Write every page, static file and the manifest of one build.
pub fn write_site(output: &BuildOutput<'_>) -> Result<(), GenerateError> {
    let config = output.config;
    let out = &config.output_path;
    fs::create_dir_all(out)?;

    let mut pages = 0;
    for item in published(output.generators, &output.config.default_lang) {
        let path = out.join(&item.save_as);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, render_item(item, output).into_string())?;
        pages += 1;
    }
    fs::write(out.join("index.html"), render_index(output).into_string())?;

    let mut copied = 0;
    for asset in output.static_assets.iter().filter(|a| a.override_url.is_none()) {
        let target = out.join(&asset.url);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(config.content_root.join(&asset.source_path), target)?;
        copied += 1;
    }

    if let Some(theme) = &config.theme {
        let theme_out = out.join(&config.theme_static_dir);
        for dir in &config.theme_static_paths {
            copied += copy_dir_recursive(&theme.join(dir), &theme_out)?;
        }
    }

    let manifest = serde_json::to_string_pretty(&build_manifest(output))?;
    fs::write(out.join("manifest.json"), manifest)?;

    tracing::info!(
        lang = %config.default_lang,
        output = %out.display(),
        pages,
        copied,
        "Wrote site"
    );
    Ok(())
}

/// Copy the files under `src` into `dst`. A missing `src` copies nothing.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Whether the theme ships a top-level `style.css` in one of its copied
/// directories.
///
/// A subsite sharing the default site's theme files has no
/// `theme_static_paths` of its own, so every directory of the theme counts.
fn theme_has_stylesheet(config: &SiteConfig) -> bool {
    let Some(theme) = &config.theme else {
        return false;
    };
    if !config.theme_static_paths.is_empty() {
        return config
            .theme_static_paths
            .iter()
            .any(|dir| theme.join(dir).join("style.css").is_file());
    }
    fs::read_dir(theme)
        .map(|entries| {
            entries
                .flatten()
                .any(|entry| entry.path().join("style.css").is_file())
        })
        .unwrap_or(false)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(output: &BuildOutput<'_>, title: &str, content: Markup) -> Markup {
    let config = output.config;
    let stylesheet = theme_has_stylesheet(config).then(|| {
        site_href(
            &config.site_url,
            &join_url(&config.theme_static_dir, "style.css"),
        )
    });
    html! {
        (DOCTYPE)
        html lang=(config.default_lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · " (config.site_name) }
                style { (PreEscaped(CSS)) }
                @if let Some(href) = stylesheet {
                    link rel="stylesheet" href=(href);
                }
            }
            body {
                (site_header(output))
                main { (content) }
            }
        }
    }
}

/// Site name plus links to the sibling language sites.
fn site_header(output: &BuildOutput<'_>) -> Markup {
    let config = output.config;
    let context = output.context;
    html! {
        header.site-header {
            a.site-name href=(site_href(&config.site_url, "index.html")) { (config.site_name) }
            @if !context.extra_siteurls.is_empty() {
                nav.languages {
                    (context.gettext("Other languages")) ":"
                    @for (lang, _) in &context.extra_siteurls {
                        a hreflang=(lang) href=(sibling_href(config.site_url.as_str(), context, lang)) {
                            (lang)
                        }
                    }
                }
            }
        }
    }
}

fn sibling_href(site_url: &str, context: &CrossSiteContext, lang: &str) -> String {
    site_href(site_url, &join_url(context.relpath_to(lang), "index.html"))
}

/// Links to the translations of `item`.
fn translation_links(item: &ContentItem, output: &BuildOutput<'_>) -> Markup {
    html! {
        @if !item.translations.is_empty() {
            nav.translations {
                (output.context.gettext("Translations")) ":"
                @for t in &item.translations {
                    a hreflang=(t.lang) href=(site_href(&output.config.site_url, t.resolved_url())) {
                        (t.lang)
                    }
                }
            }
        }
    }
}

fn markdown(body: &str) -> String {
    let mut rendered = String::new();
    md_html::push_html(&mut rendered, Parser::new(body));
    rendered
}

/// Renders an article or page.
fn render_item(item: &ContentItem, output: &BuildOutput<'_>) -> Markup {
    let content = html! {
        article class=(item.kind.as_str()) {
            @if let Some(date) = &item.locale_date {
                p.date { (output.context.gettext("Published")) " " (date) }
            }
            (translation_links(item, output))
            (PreEscaped(markdown(&item.body)))
        }
    };
    base_document(output, &item.title, content)
}

/// Renders the article list, newest first, and the page list.
fn render_index(output: &BuildOutput<'_>) -> Markup {
    let config = output.config;
    let context = output.context;
    let lang = config.default_lang.as_str();
    let mut articles: Vec<&ContentItem> = published(output.generators, lang)
        .filter(|i| i.kind == ContentKind::Article)
        .collect();
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    let pages: Vec<&ContentItem> = published(output.generators, lang)
        .filter(|i| i.kind == ContentKind::Page)
        .collect();

    let content = html! {
        h1 { (config.site_name) }
        section.articles {
            h2 { (context.gettext("Articles")) }
            ul {
                @for item in &articles {
                    li {
                        a href=(site_href(&config.site_url, item.resolved_url())) { (item.title) }
                        @if let Some(date) = &item.locale_date {
                            " " span.date { (date) }
                        }
                    }
                }
            }
        }
        @if !pages.is_empty() {
            section.pages {
                h2 { (context.gettext("Pages")) }
                ul {
                    @for item in &pages {
                        li { a href=(site_href(&config.site_url, item.resolved_url())) { (item.title) } }
                    }
                }
            }
        }
    };
    base_document(output, context.gettext("Home"), content)
}

// ============================================================================
// Tests
// ============================================================================
