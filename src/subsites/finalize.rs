//! Second pass over all pending builds, once every site root is known.
//!
//! ```text
//! 1. interlink_translations   translation refs → relpath + canonical url
//! 2. interlink_static_assets  default-site assets → subsites without their own
//! 3. build_context            per-build view of all sites (+ catalog)
//! 4. render                   each build's renderer, in its own locale
//! ```

use super::content::{CanonicalContent, ContentRegistry};
use super::pending::{PendingBuild, PendingRegistry};
use super::sites::{SiteRegistry, join_url};
use crate::builder::{BuildError, BuildOutput};
use crate::catalog::{self, Catalog};
use crate::config::SiteConfig;
use crate::content::{ContentStatus, StaticAsset};
use crate::locale::LocaleGuard;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a build sees of the other sites of the run.
#[derive(Debug, Clone, Default)]
pub struct CrossSiteContext {
    /// Language of the build this context belongs to.
    pub lang: String,
    pub main_lang: String,
    pub main_siteurl: String,
    /// Every site, default first.
    pub lang_siteurls: Vec<(String, String)>,
    /// Every site except this one.
    pub extra_siteurls: Vec<(String, String)>,
    /// Relative path from this site's root to each site's root.
    pub relpath_to_site: BTreeMap<String, String>,
    pub canonical: ContentRegistry,
    pub static_assets: Vec<StaticAsset>,
    pub catalog: Catalog,
}

impl CrossSiteContext {
    /// Relative path to the root of `lang`; `.` for unknown languages.
    pub fn relpath_to(&self, lang: &str) -> &str {
        self.relpath_to_site.get(lang).map(String::as_str).unwrap_or(".")
    }

    /// Address of the canonical instance of `source_id`, relative to this
    /// site's root.
    pub fn canonical_url(&self, source_id: &str) -> Option<String> {
        self.canonical
            .get(source_id)
            .map(|c| join_url(self.relpath_to(&c.lang), &c.url))
    }

    pub fn canonical(&self, source_id: &str) -> Option<&CanonicalContent> {
        self.canonical.get(source_id)
    }

    pub fn gettext<'a>(&'a self, msgid: &'a str) -> &'a str {
        self.catalog.gettext(msgid)
    }
}

/// Translation links resolved during finalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub resolved: usize,
    /// Links to documents no build was authoritative for; left unchanged.
    pub unresolved: usize,
}

/// One finished site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub lang: String,
    pub root: String,
    pub output_path: PathBuf,
    pub published: usize,
    pub hidden: usize,
    pub removed: usize,
    pub static_assets: usize,
    /// Static assets linked from another site instead of copied.
    pub linked_assets: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalizeReport {
    pub sites: Vec<SiteSummary>,
    pub links: LinkStats,
}

/// Point every translation ref at the canonical instance of its document.
pub fn interlink_translations(
    pending: &mut PendingRegistry,
    sites: &mut SiteRegistry,
    canonical: &ContentRegistry,
) -> LinkStats {
    let mut stats = LinkStats::default();
    for item in pending.items_mut() {
        item.translations.sort_by(|a, b| a.lang.cmp(&b.lang));
        for translation in &mut item.translations {
            let relpath = sites.relative_path(&item.lang, &translation.lang);
            match canonical.get(&translation.source_id) {
                Some(target) => {
                    translation.override_url = Some(join_url(&relpath, &target.url));
                    stats.resolved += 1;
                }
                None => {
                    tracing::warn!(
                        source = %item.source_id,
                        translation = %translation.source_id,
                        lang = %translation.lang,
                        "Translation was never built in its own language, leaving link unresolved"
                    );
                    stats.unresolved += 1;
                }
            }
        }
    }
    stats
}

/// Make the default site's static assets available to subsites that do
/// not publish their own. The default build's assets are left untouched.
///
/// Returns the number of assets linked.
pub fn interlink_static_assets(
    pending: &mut PendingRegistry,
    sites: &mut SiteRegistry,
    main_assets: &[StaticAsset],
) -> usize {
    let main_lang = sites.default_lang().to_string();
    let mut linked = 0;
    for build in pending.iter_mut() {
        if build.lang == main_lang || !build.config.static_paths.is_empty() {
            continue;
        }
        let relpath = sites.relative_path(&build.lang, &main_lang);
        for asset in main_assets {
            if build
                .static_assets
                .iter()
                .any(|own| own.source_path == asset.source_path)
            {
                continue;
            }
            let mut copy = asset.clone();
            copy.override_url = Some(join_url(&relpath, &asset.url));
            build.static_assets.push(copy);
            linked += 1;
        }
    }
    linked
}

/// Catalog directory of a build: under the theme if one is set.
pub fn catalog_dir(config: &SiteConfig) -> PathBuf {
    match &config.theme {
        Some(theme) => theme.join(&config.i18n.translations_dir),
        None => config.content_root.join(&config.i18n.translations_dir),
    }
}

/// The catalog a build's templates translate with.
pub fn catalog_for(config: &SiteConfig) -> Catalog {
    if config.i18n.use_catalog {
        catalog::install(
            &catalog_dir(config),
            &config.i18n.gettext_domain,
            &config.default_lang,
        )
    } else {
        Catalog::identity(&config.default_lang)
    }
}

/// The cross-site view of `build`.
pub fn build_context(
    build: &PendingBuild,
    sites: &mut SiteRegistry,
    canonical: &ContentRegistry,
) -> CrossSiteContext {
    let main_lang = sites.default_lang().to_string();
    let lang_siteurls: Vec<(String, String)> = sites
        .iter()
        .map(|(lang, root)| (lang.to_string(), root.to_string()))
        .collect();
    let extra_siteurls = lang_siteurls
        .iter()
        .filter(|(lang, _)| *lang != build.lang)
        .cloned()
        .collect();
    let relpath_to_site = lang_siteurls
        .iter()
        .map(|(lang, _)| (lang.clone(), sites.relative_path(&build.lang, lang)))
        .collect();

    CrossSiteContext {
        lang: build.lang.clone(),
        main_siteurl: sites.root(&main_lang).to_string(),
        main_lang,
        lang_siteurls,
        extra_siteurls,
        relpath_to_site,
        canonical: canonical.clone(),
        static_assets: build.static_assets.clone(),
        catalog: catalog_for(&build.config),
    }
}

/// Published counts the items the build writes as its own pages. Foreign
/// items left in place by the `keep` policy only serve as link targets and
/// count as hidden.
fn summarize(build: &PendingBuild, root: &str) -> SiteSummary {
    let items = build.generators.iter().flat_map(|g| g.items.iter().chain(&g.hidden));
    let (mut published, mut hidden) = (0, 0);
    for item in items {
        if item.status == ContentStatus::Published && item.lang == build.lang {
            published += 1;
        } else {
            hidden += 1;
        }
    }
    SiteSummary {
        lang: build.lang.clone(),
        root: root.to_string(),
        output_path: build.config.output_path.clone(),
        published,
        hidden,
        removed: build.removed.len(),
        static_assets: build.static_assets.len(),
        linked_assets: build
            .static_assets
            .iter()
            .filter(|a| a.override_url.is_some())
            .count(),
    }
}

/// Resolve links, then write every pending build.
///
/// With nothing pending this does nothing, registries included.
pub fn run(
    pending: &mut PendingRegistry,
    sites: &mut SiteRegistry,
    canonical: &ContentRegistry,
    main_assets: &[StaticAsset],
) -> Result<FinalizeReport, BuildError> {
    if pending.is_empty() {
        return Ok(FinalizeReport::default());
    }

    let links = interlink_translations(pending, sites, canonical);
    let linked_assets = interlink_static_assets(pending, sites, main_assets);
    tracing::info!(
        sites = pending.len(),
        resolved = links.resolved,
        unresolved = links.unresolved,
        linked_assets,
        "Interlinked subsites"
    );

    let mut report = FinalizeReport {
        sites: Vec::with_capacity(pending.len()),
        links,
    };
    for build in pending.iter_mut() {
        let context = build_context(build, sites, canonical);
        report.sites.push(summarize(build, sites.root(&build.lang)));

        let Some(mut renderer) = build.renderer.take() else {
            tracing::warn!(lang = %build.lang, "Build never reached the write phase, nothing to render");
            continue;
        };
        let _locale = LocaleGuard::acquire(build.config.format_locale());
        renderer.render(&BuildOutput {
            config: &build.config,
            generators: &build.generators,
            static_assets: &build.static_assets,
            context: &context,
        })?;
        tracing::debug!(lang = %build.lang, "Rendered site");
    }
    Ok(report)
}
