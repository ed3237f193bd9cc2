//! # i18n-subsites
//!
//! Builds one static site per language from a single content tree. The site
//! in the default language lives at the root, and each translation gets a
//! subsite under its own root (`/de`, `https://example.com/german`, ...).
//! Every site is built from the default configuration with per-language
//! overrides applied on top.
//!
//! # Architecture: Nested Builds, Deferred Output
//!
//! ```text
//! 1. Default build   content/  →  generators      (published, hidden, translations)
//! 2. Subsite builds  run nested at the default build's write phase, one per language
//! 3. Finalize        resolve cross-site links, then write every site
//! ```
//!
//! Output is held back until every subsite has registered its root, so a
//! translation link can always point at the site that publishes the
//! translated document. A subsite that cannot be configured is skipped and
//! the others still build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`subsites`] | Orchestrator: job queue, site and content registries, link finalization |
//! | [`builder`] | Lifecycle hooks a site builder reports to, builder registry |
//! | [`config`] | `config.toml` loading, per-language override files, URL patterns |
//! | [`scan`] | Reference builder, read side: markdown documents and static files |
//! | [`generate`] | Reference builder, write side: HTML pages via Maud, site manifest |
//! | [`content`] | Content items, generators and static assets shared by all builders |
//! | [`naming`] | `NNN-slug[.lang]` file-name convention |
//! | [`locale`] | Process-wide active locale, scoped by guards |
//! | [`catalog`] | Per-language translation catalogs for template strings |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Builders Are Looked Up by Name
//!
//! The `builder` key of every configuration names an entry in a
//! [`builder::BuilderRegistry`]. Subsites can run a different builder than
//! the default site; a subsite naming an unknown builder is skipped.
//!
//! ## Content Is Filtered, Not Copied
//!
//! Every build sees the whole content tree. Items in another language are
//! hidden (or kept, or removed, per `i18n.untranslated_policy`) and their
//! links are pointed at the build that publishes them.
//!
//! ## Locale Is Scoped
//!
//! Each build runs in the locale of its configuration and restores the
//! previous one when it returns, so dates format per language even though
//! the builds are nested.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod content;
pub mod generate;
pub mod locale;
pub mod naming;
pub mod output;
pub mod scan;
pub mod subsites;

#[cfg(test)]
pub(crate) mod test_helpers;
