//! CLI output formatting for build runs and plans.
//!
//! # Site-First Display
//!
//! Output lists **sites, not files**. Each site gets a header line with its
//! position, language and root. Output directory, content counts and link
//! status follow as indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Sites
//! 001 en → /
//!     Output: output
//!     Content: 3 published, 1 hidden
//!     Static: 2 files
//! 002 de → /de
//!     Output: output/de
//!     Content: 2 published, 2 hidden, 1 removed
//!     Static: 2 files (2 linked to the main site)
//!
//! Skipped
//!     cz: Cannot read overrides for 'cz' from i18n/cz.toml
//!
//! Built 2 sites, 4 translation links (1 unresolved)
//! ```
//!
//! ## Check
//!
//! ```text
//! Sites
//! 001 en → /
//!     Output: output
//!     Builder: static
//! 002 de → /de
//!     Output: output/de
//!     Builder: static
//!     Theme static: ../theme
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::subsites::{Plan, RunSummary, SkippedSubsite};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// ```text
/// 002 de → /de
/// ```
fn site_header(index: usize, lang: &str, root: &str) -> String {
    let root = if root.is_empty() { "/" } else { root };
    format!("{} {} → {}", format_index(index), lang, root)
}

fn format_skipped(skipped: &[SkippedSubsite]) -> Vec<String> {
    if skipped.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Skipped".to_string()];
    for s in skipped {
        lines.push(format!("{}{}: {}", indent(1), s.lang, s.reason));
    }
    lines
}

// ============================================================================
// Build
// ============================================================================

pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec!["Sites".to_string()];
    for (i, site) in summary.sites.iter().enumerate() {
        lines.push(site_header(i + 1, &site.lang, &site.root));
        lines.push(format!("{}Output: {}", indent(1), site.output_path.display()));

        let mut content = format!("{} published, {} hidden", site.published, site.hidden);
        if site.removed > 0 {
            content.push_str(&format!(", {} removed", site.removed));
        }
        lines.push(format!("{}Content: {}", indent(1), content));

        if site.static_assets > 0 {
            let files = plural(site.static_assets, "file");
            if site.linked_assets > 0 {
                lines.push(format!(
                    "{}Static: {} ({} linked to the main site)",
                    indent(1),
                    files,
                    site.linked_assets
                ));
            } else {
                lines.push(format!("{}Static: {}", indent(1), files));
            }
        }
    }

    lines.extend(format_skipped(&summary.skipped));

    let links = summary.links.resolved + summary.links.unresolved;
    let mut footer = format!(
        "Built {}, {}",
        plural(summary.sites.len(), "site"),
        plural(links, "translation link")
    );
    if summary.links.unresolved > 0 {
        footer.push_str(&format!(" ({} unresolved)", summary.links.unresolved));
    }
    lines.push(String::new());
    lines.push(footer);
    lines
}

pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_plan(plan: &Plan) -> Vec<String> {
    let mut lines = vec!["Sites".to_string()];
    for (i, site) in plan.sites.iter().enumerate() {
        lines.push(site_header(i + 1, &site.lang, &site.root));
        lines.push(format!("{}Output: {}", indent(1), site.output_path.display()));
        lines.push(format!("{}Builder: {}", indent(1), site.builder));
        if i > 0 {
            lines.push(format!("{}Theme static: {}", indent(1), site.theme_static_dir));
        }
    }
    lines.extend(format_skipped(&plan.skipped));
    lines
}

pub fn print_plan(plan: &Plan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
