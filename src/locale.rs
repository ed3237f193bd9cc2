//! Scoped formatting locale.
//!
//! Dates on a page are formatted in the language of the site that publishes
//! them. Every build runs inside a [`LocaleGuard`] that installs the build's
//! locale and puts the previous one back when the guard is dropped, so a
//! failed nested build cannot leak its locale into the parent build.
//!
//! The active locale is tracked per thread. Builds are strictly sequential
//! on the orchestrating thread, so for the duration of a run this is the
//! process-wide setting without the hazards of mutating the C runtime's
//! `setlocale` state.

use chrono::{Locale, NaiveDate};
use std::cell::RefCell;

/// Locale in effect when nothing has been acquired.
pub const DEFAULT_LOCALE: &str = "POSIX";

thread_local! {
    static ACTIVE_LOCALE: RefCell<String> = RefCell::new(DEFAULT_LOCALE.to_string());
}

/// Name of the locale currently in effect.
pub fn current_locale() -> String {
    ACTIVE_LOCALE.with(|active| active.borrow().clone())
}

/// Replace the active locale, returning the previous one.
///
/// Prefer [`LocaleGuard`]; a bare `set_locale` is never undone.
pub fn set_locale(name: &str) -> String {
    ACTIVE_LOCALE.with(|active| active.replace(name.to_string()))
}

/// Restores the locale that was active when it was created.
#[must_use = "the previous locale is restored when the guard is dropped"]
#[derive(Debug)]
pub struct LocaleGuard {
    previous: String,
}

impl LocaleGuard {
    /// Install `name` until the guard is dropped.
    pub fn acquire(name: &str) -> Self {
        Self {
            previous: set_locale(name),
        }
    }
}

impl Drop for LocaleGuard {
    fn drop(&mut self) {
        set_locale(&self.previous);
    }
}

/// Map a locale name to chrono's formatting tables.
///
/// Accepts `de_DE`, `de-DE`, `de_DE.UTF-8`, `de_DE@euro` and bare language
/// tags like `de` (tried as `de_DE`). Anything unknown formats as POSIX.
pub fn resolve_locale(name: &str) -> Locale {
    let base = name
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('-', "_");
    if base.is_empty() || base == "C" {
        return Locale::POSIX;
    }
    if let Ok(locale) = Locale::try_from(base.as_str()) {
        return locale;
    }
    if !base.contains('_') {
        let guessed = format!("{}_{}", base.to_lowercase(), base.to_uppercase());
        if let Ok(locale) = Locale::try_from(guessed.as_str()) {
            return locale;
        }
    }
    tracing::debug!(locale = %name, "Unknown locale, formatting as POSIX");
    Locale::POSIX
}

/// Format `date` with a strftime pattern in the active locale.
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let locale = resolve_locale(&current_locale());
    match date.and_hms_opt(0, 0, 0) {
        Some(midnight) => midnight
            .and_utc()
            .format_localized(pattern, locale)
            .to_string(),
        None => date.format(pattern).to_string(),
    }
}
