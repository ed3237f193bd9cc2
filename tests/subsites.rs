//! End-to-end builds with the reference static builder.
//!
//! Each test lays out a content tree in a temp directory, runs the
//! orchestrator on it and inspects the written sites.

use i18n_subsites::builder::BuilderRegistry;
use i18n_subsites::config::load_config;
use i18n_subsites::subsites::{self, Orchestrator, RunSummary};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// English and German content with one German-only article.
fn setup(subsites: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let content = tmp.path().join("content");
    let output = tmp.path().join("output");
    write(
        &content,
        "config.toml",
        &format!(
            "site_name = \"Test\"\noutput_path = '{}'\n\n{}",
            output.display(),
            subsites
        ),
    );
    write(&content, "articles/010-hello.md", "# Hello\n\nHello *world*.\n");
    write(
        &content,
        "articles/010-hello.de.md",
        "+++\ntitle = \"Hallo\"\ndate = 2024-03-05\n+++\nHallo *Welt*.\n",
    );
    write(&content, "articles/020-nur-deutsch.de.md", "# Nur Deutsch\n");
    write(&content, "pages/about.md", "# About\n");
    write(&content, "images/logo.png", "png");
    (tmp, output)
}

fn build(tmp: &TempDir) -> RunSummary {
    let config = load_config(&tmp.path().join("content")).unwrap();
    Orchestrator::new(BuilderRegistry::with_defaults())
        .run(config)
        .unwrap()
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[test]
fn builds_default_site_and_german_subsite() {
    let (tmp, output) = setup("[i18n.subsites.de]\n");
    let summary = build(&tmp);

    let langs: Vec<&str> = summary.sites.iter().map(|s| s.lang.as_str()).collect();
    assert_eq!(langs, vec!["en", "de"]);
    assert_eq!(summary.sites[1].root, "/de");
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.links.unresolved, 0);

    assert!(output.join("hello.html").exists());
    assert!(output.join("pages/about.html").exists());
    assert!(output.join("images/logo.png").exists());
    assert!(!output.join("nur-deutsch.html").exists());
    assert!(!output.join("nur-deutsch-de.html").exists());

    let de = output.join("de");
    assert!(de.join("hello.html").exists());
    assert!(de.join("nur-deutsch.html").exists());
    // Static files are shared with the default site, not copied
    assert!(!de.join("images/logo.png").exists());
}

#[test]
fn translations_link_across_sites() {
    let (tmp, output) = setup("[i18n.subsites.de]\n");
    build(&tmp);

    let en_hello = read(output.join("hello.html"));
    assert!(en_hello.contains(r#"hreflang="de" href="/de/hello.html""#));
    let de_hello = read(output.join("de/hello.html"));
    assert!(de_hello.contains(r#"hreflang="en" href="/hello.html""#));
    assert!(de_hello.contains(r#"<html lang="de">"#));
    assert!(de_hello.contains("<em>Welt</em>"));
    assert!(de_hello.contains("März"));

    let manifest: serde_json::Value =
        serde_json::from_str(&read(output.join("de/manifest.json"))).unwrap();
    let hello = manifest["pages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["source_id"] == "articles/010-hello.de.md")
        .unwrap();
    assert_eq!(hello["translations"][0]["url"], "../hello.html");
    let logo = &manifest["static_assets"][0];
    assert_eq!(logo["override_url"], "../images/logo.png");
}

#[test]
fn german_only_content_is_listed_on_german_site_only() {
    let (tmp, output) = setup("[i18n.subsites.de]\n");
    build(&tmp);

    assert!(!read(output.join("index.html")).contains("Nur Deutsch"));
    assert!(read(output.join("de/index.html")).contains("Nur Deutsch"));
}

#[test]
fn remove_policy_drops_untranslated_content() {
    let (tmp, output) = setup("[i18n]\nuntranslated_policy = \"remove\"\n\n[i18n.subsites.de]\n");
    let summary = build(&tmp);

    // nur-deutsch, plus the German hello that the English site links to
    assert_eq!(summary.sites[0].removed, 2);
    assert!(!output.join("nur-deutsch.html").exists());
    assert!(output.join("de/nur-deutsch.html").exists());
}

#[test]
fn keep_policy_does_not_publish_foreign_pages() {
    let (tmp, output) = setup("[i18n]\nuntranslated_policy = \"keep\"\n\n[i18n.subsites.de]\n");
    build(&tmp);

    assert!(!output.join("nur-deutsch.html").exists());
    assert!(output.join("de/nur-deutsch.html").exists());
}

#[test]
fn override_file_configures_subsite() {
    let (tmp, output) = setup(
        "site_url = \"https://example.com\"\n\n[i18n.subsites.de]\nfile = \"i18n/de.toml\"\n",
    );
    write(
        &tmp.path().join("content"),
        "i18n/de.toml",
        "site_name = \"Testseite\"\nsite_url = \"https://example.com/german\"\n",
    );
    let summary = build(&tmp);

    assert_eq!(summary.sites[1].root, "https://example.com/german");
    let de_hello = read(output.join("de/hello.html"));
    assert!(de_hello.contains("Testseite"));
    assert!(de_hello.contains(r#"href="https://example.com/hello.html""#));
    let en_hello = read(output.join("hello.html"));
    assert!(en_hello.contains(r#"href="https://example.com/german/hello.html""#));
}

#[test]
fn missing_override_file_skips_subsite() {
    let (tmp, output) =
        setup("[i18n.subsites.de]\n\n[i18n.subsites.fr]\nfile = \"i18n/fr.toml\"\n");
    let summary = build(&tmp);

    assert_eq!(summary.sites.len(), 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].lang, "fr");
    assert!(!output.join("fr").exists());
}

#[test]
fn malformed_subsite_entry_skips_only_that_subsite() {
    let (tmp, output) = setup("[i18n.subsites]\nde = {}\nfr = 42\nit = \"i18n/it.toml\"\n");
    write(&tmp.path().join("content"), "i18n/it.toml", "site_name = \"Sito\"\n");
    let summary = build(&tmp);

    let langs: Vec<&str> = summary.sites.iter().map(|s| s.lang.as_str()).collect();
    assert_eq!(langs, vec!["en", "de", "it"]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].lang, "fr");
    assert!(summary.skipped[0].reason.contains("i18n.subsites.fr"));
    assert!(read(output.join("it/index.html")).contains("Sito"));
    assert!(!output.join("fr").exists());
}

#[test]
fn no_subsites_builds_only_default_site() {
    let (tmp, output) = setup("");
    let summary = build(&tmp);

    assert_eq!(summary.sites.len(), 1);
    assert!(output.join("hello.html").exists());
    assert!(!output.join("de").exists());
}

#[test]
fn plan_matches_build() {
    let (tmp, _output) = setup("[i18n.subsites.de]\n");
    let config = load_config(&tmp.path().join("content")).unwrap();
    let plan = subsites::plan(&config, &BuilderRegistry::with_defaults()).unwrap();

    let planned: Vec<(&str, &str)> = plan
        .sites
        .iter()
        .map(|s| (s.lang.as_str(), s.root.as_str()))
        .collect();
    assert_eq!(planned, vec![("en", "/"), ("de", "/de")]);
    assert_eq!(plan.sites[1].output_path, config.output_path.join("de"));
}
