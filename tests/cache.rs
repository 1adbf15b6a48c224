use std::fs;
use std::path::Path;

use braces::{value, Config, Engine, ErrorKind, MemoryLoader, Program};

fn engine<const N: usize>(dir: &Path, templates: [(&str, &str); N]) -> Engine {
    let config = Config::builder().cache_dir(dir).build();
    let mut engine = Engine::with_config(config);
    engine.set_loader(templates.into_iter().collect::<MemoryLoader>());
    engine
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[test]
fn cache_publishes_on_first_get() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), [("page", "Hello {NAME}")]);

    let template = engine.template("page", "en").unwrap();
    assert_eq!(template.render(value! { name: "x" }).unwrap(), "Hello x");
    assert_eq!(entries(dir.path()), ["template.en.page.json"]);

    let json = fs::read_to_string(dir.path().join("template.en.page.json")).unwrap();
    let program: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(&program, template.program());
}

#[test]
fn cache_is_reused_by_another_engine() {
    let dir = tempfile::tempdir().unwrap();
    engine(dir.path(), [("page", "{TR:Hi} {NAME}")])
        .template("page", "en")
        .unwrap();

    // No template source is available, the artifact must come from disk.
    let other = engine(dir.path(), []);
    let result = other
        .template("page", "en")
        .unwrap()
        .render(value! { name: "x" })
        .unwrap();
    assert_eq!(result, "Hi x");
}

#[test]
fn cache_is_keyed_by_language() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(dir.path(), [("page", "{TR:Hi}")]);
    engine.set_translator(|phrase: &str, language: &str| format!("{phrase}-{language}"));

    engine.template("page", "en").unwrap();
    engine.template("page", "fr").unwrap();
    assert_eq!(
        entries(dir.path()),
        ["template.en.page.json", "template.fr.page.json"]
    );
}

#[test]
fn cache_names_are_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), [("blog/post", "x")]);
    engine.template("blog/post", "pt-BR").unwrap();
    assert_eq!(entries(dir.path()), ["template.pt_BR.blog_post.json"]);
}

#[test]
fn cache_colliding_names_are_not_mixed_up() {
    let dir = tempfile::tempdir().unwrap();
    let result = engine(dir.path(), [("blog/post", "POST PAGE")])
        .template("blog/post", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "POST PAGE");

    let other = engine(dir.path(), [("blog_post", "OTHER PAGE")]);
    let template = other.template("blog_post", "en").unwrap();
    assert_eq!(template.program().name(), "blog_post");
    assert_eq!(template.render(value! {}).unwrap(), "OTHER PAGE");

    let other = engine(dir.path(), [("page", "x")]);
    engine(dir.path(), [("page", "EN")])
        .template("page", "en-US")
        .unwrap();
    let template = other.template("page", "en_US").unwrap();
    assert_eq!(template.program().language(), "en_US");
    assert_eq!(template.render(value! {}).unwrap(), "x");
}

#[test]
fn cache_failed_compile_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), [("page", "{IF:A}unclosed")]);
    let err = engine.template("page", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedBlock);
    assert!(entries(dir.path()).is_empty());
}

#[test]
fn cache_failed_compile_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    engine(dir.path(), [("page", "v1")])
        .template("page", "en")
        .unwrap();

    // A fresh compile of the broken source fails, but the published
    // artifact is untouched and still served on a cache miss.
    let broken = engine(dir.path(), [("page", "{ENDIF}")]);
    assert!(broken.compile("page", "en").is_err());
    let result = broken
        .template("page", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "v1");
    assert_eq!(entries(dir.path()), ["template.en.page.json"]);
}

#[test]
fn cache_clear_keeps_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path(), [("page", "v1")]);
    engine.template("page", "en").unwrap();
    engine.clear();
    assert_eq!(entries(dir.path()), ["template.en.page.json"]);
    let result = engine
        .template("page", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "v1");
}

#[test]
fn cache_err_corrupt_artifact() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("template.en.page.json"), "{ not json").unwrap();
    let engine = engine(dir.path(), [("page", "x")]);
    let err = engine.template("page", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialize);
    assert!(err.message().starts_with("failed to read `"));
}

#[test]
fn cache_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let engine = engine(&nested, [("page", "x")]);
    engine.template("page", "en").unwrap();
    assert_eq!(entries(&nested), ["template.en.page.json"]);
}
