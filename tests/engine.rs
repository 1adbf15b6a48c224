use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use braces::{value, Config, Engine, ErrorKind, FileLoader, IncludeMode, MemoryLoader, Value};

#[test]
fn engine_debug() {
    let debug = format!("{:?}", Engine::new());
    assert!(debug.starts_with("Engine {"));
    assert!(debug.contains("strlen"));
}

#[test]
fn engine_send_and_sync() {
    let engine = Engine::new();
    thread::spawn(move || {
        let result = engine
            .compile_str("{LOREM}", "en")
            .unwrap()
            .render(value! { lorem: "ipsum" })
            .unwrap();
        assert_eq!(result, "ipsum");
    })
    .join()
    .unwrap();
}

#[test]
fn engine_get_compiles_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let mut engine = Engine::new();
    engine.set_loader(move |name: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        (name == "page").then(|| String::from("{X}"))
    });

    let a = engine.get("page", "en").unwrap();
    let b = engine.get("page", "en").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    engine.get("page", "fr").unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    engine.clear();
    let c = engine.get("page", "en").unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a, c);
    assert_eq!(loads.load(Ordering::SeqCst), 3);
}

#[test]
fn engine_get_concurrent() {
    let mut loader = MemoryLoader::new();
    loader.insert("page", "{FOREACH:ITEMS:X}{X}{ENDFOR}");
    let mut engine = Engine::new();
    engine.set_loader(loader);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    engine
                        .template("page", "en")
                        .unwrap()
                        .render(value! { items: [1, 2, 3] })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|r| r == "123"));
}

#[test]
fn engine_compile_is_not_registered() {
    let mut loader = MemoryLoader::new();
    loader.insert("page", "v1");
    let mut engine = Engine::new();
    engine.set_loader(loader);

    let program = engine.compile("page", "en").unwrap();
    assert_eq!(program.name(), "page");
    assert_eq!(program.language(), "en");
    assert_eq!(format!("{:?}", engine).matches("page").count(), 0);
}

#[test]
fn engine_register_program() {
    let engine = Engine::new();
    let program = engine.compile_str("registered {X}", "en").unwrap().into_program();
    assert_eq!(program.name(), "");

    let mut loader = MemoryLoader::new();
    loader.insert("page", "{INCLUDE:part}");
    loader.insert("part", "part {X}");
    let mut engine = Engine::new();
    engine.set_loader(loader);

    let part = engine.compile("part", "en").unwrap();
    engine.register(part);
    let result = engine
        .template("page", "en")
        .unwrap()
        .render(value! { x: 1 })
        .unwrap();
    assert_eq!(result, "part 1");
}

#[test]
fn engine_register_replaces() {
    let mut loader = MemoryLoader::new();
    loader.insert("page", "old");
    let mut engine = Engine::new();
    engine.set_loader(loader);
    engine.template("page", "en").unwrap();

    let mut loader = MemoryLoader::new();
    loader.insert("page", "new");
    let mut other = Engine::new();
    other.set_loader(loader);
    engine.register(other.compile("page", "en").unwrap());

    let result = engine.template("page", "en").unwrap().render(value! {}).unwrap();
    assert_eq!(result, "new");
}

#[test]
fn engine_template_err_missing() {
    let err = Engine::new().template("nope", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTemplate);
}

#[test]
fn engine_file_loader() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page.html"), "<p>{TITLE}</p>{INCLUDE: footer }").unwrap();
    fs::write(dir.path().join("footer.html"), "<footer/>").unwrap();
    fs::write(dir.path().join("page.tpl"), "tpl {TITLE}").unwrap();

    let mut engine = Engine::new();
    engine.set_loader(FileLoader::new(dir.path()));
    let result = engine
        .template("page", "en")
        .unwrap()
        .render(value! { title: "Hi" })
        .unwrap();
    assert_eq!(result, "<p>Hi</p><footer/>");

    let mut engine = Engine::new();
    engine.set_loader(FileLoader::new(dir.path()).with_extension("tpl"));
    let result = engine
        .template("page", "en")
        .unwrap()
        .render(value! { title: "Hi" })
        .unwrap();
    assert_eq!(result, "tpl Hi");
    assert_eq!(
        engine.template("footer", "en").unwrap_err().kind(),
        ErrorKind::MissingTemplate
    );
}

#[test]
fn engine_add_function() {
    let mut engine = Engine::new();
    engine.add_function("double", |args: &[Value]| match args {
        [Value::Integer(i)] => Some(i * 2),
        _ => None,
    });
    engine.add_function("greet", |args: &[Value]| -> String {
        format!("hi {}", args.len())
    });
    let result = engine
        .compile_str("{double(N)}|{double('x')}|{greet(1, 2)}", "en")
        .unwrap()
        .render(value! { n: 21 })
        .unwrap();
    assert_eq!(result, "42||hi 2");
}

#[test]
fn engine_add_function_overrides_builtin() {
    let mut engine = Engine::new();
    engine.add_function("strlen", |_: &[Value]| 0_i64);
    let result = engine
        .compile_str("{strlen('abc')}", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "0");
}

#[test]
fn engine_config_from_json() {
    let config: Config =
        serde_json::from_str(r#"{ "include_mode": "inline", "max_include_depth": 3 }"#).unwrap();
    assert_eq!(config.include_mode(), IncludeMode::Inline);
    assert_eq!(config.max_include_depth(), 3);
    assert_eq!(config.max_include_expansions(), 64);
    assert_eq!(config.cache_dir(), None);

    let engine = Engine::with_config(config.clone());
    assert_eq!(engine.config(), &config);
}

#[test]
fn engine_config_defaults() {
    let config = Config::default();
    assert_eq!(config.include_mode(), IncludeMode::Delegate);
    assert_eq!(config.max_include_expansions(), 64);
    assert_eq!(config.max_include_depth(), 64);
    assert_eq!(Config::builder().build(), config);
}
