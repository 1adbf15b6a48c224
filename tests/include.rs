use braces::{value, Config, Engine, ErrorKind, IncludeMode, MemoryLoader};

fn engine<const N: usize>(mode: IncludeMode, templates: [(&str, &str); N]) -> Engine {
    let config = Config::builder()
        .include_mode(mode)
        .max_include_expansions(8)
        .max_include_depth(8)
        .build();
    let mut engine = Engine::with_config(config);
    engine.set_loader(templates.into_iter().collect::<MemoryLoader>());
    engine
}

#[test]
fn include_inline_is_text_substitution() {
    let engine = engine(IncludeMode::Inline, [("a", "A{INCLUDE:B}C"), ("B", "b")]);
    let inlined = engine.template("a", "en").unwrap();
    let literal = engine.compile_str("AbC", "en").unwrap();
    assert_eq!(inlined.render(value! {}).unwrap(), "AbC");
    assert_eq!(
        inlined.render(value! {}).unwrap(),
        literal.render(value! {}).unwrap()
    );
    assert_eq!(inlined.program().source(), "AbC");
}

#[test]
fn include_inline_nested_and_repeated() {
    let engine = engine(
        IncludeMode::Inline,
        [
            ("page", "{INCLUDE:header}|{INCLUDE:sep}|{INCLUDE:sep}"),
            ("header", "<{INCLUDE:title}>"),
            ("title", "{TITLE}"),
            ("sep", "-"),
        ],
    );
    let template = engine.template("page", "en").unwrap();
    assert_eq!(template.program().variables(), ["TITLE"]);
    assert_eq!(
        template.render(value! { title: "Hi" }).unwrap(),
        "<Hi>|-|-"
    );
}

#[test]
fn include_inline_blocks_span_templates() {
    let engine = engine(
        IncludeMode::Inline,
        [
            ("page", "{INCLUDE:open}x{INCLUDE:close}"),
            ("open", "{IF:SHOW}"),
            ("close", "{ENDIF}"),
        ],
    );
    let template = engine.template("page", "en").unwrap();
    assert_eq!(template.render(value! { show: true }).unwrap(), "x");
    assert_eq!(template.render(value! { show: false }).unwrap(), "");
}

#[test]
fn include_inline_uses_includer_language() {
    let mut engine = engine(
        IncludeMode::Inline,
        [("page", "{INCLUDE:greeting}"), ("greeting", "{TR:Hello}")],
    );
    engine.set_translator(|phrase: &str, language: &str| match (phrase, language) {
        ("Hello", "fr") => String::from("Bonjour"),
        (phrase, _) => phrase.to_owned(),
    });
    let result = engine.template("page", "fr").unwrap().render(value! {}).unwrap();
    assert_eq!(result, "Bonjour");
}

#[test]
fn include_inline_escaped_directive_is_not_expanded() {
    let engine = engine(IncludeMode::Inline, [("page", "{{INCLUDE:x}}")]);
    let result = engine.template("page", "en").unwrap().render(value! {}).unwrap();
    assert_eq!(result, "{INCLUDE:x}");
}

#[test]
fn include_inline_err_self_include() {
    let engine = engine(IncludeMode::Inline, [("loop", "x{INCLUDE:loop}")]);
    let err = engine.template("loop", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncludeLimit);
    assert_eq!(err.message(), "reached maximum of 8 inline include expansions");
    assert_eq!(err.template_name(), Some("loop"));
}

#[test]
fn include_inline_err_missing() {
    let engine = engine(IncludeMode::Inline, [("page", "a\n{INCLUDE:nope}")]);
    let err = engine.template("page", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTemplate);
    assert_eq!(
        format!("{:#}", err),
        "
  --> page:2:1
   |
 2 | {INCLUDE:nope}
   | ^^^^^^^^^^^^^^ unknown template `nope`
"
    );
}

#[test]
fn include_delegate_shares_context() {
    let engine = engine(
        IncludeMode::Delegate,
        [("page", "A{INCLUDE:B}C"), ("B", "[{NAME}]")],
    );
    let template = engine.template("page", "en").unwrap();
    assert!(template.program().variables().is_empty());
    assert_eq!(template.render(value! { name: "x" }).unwrap(), "A[x]C");
}

#[test]
fn include_delegate_inside_loop() {
    let engine = engine(
        IncludeMode::Delegate,
        [
            ("page", "{FOREACH:ITEMS:ITEM}{INCLUDE:item}{ENDFOR}"),
            ("item", "<{TITLE}>"),
        ],
    );
    let result = engine
        .template("page", "en")
        .unwrap()
        .render(value! { items: [1, 2], title: "t" })
        .unwrap();
    assert_eq!(result, "<t><t>");
}

#[test]
fn include_delegate_compiles_for_same_language() {
    let mut engine = engine(
        IncludeMode::Delegate,
        [("page", "{INCLUDE:greeting}!"), ("greeting", "{TR:Hello}")],
    );
    engine.set_translator(|phrase: &str, language: &str| format!("{phrase}:{language}"));

    let fr = engine.template("page", "fr").unwrap().render(value! {}).unwrap();
    let de = engine.template("page", "de").unwrap().render(value! {}).unwrap();
    assert_eq!(fr, "Hello:fr!");
    assert_eq!(de, "Hello:de!");
    assert_eq!(engine.get("greeting", "fr").unwrap().language(), "fr");
}

#[test]
fn include_delegate_from_anonymous_template() {
    let engine = engine(IncludeMode::Delegate, [("footer", "(c) {YEAR}")]);
    let result = engine
        .compile_str("body {INCLUDE:footer}", "en")
        .unwrap()
        .render(value! { year: 2024 })
        .unwrap();
    assert_eq!(result, "body (c) 2024");
}

#[test]
fn include_delegate_err_self_include() {
    let engine = engine(IncludeMode::Delegate, [("loop", "x{INCLUDE:loop}")]);
    let template = engine.template("loop", "en").unwrap();
    let err = template.render(value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncludeLimit);
    assert_eq!(err.message(), "reached maximum include depth (8)");
}

#[test]
fn include_delegate_err_missing() {
    let engine = engine(IncludeMode::Delegate, [("page", "ab {INCLUDE:nope}")]);
    let template = engine.template("page", "en").unwrap();
    let err = template.render(value! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTemplate);
    assert_eq!(err.template_name(), Some("page"));
    assert_eq!(
        format!("{:#}", err),
        "
  --> page:1:4
   |
 1 | ab {INCLUDE:nope}
   |    ^^^^^^^^^^^^^^ unknown template `nope`
"
    );
}

#[test]
fn include_delegate_err_in_child_names_child() {
    let engine = engine(
        IncludeMode::Delegate,
        [("page", "{INCLUDE:child}"), ("child", "{N / 0}")],
    );
    let err = engine
        .template("page", "en")
        .unwrap()
        .render(value! { n: 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.template_name(), Some("child"));
    assert_eq!(err.message(), "division by zero");
}
