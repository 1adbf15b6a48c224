use braces::{value, Engine, ErrorKind};
use serde_json::json;

#[test]
fn lex_escaped_braces_are_literal() {
    let engine = Engine::new();
    let template = engine.compile_str("a {{not a directive}} b", "en").unwrap();
    assert!(template.program().variables().is_empty());
    let program = serde_json::to_value(template.program()).unwrap();
    assert_eq!(program["instrs"], json!([{ "EmitRaw": "a {not a directive} b" }]));
    assert_eq!(template.render(value! {}).unwrap(), "a {not a directive} b");
}

#[test]
fn lex_escape_next_to_directive() {
    let result = Engine::new()
        .compile_str("{{{NAME}}}", "en")
        .unwrap()
        .render(value! { name: "x" })
        .unwrap();
    assert_eq!(result, "{x}");
}

#[test]
fn lex_stray_braces_pass_through() {
    let engine = Engine::new();
    for source in ["a } b", "a { b", "{a {B}", "x {{ y"] {
        let template = engine.compile_str(source, "en");
        let result = template.and_then(|t| t.render(value! { b: "" }));
        assert!(result.is_ok(), "{source:?} failed: {result:?}");
    }
    let result = Engine::new()
        .compile_str("if (x) { y", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "if (x) { y");
}

#[test]
fn lex_empty_directive() {
    let result = Engine::new()
        .compile_str("a{}b{ }c", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "abc");
}

#[test]
fn lex_comment() {
    let result = Engine::new()
        .compile_str("a{// anything: IF ENDFOR %d}b", "en")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "ab");
}

#[test]
fn lex_unicode_text() {
    let result = Engine::new()
        .compile_str("héllo {NAME} 🦀", "en")
        .unwrap()
        .render(value! { name: "wörld" })
        .unwrap();
    assert_eq!(result, "héllo wörld 🦀");
}

#[test]
fn lex_malformed_directive() {
    let err = Engine::new()
        .compile_str("{NOTAKEYWORD:x}", "en")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {NOTAKEYWORD:x}
   |             ^ expected end of expression, found `:`
"
    );
}
