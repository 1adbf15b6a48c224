use braces::{Engine, ErrorKind, MemoryLoader};

#[test]
fn compile_empty() {
    Engine::new().compile_str("", "en").unwrap();
}

#[test]
fn compile_raw() {
    Engine::new()
        .compile_str("lorem ipsum dolor sit amet", "en")
        .unwrap();
}

#[test]
fn compile_all_directive_forms() {
    Engine::new()
        .compile_str(
            "{// comment}\
             {IF:A > 1 && !B}a{ELSEIF:A == 1}b{ELSE}c{ENDIF}\
             {SWITCH:S}d{CASE:'x'}x{CASE:2}y{ENDSWITCH}\
             {FOREACH:ROWS:K:ROW}{K}={ROW[id]}{ENDFOR}\
             {INCLUDE:footer}\
             {TR:Hello}{TR:%s items:COUNT}\
             {TITLE . ' ' . strlen(TITLE)}",
            "en",
        )
        .unwrap();
}

#[test]
fn compile_variables_in_first_use_order() {
    let engine = Engine::new();
    let template = engine
        .compile_str(
            "{TITLE}{IF:COUNT > 0}{FOREACH:ITEMS:ITEM}{ITEM}{TITLE}{ENDFOR}{ENDIF}{TR:%d of %d:INDEX:COUNT}",
            "en",
        )
        .unwrap();
    let program = template.program();
    assert_eq!(
        program.variables(),
        ["TITLE", "COUNT", "ITEMS", "ITEM", "INDEX"]
    );
    assert!(program.references("ITEMS"));
    assert!(!program.references("items"));
}

#[test]
fn compile_bracket_key_is_not_a_variable() {
    let engine = Engine::new();
    let template = engine.compile_str("{ROW[id]}{ROW[ID]}{ROW[0]}", "en").unwrap();
    assert_eq!(template.program().variables(), ["ROW", "ID"]);
}

#[test]
fn compile_keywords_are_not_variables() {
    let engine = Engine::new();
    let template = engine.compile_str("{IF:ENDED}x{ENDIF}", "en").unwrap();
    assert_eq!(template.program().variables(), ["ENDED"]);
}

#[test]
fn compile_idempotent() {
    let mut loader = MemoryLoader::new();
    loader.insert(
        "page",
        "{IF:COUNT}{FOREACH:ITEMS:K:V}{K}:{V}{ENDFOR}{ELSE}{TR:Nothing}{ENDIF}",
    );
    let mut engine = Engine::new();
    engine.set_loader(loader);

    let a = engine.compile("page", "en").unwrap();
    let b = engine.compile("page", "en").unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn compile_program_is_per_language() {
    let mut engine = Engine::new();
    engine.set_translator(|phrase: &str, language: &str| format!("{phrase}@{language}"));

    let en = engine.compile_str("{TR:Hi}", "en").unwrap().into_program();
    let fr = engine.compile_str("{TR:Hi}", "fr").unwrap().into_program();
    assert_eq!(en.language(), "en");
    assert_eq!(fr.language(), "fr");
    assert_ne!(en, fr);
}

#[test]
fn compile_missing_template() {
    let err = Engine::new().compile("nope", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingTemplate);
    assert_eq!(err.to_string(), "unknown template `nope`");
}

#[test]
fn compile_err_unknown_keyword() {
    let err = Engine::new()
        .compile_str("lorem {NOTAKEYWORD:x} ipsum", "en")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), "expected end of expression, found `:`");
}

#[test]
fn compile_err_lowercase_identifier() {
    let err = Engine::new().compile_str("{title}", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        format!("{:#}", err),
        "
   |
 1 | {title}
   |  ^^^^^ unknown identifier `title`, template variables must be uppercase
"
    );
}

#[test]
fn compile_err_template_name() {
    let mut loader = MemoryLoader::new();
    loader.insert("broken", "line one\n{IF:}x{ENDIF}");
    let mut engine = Engine::new();
    engine.set_loader(loader);

    let err = engine.compile("broken", "en").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.template_name(), Some("broken"));
    assert_eq!(err.message(), "expected expression");
}

#[test]
fn compile_err_foreach_shape() {
    let err = Engine::new()
        .compile_str("{FOREACH:ITEMS}{ENDFOR}", "en")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        err.message(),
        "expected `FOREACH:expr:VALUE` or `FOREACH:expr:KEY:VALUE`"
    );

    let err = Engine::new()
        .compile_str("{FOREACH:ITEMS:item}{ENDFOR}", "en")
        .unwrap_err();
    assert_eq!(err.message(), "expected loop variable, found `item`");
}

#[test]
fn compile_foreach_nested_colons() {
    let engine = Engine::new();
    let template = engine
        .compile_str(
            "{FOREACH:(A ? B : C):K:ROW}{ENDFOR}{FOREACH:ROWS[X ? 'a:b' : Y]:ROW}{ENDFOR}",
            "en",
        )
        .unwrap();
    assert_eq!(
        template.program().variables(),
        ["A", "B", "C", "K", "ROW", "ROWS", "X", "Y"]
    );
}

#[test]
fn compile_err_unclosed_blocks() {
    let cases = [
        ("{IF:A}", "unclosed `IF` block"),
        ("{SWITCH:A}", "unclosed `SWITCH` block"),
        ("{FOREACH:A:B}", "unclosed `FOREACH` block"),
        ("{IF:A}{FOREACH:A:B}{ENDFOR}", "unclosed `IF` block"),
    ];
    for (source, msg) in cases {
        let err = Engine::new().compile_str(source, "en").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedBlock, "{source}");
        assert_eq!(err.message(), msg, "{source}");
    }
}

#[test]
fn compile_err_unexpected_closers() {
    let cases = [
        ("{ENDIF}", "unexpected `ENDIF` block"),
        ("{ELSE}", "unexpected `ELSE` block"),
        ("{ELSEIF:A}", "unexpected `ELSEIF` block"),
        ("{CASE:1}", "unexpected `CASE` block"),
        ("{ENDSWITCH}", "unexpected `ENDSWITCH` block"),
        ("{ENDFOR}", "unexpected `ENDFOR` block"),
        (
            "{IF:A}{ENDFOR}",
            "unexpected `ENDFOR` block, the open block is `IF`",
        ),
        (
            "{FOREACH:A:B}{ENDIF}",
            "unexpected `ENDIF` block, the open block is `FOREACH`",
        ),
        (
            "{SWITCH:A}{ELSE}{ENDSWITCH}",
            "unexpected `ELSE` block, the open block is `SWITCH`",
        ),
        (
            "{IF:A}{ELSE}{ELSE}{ENDIF}",
            "unexpected `ELSE` block after `ELSE`",
        ),
        (
            "{IF:A}{ELSE}{ELSEIF:B}{ENDIF}",
            "unexpected `ELSEIF` block after `ELSE`",
        ),
    ];
    for (source, msg) in cases {
        let err = Engine::new().compile_str(source, "en").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedBlock, "{source}");
        assert_eq!(err.message(), msg, "{source}");
    }
}

#[test]
fn compile_err_unresolved_block_pretty() {
    let err = Engine::new()
        .compile_str("lorem {IF:A}\nipsum {ENDFOR}", "en")
        .unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "
   |
 2 | ipsum {ENDFOR}
   |       ^^^^^^^^ unexpected `ENDFOR` block, the open block is `IF`
"
    );
}
