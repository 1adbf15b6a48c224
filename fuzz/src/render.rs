#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use braces::{Config, Engine, IncludeMode, MemoryLoader};
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (bool, &str, Vec<(&str, &str)>, Value)| {
    let (inline, root, includes, value) = data;
    let mode = if inline {
        IncludeMode::Inline
    } else {
        IncludeMode::Delegate
    };
    let config = Config::builder()
        .include_mode(mode)
        .max_include_expansions(16)
        .max_include_depth(16)
        .build();
    let mut loader: MemoryLoader = includes.into_iter().collect();
    loader.insert("fuzz", root);
    let mut engine = Engine::with_config(config);
    engine.set_loader(loader);
    if let Ok(template) = engine.template("fuzz", "en") {
        let _ = template.render(&value);
    }
});
