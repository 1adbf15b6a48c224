#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (source, language) = data;
    let engine = braces::Engine::new();
    let _ = engine.compile_str(source, language);
});
