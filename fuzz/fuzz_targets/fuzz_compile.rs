#![no_main]

use libfuzzer_sys::fuzz_target;
use mandex::index::FieldTable;

fuzz_target!(|data: &str| {
    // Malformed expressions must come back as errors, never panics
    let tokens: Vec<&str> = data.split_whitespace().collect();
    let _ = mandex::query::compile(&tokens, &FieldTable::standard());
    let _ = mandex::query::compile_simple(&tokens);
});
