//! Parser fuzz target: feed arbitrary bytes through the tokenizer, parser and generator.
//! Nothing may panic; malformed input must come back as an Err.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    // the reader path handles invalid UTF-8 itself
    let _ = qcgen::compile_reader(data, &qcgen::Config::default());
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = qcgen::parse(s);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
