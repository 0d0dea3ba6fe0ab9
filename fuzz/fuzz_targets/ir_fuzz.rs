//! JSON IR fuzz target: feed arbitrary text to `generate_from_json`.
//! Malformed or unexpected IR must come back as an Err; nothing may panic.
//! Build with: cargo fuzz run ir_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let config = qcgen::Config::default();
    if let Ok(code) = qcgen::generate_from_json(s, &config) {
        // whatever deserializes must serialize back and generate the same code
        if let Ok(decls) = serde_json::from_str::<Vec<qcgen::Declaration>>(s) {
            if let Ok(json) = qcgen::declarations_to_json(&decls) {
                assert_eq!(qcgen::generate_from_json(&json, &config).ok(), Some(code));
            }
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run ir_fuzz");
}
