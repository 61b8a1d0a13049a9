#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic on any input
        let _ = nexusmap::query::parse_condition(s);
        let _ = nexusmap::cli::split_filter_arg(s);
    }
});
