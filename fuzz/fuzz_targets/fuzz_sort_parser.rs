#![no_main]
use libfuzzer_sys::fuzz_target;
use nexusmap::query::{FieldPath, SortSpec};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(spec) = SortSpec::parse(s, |f| Ok(FieldPath::unvalidated(f)))
    {
        let _ = spec.to_document();
    }
});
