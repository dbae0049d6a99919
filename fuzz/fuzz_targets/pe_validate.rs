#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(info) = ripfix::formats::pe::validate_and_get_entry(data) {
        assert!(info.entry_point != 0 && info.entry_point <= 0x8000_0000);
    }
});
