#![no_main]
use libfuzzer_sys::fuzz_target;
use ripfix::rewrite::{labels, TextBuffer};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(mut out) = TextBuffer::new(text.len() / 2 + 1) {
        let _ = labels::rewrite(text, &[], &mut out);
        assert!(out.len() < out.capacity());
    }
});
