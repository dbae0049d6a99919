#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cap = data.first().copied().unwrap_or(0) as usize;
    let refs = ripfix::analysis::rip::scan(data, 0x1000, cap);
    assert!(refs.len() <= cap);
    for r in refs {
        assert!((r.address - 0x1000) as usize + r.length as usize <= data.len());
    }
    let _ = ripfix::heuristics::code::looks_like_code(data);
});
