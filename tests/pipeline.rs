//! End to end: validate, sniff, scan, disassemble with iced, rewrite.

mod common;

use common::PeBuilder;
use iced_x86::{Decoder, DecoderOptions, Formatter, IntelFormatter};
use ripfix::api::*;
use ripfix::rewrite::{labels, TextBuffer};

fn disassemble(code: &[u8], ip: u64) -> String {
    let mut decoder = Decoder::with_ip(64, code, ip, DecoderOptions::NONE);
    let mut formatter = IntelFormatter::new();
    formatter.options_mut().set_rip_relative_addresses(true);
    formatter.options_mut().set_hex_prefix("0x");
    formatter.options_mut().set_hex_suffix("");

    let mut text = String::new();
    for instr in &mut decoder {
        let mut line = String::new();
        formatter.format(&instr, &mut line);
        text.push_str(&line);
        text.push('\n');
    }
    text
}

#[test]
fn rewrite_iced_output() {
    let code = common::sample_function();
    let mut image = PeBuilder::pe32plus(0x1000);
    image.trailer = code.clone();
    let (entry, is_64bit) = validate_pe_header(&image.build()).unwrap();
    assert!(is_64bit);

    let base = 0x140000000u64 + entry as u64;
    let refs = scan_rip_references(&code, base, 64);
    assert_eq!(refs.len(), 5);

    let text = disassemble(&code, base);
    assert_eq!(text.matches("[rip").count(), 5);

    let mut out = TextBuffer::new(4096).unwrap();
    let stats = labels::rewrite(&text, &refs, &mut out).unwrap();
    assert_eq!(stats.rewritten, 5);

    let rewritten = out.as_str();
    assert!(!rewritten.contains("[rip"));
    for label in ["[data_0x10]", "[data_0x200]", "[data_0x1000]", "[data_0x2000]"] {
        assert!(rewritten.contains(label), "{label} missing in:\n{rewritten}");
    }
    assert_eq!(rewritten.lines().count(), text.lines().count());
}

#[test]
fn handle_surface_end_to_end() {
    let mut handle = create_output_resource(256).unwrap();
    assert!(write_text(&mut handle, "; relocated\n"));
    assert!(rewrite_rip_labels("mov rax, [rip+0x20]\n", &[], &mut handle));
    assert_eq!(read_text(&handle), "; relocated\nmov rax, [data_0x20]\n");
    release_output_resource(handle);
}

#[test]
fn no_rip_text_is_copied() {
    let text = "push rbp\nmov rbp,rsp\npop rbp\nret\n";
    let mut handle = create_output_resource(256).unwrap();
    assert!(rewrite_rip_labels(text, &[], &mut handle));
    assert_eq!(read_text(&handle), text);
}

#[test]
fn repeated_writes_until_capacity() {
    let mut handle = create_output_resource(10).unwrap();
    assert!(write_text(&mut handle, "abc"));
    assert!(write_text(&mut handle, "def"));
    assert!(write_text(&mut handle, "ghi"));
    // 9 + 1 would reach the capacity of 10
    assert!(!write_text(&mut handle, "j"));
    assert!(handle.is_truncated());
    assert!(!write_text(&mut handle, ""));
    assert_eq!(read_text(&handle), "abcdefghi");

    // A rewrite into a truncated handle fails without touching the text
    assert!(!rewrite_rip_labels("nop", &[], &mut handle));
    assert_eq!(read_text(&handle), "abcdefghi");
}

#[test]
fn sniff_before_scanning() {
    assert!(!looks_like_code(&[0u8; 1024]));
    // Functions separated by int3 padding, as a linker lays them out
    let mut function = common::sample_function();
    function.extend_from_slice(&[0xCC; 8]);
    let code: Vec<u8> = function.into_iter().cycle().take(1024).collect();
    assert!(looks_like_code(&code));
}
