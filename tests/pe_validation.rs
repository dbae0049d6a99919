mod common;

use common::PeBuilder;
use ripfix::api::validate_pe_header;
use ripfix::formats::pe::{validate_and_get_entry, Machine, PeError};

#[test]
fn short_inputs_always_fail() {
    for len in 0..64 {
        let mut data = vec![0u8; len];
        if len >= 2 {
            data[0..2].copy_from_slice(b"MZ");
        }
        assert!(validate_pe_header(&data).is_err(), "len {len}");
    }
}

#[test]
fn pe32_entry_point() {
    let image = PeBuilder::pe32(0x1000).build();
    assert_eq!(validate_pe_header(&image).unwrap(), (0x1000, false));
}

#[test]
fn pe32plus_entry_point() {
    let image = PeBuilder::pe32plus(0x2000).build();
    assert_eq!(validate_pe_header(&image).unwrap(), (0x2000, true));
    assert_eq!(
        validate_and_get_entry(&image).unwrap().machine,
        Machine::X86_64
    );
}

#[test]
fn bitness_follows_magic_not_machine() {
    // PE32+ optional header on an I386 machine is accepted as 64-bit
    let mut builder = PeBuilder::pe32plus(0x3000);
    builder.machine = common::IMAGE_FILE_MACHINE_I386;
    assert_eq!(validate_pe_header(&builder.build()).unwrap(), (0x3000, true));
}

#[test]
fn any_other_dos_magic_fails() {
    let image = PeBuilder::pe32plus(0x2000).build();
    for magic in [0x0000u16, 0x4D5A, 0x5A4C, 0xFFFF, 0x5A4E] {
        let mut mutated = image.clone();
        mutated[0..2].copy_from_slice(&magic.to_le_bytes());
        assert_eq!(
            validate_and_get_entry(&mutated),
            Err(PeError::InvalidDosSignature),
            "{magic:#06x}"
        );
    }
}

#[test]
fn pe_offset_out_of_range() {
    let mut builder = PeBuilder::pe32(0x1000);
    let image = builder.build();

    let mut zero = image.clone();
    zero[60..64].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        validate_and_get_entry(&zero),
        Err(PeError::InvalidPeOffset { offset: 0 })
    ));

    let mut past_end = image.clone();
    past_end[60..64].copy_from_slice(&(image.len() as u32 - 3).to_le_bytes());
    assert!(matches!(
        validate_and_get_entry(&past_end),
        Err(PeError::InvalidPeOffset { .. })
    ));

    let mut huge = image;
    huge[60..64].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(validate_and_get_entry(&huge).is_err());

    // The smallest legal offset works
    builder.pe_offset = 0x40;
    assert_eq!(validate_pe_header(&builder.build()).unwrap(), (0x1000, false));
}

#[test]
fn every_truncation_of_a_valid_image_fails_cleanly() {
    let image = PeBuilder::pe32plus(0x2000).build();
    for len in 0..image.len() {
        assert!(validate_and_get_entry(&image[..len]).is_err(), "len {len}");
    }
    assert!(validate_and_get_entry(&image).is_ok());
}

#[test]
fn trailing_data_is_ignored() {
    let mut builder = PeBuilder::pe32plus(0x1234);
    builder.trailer = vec![0xCC; 4096];
    assert_eq!(validate_pe_header(&builder.build()).unwrap(), (0x1234, true));
}
