//! PE header validation
//!
//! Walks the DOS header, the `PE\0\0` signature, the COFF header and the
//! leading part of the optional header, checking bounds before every read.

use crate::formats::pe::types::*;
use crate::formats::pe::utils::{check_bounds, ReadExt};
use tracing::{debug, trace};

/// Validate the DOS header and return the PE header offset (`e_lfanew`)
pub fn parse_dos_header(data: &[u8]) -> Result<u32> {
    if data.len() < DOS_HEADER_SIZE {
        return Err(PeError::TruncatedHeader {
            expected: DOS_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let e_magic = data
        .read_u16_le_at(0)
        .ok_or(PeError::InvalidDosSignature)?;
    if e_magic != DOS_SIGNATURE {
        return Err(PeError::InvalidDosSignature);
    }

    let e_lfanew = data
        .read_u32_le_at(E_LFANEW_OFFSET)
        .ok_or(PeError::TruncatedHeader {
            expected: DOS_HEADER_SIZE,
            actual: data.len(),
        })?;

    if e_lfanew == 0
        || e_lfanew < MIN_PE_OFFSET
        || check_bounds(e_lfanew as usize, PE_SIGNATURE_SIZE, data.len()).is_err()
    {
        return Err(PeError::InvalidPeOffset { offset: e_lfanew });
    }

    Ok(e_lfanew)
}

/// Check the `PE\0\0` signature at `offset`
pub fn check_pe_signature(data: &[u8], offset: usize) -> Result<()> {
    match data.read_u32_le_at(offset) {
        Some(PE_SIGNATURE) => Ok(()),
        _ => Err(PeError::InvalidPeSignature),
    }
}

/// Parse the fields of the COFF header we need: machine and optional header size.
///
/// `offset` points at the PE signature; the signature and the 20-byte COFF
/// header must both fit.
pub fn parse_coff_header(data: &[u8], offset: usize) -> Result<(Machine, u16)> {
    check_bounds(offset, NT_HEADERS_PREFIX, data.len())?;
    let coff = offset + PE_SIGNATURE_SIZE;

    let raw_machine = data
        .read_u16_le_at(coff + COFF_MACHINE_OFFSET)
        .ok_or(PeError::TruncatedHeader {
            expected: offset + NT_HEADERS_PREFIX,
            actual: data.len(),
        })?;
    let machine = Machine::from_raw(raw_machine).ok_or(PeError::UnsupportedMachine(raw_machine))?;

    let size_of_optional_header = data
        .read_u16_le_at(coff + COFF_SIZE_OF_OPTIONAL_HEADER_OFFSET)
        .ok_or(PeError::TruncatedHeader {
            expected: offset + NT_HEADERS_PREFIX,
            actual: data.len(),
        })?;

    Ok((machine, size_of_optional_header))
}

/// Parse the optional header magic and entry point at `offset`
pub fn parse_optional_header(
    data: &[u8],
    offset: usize,
    size: u16,
) -> Result<(OptionalHeaderKind, u32)> {
    if size < 2 {
        return Err(PeError::OptionalHeaderTooSmall { size, required: 2 });
    }
    check_bounds(offset, size as usize, data.len())?;

    let magic = data.read_u16_le_at(offset).ok_or(PeError::TruncatedHeader {
        expected: offset + 2,
        actual: data.len(),
    })?;
    let kind = OptionalHeaderKind::from_magic(magic)?;

    if size < kind.min_size() {
        return Err(PeError::OptionalHeaderTooSmall {
            size,
            required: kind.min_size(),
        });
    }

    let entry_offset = offset + OPTIONAL_HEADER_ENTRY_POINT_OFFSET;
    let entry_point = data
        .read_u32_le_at(entry_offset)
        .ok_or(PeError::TruncatedHeader {
            expected: entry_offset + 4,
            actual: data.len(),
        })?;

    Ok((kind, entry_point))
}

/// Validate PE headers and extract the entry point RVA and bitness.
///
/// Reads only; never allocates.
pub fn validate_and_get_entry(data: &[u8]) -> Result<PeEntryInfo> {
    let result = validate_inner(data);
    match &result {
        Ok(info) => trace!(
            entry_point = info.entry_point,
            is_64bit = info.is_64bit,
            "PE header accepted"
        ),
        Err(e) => debug!(size = data.len(), reason = %e, "PE header rejected"),
    }
    result
}

fn validate_inner(data: &[u8]) -> Result<PeEntryInfo> {
    let pe_offset = parse_dos_header(data)? as usize;
    check_pe_signature(data, pe_offset)?;

    let (machine, size_of_optional_header) = parse_coff_header(data, pe_offset)?;
    let (kind, entry_point) =
        parse_optional_header(data, pe_offset + NT_HEADERS_PREFIX, size_of_optional_header)?;

    if entry_point == 0 || entry_point > MAX_PLAUSIBLE_ENTRY_POINT {
        return Err(PeError::ImplausibleEntryPoint(entry_point));
    }

    Ok(PeEntryInfo {
        entry_point,
        is_64bit: kind.is_64bit(),
        machine,
    })
}
