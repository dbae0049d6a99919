//! Boundary operations consumed by a surrounding disassembly pipeline.
//!
//! Each function is a thin, synchronous entry point over the modules of this
//! crate. The output resource is an opaque [`OutputHandle`]: it is created
//! by the caller, lent mutably to one rewrite at a time, and released by
//! value, after which it cannot be used.

use crate::analysis::rip::{self, RipReference};
use crate::error::Result;
use crate::formats::pe;
use crate::heuristics::code;
use crate::rewrite::{labels, TextBuffer};
use tracing::debug;

/// Protocol/behaviour version reported to callers for compatibility checks.
pub const PROTOCOL_VERSION: &str = "2.0.0-enhanced";

/// Opaque output resource for rewritten text.
#[derive(Debug)]
pub struct OutputHandle {
    buffer: TextBuffer,
}

impl OutputHandle {
    pub fn is_truncated(&self) -> bool {
        self.buffer.is_truncated()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Allocate an output resource that holds fewer than `capacity` bytes.
pub fn create_output_resource(capacity: usize) -> Result<OutputHandle> {
    Ok(OutputHandle {
        buffer: TextBuffer::new(capacity)?,
    })
}

/// Append `text`; `false` marks the resource truncated if it would overflow.
pub fn write_text(handle: &mut OutputHandle, text: &str) -> bool {
    handle.buffer.write(text)
}

/// Text accumulated so far; borrowing ties it to the handle's lifetime.
pub fn read_text(handle: &OutputHandle) -> &str {
    handle.buffer.as_str()
}

/// Release all storage held by the resource.
pub fn release_output_resource(handle: OutputHandle) {
    debug!(
        capacity = handle.capacity(),
        used = handle.len(),
        truncated = handle.is_truncated(),
        "output resource released"
    );
    drop(handle);
}

/// Validate PE headers; returns `(entry_point_rva, is_64bit)`.
pub fn validate_pe_header(image: &[u8]) -> Result<(u32, bool)> {
    Ok(pe::validate_and_get_entry(image)?.as_tuple())
}

/// Scan `code` loaded at `base_address` for at most `max_count` RIP-relative references.
pub fn scan_rip_references(code: &[u8], base_address: u64, max_count: usize) -> Vec<RipReference> {
    rip::scan(code, base_address, max_count)
}

/// Rewrite `[rip...]` operands in `assembly` into `output`.
///
/// `false` when the output overflowed; the partial text stays readable and
/// the handle reports truncation.
pub fn rewrite_rip_labels(
    assembly: &str,
    references: &[RipReference],
    output: &mut OutputHandle,
) -> bool {
    labels::rewrite(assembly, references, &mut output.buffer).is_ok()
}

/// Cheap plausibility check that `region` is x86-64 machine code.
pub fn looks_like_code(region: &[u8]) -> bool {
    code::looks_like_code(region)
}

pub fn get_version() -> &'static str {
    PROTOCOL_VERSION
}
