//! RIP-relative reference scanner.
//!
//! This does NOT attempt full disassembly. It recognizes the indirect
//! `call/jmp [rip+disp32]` forms and the ModR/M-based instructions whose
//! memory operand is `[rip+disp32]`, records where they are, and skips over
//! them so their displacement bytes are never re-read as opcodes. Anything
//! else advances the cursor by a single byte.
//!
//! Every multi-byte read is bounds-checked; a pattern whose tail would run
//! past the end of the buffer is simply not a match.

use crate::config::ScanConfig;
use crate::formats::pe::utils::ReadExt;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// `FF /2` and `FF /4`
pub const INDIRECT_BRANCH_OPCODE: u8 = 0xFF;
/// ModR/M for `call [rip+disp32]`
pub const MODRM_CALL_RIP: u8 = 0x15;
/// ModR/M for `jmp [rip+disp32]`
pub const MODRM_JMP_RIP: u8 = 0x25;
pub const INDIRECT_BRANCH_LEN: usize = 6;

/// mod=00, r/m=101 selects `[rip+disp32]` in 64-bit mode.
pub const RIP_MODRM_MASK: u8 = 0xC7;
pub const RIP_MODRM_VALUE: u8 = 0x05;

/// Prefix bytes treated as REX.W.
pub const REX_W_PREFIXES: RangeInclusive<u8> = 0x48..=0x4F;

/// opcode + ModR/M + disp32
pub const MODRM_INSN_LEN: usize = 6;

/// Windows needed past the cursor before a pattern can be tried.
pub const SCAN_LOOKAHEAD: usize = 2;

/// What the referencing instruction does with its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// `call [rip+disp32]`
    IndirectCall,
    /// `jmp [rip+disp32]`
    IndirectJump,
    /// MOV reg, mem
    Load,
    /// MOV mem, reg
    Store,
    /// LEA
    AddressOf,
    /// CMP
    Compare,
    /// TEST
    Test,
    /// ADD/OR/AND/SUB/XOR families
    Arithmetic,
}

impl ReferenceKind {
    /// Whether the instruction reads or writes the referenced memory.
    pub fn is_data(self) -> bool {
        !matches!(
            self,
            ReferenceKind::IndirectCall | ReferenceKind::IndirectJump | ReferenceKind::AddressOf
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::IndirectCall => "indirect_call",
            ReferenceKind::IndirectJump => "indirect_jump",
            ReferenceKind::Load => "load",
            ReferenceKind::Store => "store",
            ReferenceKind::AddressOf => "address_of",
            ReferenceKind::Compare => "compare",
            ReferenceKind::Test => "test",
            ReferenceKind::Arithmetic => "arithmetic",
        }
    }
}

/// One RIP-relative reference found in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RipReference {
    /// Virtual address of the referencing instruction (prefix included)
    pub address: u64,
    /// Signed displacement from the end of the instruction
    pub offset: i32,
    /// Data access as opposed to control transfer or address computation
    pub is_data: bool,
    pub kind: ReferenceKind,
    /// Length in bytes of the matched instruction
    pub length: u8,
}

impl RipReference {
    /// Absolute address the operand points at.
    pub fn target(&self) -> u64 {
        self.address
            .wrapping_add(self.length as u64)
            .wrapping_add_signed(self.offset as i64)
    }
}

/// A pattern matched at some cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipMatch {
    pub kind: ReferenceKind,
    pub displacement: i32,
    pub length: usize,
}

/// Classify an opcode that takes a ModR/M memory operand.
pub fn classify_opcode(opcode: u8) -> Option<ReferenceKind> {
    match opcode {
        0x8B | 0x8A => Some(ReferenceKind::Load),
        0x89 | 0x88 => Some(ReferenceKind::Store),
        0x8D => Some(ReferenceKind::AddressOf),
        0x3B | 0x3A => Some(ReferenceKind::Compare),
        0x85 | 0x84 => Some(ReferenceKind::Test),
        0x00..=0x05 | 0x08..=0x0D | 0x20..=0x25 | 0x28..=0x2D | 0x30..=0x35 => {
            Some(ReferenceKind::Arithmetic)
        }
        _ => None,
    }
}

#[inline]
pub fn is_rip_relative_modrm(modrm: u8) -> bool {
    modrm & RIP_MODRM_MASK == RIP_MODRM_VALUE
}

/// `FF 15 disp32` / `FF 25 disp32` at `pos`.
pub fn match_indirect_branch(code: &[u8], pos: usize) -> Option<RipMatch> {
    if code.read_u8_at(pos)? != INDIRECT_BRANCH_OPCODE {
        return None;
    }
    let kind = match code.read_u8_at(pos + 1)? {
        MODRM_CALL_RIP => ReferenceKind::IndirectCall,
        MODRM_JMP_RIP => ReferenceKind::IndirectJump,
        _ => return None,
    };
    if pos.checked_add(INDIRECT_BRANCH_LEN)? > code.len() {
        return None;
    }
    let displacement = code.read_i32_le_at(pos + 2)?;
    Some(RipMatch {
        kind,
        displacement,
        length: INDIRECT_BRANCH_LEN,
    })
}

/// Optionally REX.W-prefixed `opcode modrm disp32` with a RIP-relative ModR/M at `pos`.
pub fn match_rip_modrm(code: &[u8], pos: usize) -> Option<RipMatch> {
    let prefix_len = usize::from(REX_W_PREFIXES.contains(&code.read_u8_at(pos)?));
    let op_pos = pos + prefix_len;

    let opcode = code.read_u8_at(op_pos)?;
    let modrm = code.read_u8_at(op_pos + 1)?;
    if !is_rip_relative_modrm(modrm) {
        return None;
    }
    let kind = classify_opcode(opcode)?;

    let length = MODRM_INSN_LEN + prefix_len;
    if pos.checked_add(length)? > code.len() {
        return None;
    }
    let displacement = code.read_i32_le_at(op_pos + 2)?;
    Some(RipMatch {
        kind,
        displacement,
        length,
    })
}

/// Try every pattern at `pos` in priority order.
pub fn match_at(code: &[u8], pos: usize) -> Option<RipMatch> {
    match_indirect_branch(code, pos).or_else(|| match_rip_modrm(code, pos))
}

/// Scan `code` loaded at `base` for RIP-relative references.
///
/// Returns at most `max_references` records, in address order.
pub fn scan(code: &[u8], base: u64, max_references: usize) -> Vec<RipReference> {
    let mut out = Vec::with_capacity(max_references.min(code.len() / MODRM_INSN_LEN + 1));
    let mut i = 0usize;

    while i + SCAN_LOOKAHEAD < code.len() && out.len() < max_references {
        match match_at(code, i) {
            Some(m) => {
                let reference = RipReference {
                    address: base.wrapping_add(i as u64),
                    offset: m.displacement,
                    is_data: m.kind.is_data(),
                    kind: m.kind,
                    length: m.length as u8,
                };
                trace!(
                    address = reference.address,
                    offset = reference.offset,
                    kind = reference.kind.as_str(),
                    "rip reference"
                );
                out.push(reference);
                i += m.length;
            }
            None => i += 1,
        }
    }

    debug!(
        bytes = code.len(),
        base,
        references = out.len(),
        capped = out.len() >= max_references,
        "rip scan complete"
    );
    out
}

/// Scan with a cap derived from the region size.
pub fn extract_references(code: &[u8], base: u64, config: &ScanConfig) -> Vec<RipReference> {
    scan(code, base, config.reference_cap(code.len()))
}
