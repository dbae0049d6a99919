//! Core PE data types and structures

use serde::{Deserialize, Serialize};
use std::fmt;

// PE constants
pub const DOS_SIGNATURE: u16 = 0x5A4D; // MZ
pub const PE_SIGNATURE: u32 = 0x0000_4550; // PE\0\0
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

// Header layout
pub const DOS_HEADER_SIZE: usize = 64;
pub const E_LFANEW_OFFSET: usize = 60;
pub const MIN_PE_OFFSET: u32 = 0x40;
pub const PE_SIGNATURE_SIZE: usize = 4;
pub const COFF_HEADER_SIZE: usize = 20;
/// Signature plus COFF header; the optional header starts right after.
pub const NT_HEADERS_PREFIX: usize = PE_SIGNATURE_SIZE + COFF_HEADER_SIZE;
pub const COFF_MACHINE_OFFSET: usize = 0;
pub const COFF_SIZE_OF_OPTIONAL_HEADER_OFFSET: usize = 16;
pub const OPTIONAL_HEADER_ENTRY_POINT_OFFSET: usize = 16;
pub const PE32_MIN_OPTIONAL_HEADER_SIZE: u16 = 96;
pub const PE32PLUS_MIN_OPTIONAL_HEADER_SIZE: u16 = 112;

/// Entry points above this RVA are rejected. This is a plausibility
/// heuristic, not a PE format requirement.
pub const MAX_PLAUSIBLE_ENTRY_POINT: u32 = 0x8000_0000;

/// PE parsing error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeError {
    TruncatedHeader { expected: usize, actual: usize },
    InvalidDosSignature,
    InvalidPeOffset { offset: u32 },
    InvalidPeSignature,
    UnsupportedMachine(u16),
    OptionalHeaderTooSmall { size: u16, required: u16 },
    InvalidMagic(u16),
    ImplausibleEntryPoint(u32),
}

impl fmt::Display for PeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { expected, actual } => {
                write!(
                    f,
                    "Truncated header: expected {} bytes, got {}",
                    expected, actual
                )
            }
            Self::InvalidDosSignature => write!(f, "Invalid DOS signature"),
            Self::InvalidPeOffset { offset } => write!(f, "Invalid PE header offset: 0x{:x}", offset),
            Self::InvalidPeSignature => write!(f, "Invalid PE signature"),
            Self::UnsupportedMachine(m) => write!(f, "Unsupported machine type: 0x{:04x}", m),
            Self::OptionalHeaderTooSmall { size, required } => write!(
                f,
                "Optional header too small: {} bytes, need {}",
                size, required
            ),
            Self::InvalidMagic(m) => write!(f, "Invalid optional header magic: 0x{:04x}", m),
            Self::ImplausibleEntryPoint(ep) => write!(f, "Implausible entry point: 0x{:08x}", ep),
        }
    }
}

impl std::error::Error for PeError {}

pub type Result<T> = std::result::Result<T, PeError>;

/// Machine types accepted by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Machine {
    I386,   // 0x014c
    X86_64, // 0x8664
}

impl Machine {
    pub const I386_VALUE: u16 = 0x014c;
    pub const X86_64_VALUE: u16 = 0x8664;

    pub fn from_raw(value: u16) -> Option<Self> {
        match value {
            Self::I386_VALUE => Some(Self::I386),
            Self::X86_64_VALUE => Some(Self::X86_64),
            _ => None,
        }
    }
}

/// Optional header flavour selected by its magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionalHeaderKind {
    Pe32,
    Pe32Plus,
}

impl OptionalHeaderKind {
    pub fn from_magic(magic: u16) -> Result<Self> {
        match magic {
            PE32_MAGIC => Ok(Self::Pe32),
            PE32PLUS_MAGIC => Ok(Self::Pe32Plus),
            other => Err(PeError::InvalidMagic(other)),
        }
    }

    /// Smallest optional header this flavour accepts
    pub fn min_size(self) -> u16 {
        match self {
            Self::Pe32 => PE32_MIN_OPTIONAL_HEADER_SIZE,
            Self::Pe32Plus => PE32PLUS_MIN_OPTIONAL_HEADER_SIZE,
        }
    }

    pub fn is_64bit(self) -> bool {
        matches!(self, Self::Pe32Plus)
    }
}

/// What a successful header validation yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeEntryInfo {
    pub entry_point: u32,
    pub is_64bit: bool,
    pub machine: Machine,
}

impl PeEntryInfo {
    /// `(entry_point_rva, is_64bit)`
    pub fn as_tuple(&self) -> (u32, bool) {
        (self.entry_point, self.is_64bit)
    }
}
