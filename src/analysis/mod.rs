//! Code analysis over raw machine code.
//!
//! Currently a single pass: locating RIP-relative operands in x86-64 code
//! without a full decoder.

pub mod rip;

pub use rip::{scan, ReferenceKind, RipReference};
