//! ripfix: PE header validation and RIP-relative reference rewriting.
//!
//! Building blocks for a disassemble-and-reassemble pipeline:
//! - [`formats::pe`] confirms a byte blob is a well-formed PE image and finds its entry point
//! - [`heuristics::code`] cheaply rejects regions that do not look like x86-64 code
//! - [`analysis::rip`] locates instructions addressing memory relative to RIP
//! - [`rewrite`] turns `[rip+disp]` operands in assembly text into data labels
//!
//! [`api`] exposes the same operations as a flat boundary surface.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod formats;
pub mod heuristics;
pub mod logging;
pub mod rewrite;

pub use analysis::rip::{ReferenceKind, RipReference};
pub use config::RipfixConfig;
pub use error::{Result, RipfixError};
pub use formats::pe::{PeEntryInfo, PeError};
pub use rewrite::{RewriteStats, TextBuffer};
