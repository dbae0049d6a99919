//! PE header validation.
//!
//! Only the DOS header, COFF header and the start of the optional header
//! are interpreted: enough to confirm the image is well formed and to find
//! its entry point and bitness.

pub mod headers;
pub mod types;
pub mod utils;

pub use headers::validate_and_get_entry;
pub use types::*;
