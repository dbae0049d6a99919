//! Assembly text rewriting into relocation-independent form.

pub mod buffer;
pub mod labels;

pub use buffer::TextBuffer;
pub use labels::{rewrite, RewriteStats};
