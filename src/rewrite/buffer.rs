//! Capacity-bounded text accumulator.
//!
//! A write either lands completely or not at all. The first write that
//! would fill the buffer to capacity is refused and latches the buffer into
//! the truncated state; from then on every write fails, while the text
//! already accumulated stays readable.

use crate::error::{Result, RipfixError};
use tracing::warn;

/// Bounded text output.
#[derive(Debug)]
pub struct TextBuffer {
    data: String,
    capacity: usize,
    truncated: bool,
}

impl TextBuffer {
    /// Allocate a buffer holding fewer than `capacity` bytes of text.
    ///
    /// Storage is reserved up front; failure to reserve is reported rather
    /// than aborting.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RipfixError::InvalidInput(
                "text buffer capacity must be non-zero".to_string(),
            ));
        }
        let mut data = String::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| RipfixError::Allocation { capacity })?;
        Ok(Self {
            data,
            capacity,
            truncated: false,
        })
    }

    /// Append `text`; `false` if it does not fit or the buffer is already truncated.
    pub fn write(&mut self, text: &str) -> bool {
        if self.truncated {
            return false;
        }
        // One slot stays reserved so `len() < capacity()` always holds.
        if self.data.len() + text.len() >= self.capacity {
            self.truncated = true;
            warn!(
                used = self.data.len(),
                requested = text.len(),
                capacity = self.capacity,
                "text buffer truncated"
            );
            return false;
        }
        self.data.push_str(text);
        true
    }

    /// As [`TextBuffer::write`], reporting exhaustion as an error.
    pub fn try_write(&mut self, text: &str) -> Result<()> {
        if self.write(text) {
            Ok(())
        } else {
            Err(RipfixError::ResourceExhausted {
                resource: "text buffer".to_string(),
                used: self.data.len(),
                limit: self.capacity,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be written in a single successful call.
    pub fn remaining(&self) -> usize {
        if self.truncated {
            0
        } else {
            self.capacity - self.data.len() - 1
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        self.data
    }
}
