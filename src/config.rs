//! Configuration for ripfix.
//!
//! Provides centralized, serde-loadable tunables for the code heuristic and
//! for the auto-sized convenience wrappers around scanning and rewriting.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RipfixConfig {
    /// Code-plausibility heuristic thresholds.
    pub heuristics: HeuristicsConfig,
    /// Reference cap policy for [`crate::analysis::rip::extract_references`].
    pub scan: ScanConfig,
    /// Output sizing policy for [`crate::rewrite::labels::rewrite_to_string`].
    pub rewrite: RewriteConfig,
}

impl RipfixConfig {
    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Thresholds for the code-plausibility heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Regions shorter than this are accepted without sampling (default: 16).
    pub min_region_size: usize,
    /// Bytes sampled from the start of the region (default: 1024).
    pub sample_size: usize,
    /// Marker ratio must exceed this (default: 0.05).
    pub min_marker_ratio: f32,
    /// Zero-byte ratio must stay below this (default: 0.30).
    pub max_null_ratio: f32,
    /// Undefined-opcode ratio must stay below this (default: 0.05).
    pub max_undefined_ratio: f32,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            min_region_size: 16,
            sample_size: 1024,
            min_marker_ratio: 0.05,
            max_null_ratio: 0.30,
            max_undefined_ratio: 0.05,
        }
    }
}

/// Reference cap policy for scans whose caller gives no explicit maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Expected code bytes per reference (default: 50).
    pub bytes_per_reference: usize,
    /// Lower bound on the cap (default: 100).
    pub min_references: usize,
    /// Upper bound on the cap (default: 10000).
    pub max_references: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bytes_per_reference: 50,
            min_references: 100,
            max_references: 10_000,
        }
    }
}

impl ScanConfig {
    /// Cap for a region of `code_len` bytes.
    pub fn reference_cap(&self, code_len: usize) -> usize {
        let estimate = code_len / self.bytes_per_reference.max(1);
        estimate
            .max(self.min_references)
            .min(self.max_references.max(self.min_references))
    }
}

/// Output buffer sizing for rewrites whose caller gives no buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Capacity multiplier over the input length (default: 2).
    pub growth_factor: usize,
    /// Smallest capacity in bytes (default: 1 MiB).
    pub min_capacity: usize,
    /// Largest capacity in bytes (default: 16 MiB).
    pub max_capacity: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            growth_factor: 2,
            min_capacity: 1024 * 1024,
            max_capacity: 16 * 1024 * 1024,
        }
    }
}

impl RewriteConfig {
    /// Capacity for an input of `text_len` bytes.
    pub fn capacity_for(&self, text_len: usize) -> usize {
        text_len
            .saturating_mul(self.growth_factor)
            .max(self.min_capacity)
            .min(self.max_capacity.max(self.min_capacity))
    }
}
