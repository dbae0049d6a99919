//! Heuristics for deciding whether a byte region is worth scanning.

/// Statistical sniff test for x86-64 machine code.
pub mod code {
    use crate::config::HeuristicsConfig;
    use serde::{Deserialize, Serialize};
    use tracing::debug;

    /// Opcode and prefix bytes that are common in compiled x86-64 code.
    pub fn is_marker_byte(b: u8) -> bool {
        matches!(
            b,
            0x48..=0x4F         // REX.W
            | 0x8B | 0x89 | 0x8D // MOV/LEA
            | 0xE8 | 0xE9        // CALL/JMP rel32
            | 0xFF               // CALL/JMP indirect
            | 0xC3 | 0xC2        // RET
            | 0x90               // NOP
            | 0x50..=0x5F        // PUSH/POP
            | 0xCC | 0xCD // INT3/INT
        )
    }

    /// Single-byte opcodes that are undefined in 64-bit mode.
    pub const UNDEFINED_OPCODES: [u8; 11] = [
        0x06, 0x07, 0x0E, 0x16, 0x17, 0x1E, 0x1F, 0x27, 0x2F, 0x37, 0x3F,
    ];

    pub fn is_undefined_opcode(b: u8) -> bool {
        UNDEFINED_OPCODES.contains(&b)
    }

    /// Byte counts over the sampled prefix of a region.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    pub struct CodeSample {
        pub sample_len: usize,
        pub markers: usize,
        pub nulls: usize,
        pub undefined: usize,
    }

    impl CodeSample {
        fn ratio(&self, count: usize) -> f32 {
            if self.sample_len == 0 {
                0.0
            } else {
                count as f32 / self.sample_len as f32
            }
        }

        pub fn marker_ratio(&self) -> f32 {
            self.ratio(self.markers)
        }

        pub fn null_ratio(&self) -> f32 {
            self.ratio(self.nulls)
        }

        pub fn undefined_ratio(&self) -> f32 {
            self.ratio(self.undefined)
        }

        /// Whether the ratios pass the thresholds in `config`.
        pub fn passes(&self, config: &HeuristicsConfig) -> bool {
            self.marker_ratio() > config.min_marker_ratio
                && self.null_ratio() < config.max_null_ratio
                && self.undefined_ratio() < config.max_undefined_ratio
        }
    }

    /// Count markers, zero bytes and undefined opcodes in the first `sample_size` bytes.
    pub fn sample_code(bytes: &[u8], sample_size: usize) -> CodeSample {
        let sample = &bytes[..bytes.len().min(sample_size)];
        let mut out = CodeSample {
            sample_len: sample.len(),
            ..CodeSample::default()
        };
        for &b in sample {
            if is_marker_byte(b) {
                out.markers += 1;
            }
            if b == 0x00 {
                out.nulls += 1;
            }
            if is_undefined_opcode(b) {
                out.undefined += 1;
            }
        }
        out
    }

    /// Probabilistic check that `bytes` looks like x86-64 code, using default thresholds.
    pub fn looks_like_code(bytes: &[u8]) -> bool {
        looks_like_code_with(bytes, &HeuristicsConfig::default())
    }

    /// As [`looks_like_code`] with explicit thresholds.
    ///
    /// An empty region holds no code. Non-empty regions shorter than
    /// `min_region_size` are accepted: there is not enough data to judge.
    pub fn looks_like_code_with(bytes: &[u8], config: &HeuristicsConfig) -> bool {
        if bytes.is_empty() {
            return false;
        }
        if bytes.len() < config.min_region_size {
            return true;
        }
        let sample = sample_code(bytes, config.sample_size);
        let verdict = sample.passes(config);
        if !verdict {
            debug!(
                sample_len = sample.sample_len,
                marker_ratio = sample.marker_ratio(),
                null_ratio = sample.null_ratio(),
                undefined_ratio = sample.undefined_ratio(),
                "region does not look like code"
            );
        }
        verdict
    }
}
