//! Rewrites `[rip+disp]` operands in assembly text into data labels.
//!
//! The substitution is driven purely by the text: the displacement printed
//! inside the brackets selects the label. The reference list produced by the
//! scanner is accepted alongside but does not influence the output; when it
//! disagrees with the text in count, that is logged and left alone.

use crate::analysis::rip::RipReference;
use crate::config::RewriteConfig;
use crate::error::Result;
use crate::rewrite::buffer::TextBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, Span};

/// Literal that opens a RIP-relative memory operand.
pub const RIP_OPERAND_OPEN: &str = "[rip";
pub const RIP_OPERAND_CLOSE: char = ']';
pub const DATA_LABEL_PREFIX: &str = "data_0x";

/// Outcome counts for one rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewriteStats {
    /// Operands replaced by a label
    pub rewritten: usize,
    /// Operands copied unchanged because no displacement could be parsed
    pub passed_through: usize,
}

/// Bracketed label for a displacement, rendered from its low 32 bits.
pub fn data_label(displacement: i64) -> String {
    format!("[{}{:x}]", DATA_LABEL_PREFIX, displacement as u32)
}

/// Parse the hex token following the first `+` or `-` in `expr`.
///
/// `expr` is the operand text between `[rip` and `]`. The token may carry
/// leading whitespace, its own sign and an optional `0x` prefix; hex digits
/// are consumed until the first non-digit. The operator character only
/// locates the token and does not change its sign.
pub fn parse_displacement(expr: &str) -> Option<i64> {
    let op = expr.find(|c: char| c == '+' || c == '-')?;
    let mut token = expr[op + 1..].trim_start();

    let negative = match token.as_bytes().first() {
        Some(b'-') => {
            token = &token[1..];
            true
        }
        Some(b'+') => {
            token = &token[1..];
            false
        }
        _ => false,
    };
    if let Some(rest) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        token = rest;
    }

    let digits = token
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(token.len());
    if digits == 0 {
        return None;
    }
    let magnitude = u64::from_str_radix(&token[..digits], 16).ok()? as i64;
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

/// Per-call span; kept at debug so a default `info` subscriber stays quiet.
fn rewrite_span(text_len: usize) -> Span {
    debug_span!("rewrite_rip_labels", bytes = text_len)
}

/// Rewrite every `[rip...]` operand in `text` into `output`.
///
/// On exhaustion the error is returned and whatever was already written
/// stays in `output`, which is left truncated.
pub fn rewrite(
    text: &str,
    references: &[RipReference],
    output: &mut TextBuffer,
) -> Result<RewriteStats> {
    let _span = rewrite_span(text.len()).entered();
    let mut stats = RewriteStats::default();
    let mut cursor = 0usize;

    while let Some(found) = text[cursor..].find(RIP_OPERAND_OPEN) {
        let start = cursor + found;
        output.try_write(&text[cursor..start])?;

        let expr_start = start + RIP_OPERAND_OPEN.len();
        let Some(close) = text[expr_start..].find(RIP_OPERAND_CLOSE) else {
            // Unterminated operand: nothing left to rewrite
            output.try_write(&text[start..])?;
            stats.passed_through += 1;
            cursor = text.len();
            break;
        };
        let end = expr_start + close + RIP_OPERAND_CLOSE.len_utf8();

        match parse_displacement(&text[expr_start..expr_start + close]) {
            Some(displacement) => {
                output.try_write(&data_label(displacement))?;
                stats.rewritten += 1;
            }
            None => {
                output.try_write(&text[start..end])?;
                stats.passed_through += 1;
            }
        }
        cursor = end;
    }
    output.try_write(&text[cursor..])?;

    if !references.is_empty() && references.len() != stats.rewritten {
        debug!(
            references = references.len(),
            rewritten = stats.rewritten,
            "reference list and assembly text disagree"
        );
    }
    debug!(
        rewritten = stats.rewritten,
        passed_through = stats.passed_through,
        output_len = output.len(),
        "rewrite complete"
    );
    Ok(stats)
}

/// Rewrite into a freshly sized buffer and return the text.
pub fn rewrite_to_string(
    text: &str,
    references: &[RipReference],
    config: &RewriteConfig,
) -> Result<String> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let mut output = TextBuffer::new(config.capacity_for(text.len()))?;
    rewrite(text, references, &mut output)?;
    Ok(output.into_string())
}
