// SPDX: CC0-1.0

use crate::Number;

pub const DEFAULT_PRECISION: u32 = 8;

/// Larger precisions are clamped to this.
pub const MAX_PRECISION: u32 = 100;

pub const ERROR: &str = "ERROR";

pub const UNDEFINED: &str = "UNDEFINED";

/// Fixed-point rendering with `precision` fractional digits, without a minus
/// sign on zero.
pub fn format(value: Number, precision: u32) -> String {
    if value.is_nan() {
        return UNDEFINED.to_string();
    }
    if value.is_infinite() {
        let s = if value > 0.0 { "inf" } else { "-inf" };
        return s.to_string();
    }

    let prec = precision.min(MAX_PRECISION) as usize;
    let s = format!("{value:.prec$}");
    match s.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0' || b == b'.') => digits.to_string(),
        _ => s,
    }
}
