//! Log-domain quantization of play counts.
//!
//! Raw play counts are heavy-tailed (a handful of plays for most items, a
//! few items played hundreds of times), so the model works on a single-byte
//! log encoding instead:
//!
//! ```text
//! level = round(log2(count)) + 1      count >= 1
//! ```
//!
//! Level `0` is reserved for "no interaction". The reverse mapping used for
//! reporting is `2^(level - 1)` with **no** rounding back, so encode and
//! decode are deliberately not inverses: `decode(encode(3)) == 4.0`. Both
//! formulas are part of the persisted-data contract and must not be
//! "corrected" independently.

/// Encode a raw play count (>= 1) as a one-byte log level.
///
/// The caller validates positivity; this is the pure numeric map.
#[inline]
#[must_use]
pub fn encode(count: u32) -> u8 {
    debug_assert!(count >= 1, "zero counts are never encoded");
    ((count as f64).log2().round() as u8) + 1
}

/// Decode a log-domain value back to the raw domain: `2^(level - 1)`.
///
/// Accepts fractional levels because KNN predictions are weighted averages
/// of integer levels. `decode(0.0)` is `0.5`, the zero-confidence output.
#[inline]
#[must_use]
pub fn decode(level: f32) -> f32 {
    2f32.powf(level - 1.0)
}

/// Decode to an integer count by truncation.
///
/// Truncation (not rounding) matches the persisted evaluation output: a
/// zero-confidence prediction of `0.0` decodes to `0.5` and truncates to
/// a raw count of `0`.
#[inline]
#[must_use]
pub fn decode_to_count(level: f32) -> u32 {
    decode(level) as u32
}
