//! Fixed 9-decimal rounding applied to every floating value before storage.

/// Digits kept after the decimal point.
pub const DECIMALS: usize = 9;

/// Round `value` to 9 decimal digits.
///
/// Rounding goes through the decimal rendering, so it holds at any magnitude
/// and `Display` of the result never shows more than 9 decimals. Non-finite
/// values are returned unchanged. Negative zero collapses to zero so it
/// prints as `0`.
pub fn round9(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let rounded = format!("{:.*}", DECIMALS, value)
        .parse::<f64>()
        .unwrap_or(value);
    if rounded == 0.0 { 0.0 } else { rounded }
}
