//! Numeric conversion helpers used when leaving world space.
//!
//! World coordinates are `f64`; draw targets are integer pixels. These
//! helpers keep the lossy step in one place.

/// Truncate toward zero and clamp into the `i32` domain.
///
/// Non-finite input maps to `0`.
///
/// # Examples
/// ```
/// use tileclip::numeric::truncate_to_i32;
/// assert_eq!(truncate_to_i32(94.99), 94);
/// assert_eq!(truncate_to_i32(-3.7), -3);
/// assert_eq!(truncate_to_i32(f64::NAN), 0);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    reason = "The value is clamped to the i32 bounds before casting."
)]
#[must_use]
pub fn truncate_to_i32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let clamped = value
        .trunc()
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    clamped as i32
}
