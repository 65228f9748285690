//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
///
/// `NAN` inputs are mapped to `min`, so that a bad demand can never escape the range.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value.is_nan() {
        return min
    }

    value.max(min).min(max)
}

/// Arithmetic mean of the values, or `None` if there are none.
pub fn mean<T, I>(values: I) -> Option<T>
where
    T: Float,
    I: IntoIterator<Item = T>
{
    let mut sum = T::zero();
    let mut count = 0usize;

    for v in values {
        sum = sum + v;
        count += 1;
    }

    match count {
        0 => None,
        n => T::from(n).map(|n| sum / n)
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into the range `[-180, 180)`.
///
/// Attitude telemetry arrives in `[0, 360)`, so a small nose-down pitch shows up as `359.5`.
pub fn wrap_deg_180<T>(angle_deg: T) -> T
where
    T: Float
{
    let half = T::from(180.0).unwrap_or_else(T::zero);
    let full = half + half;

    rem_euclid(angle_deg + half, full) - half
}
