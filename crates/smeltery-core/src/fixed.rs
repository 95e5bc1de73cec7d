use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Converter ticks since activation.
pub type Ticks = u64;

/// Convert an f64 constant to Fixed64. Panics outside the Q32.32 range, so
/// values read from files go through [`checked_f64_to_fixed64`] instead.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert an f64 to Fixed64, or `None` for NaN, infinities and values
/// outside the Q32.32 range.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Convert a whole amount to Fixed64, saturating at `Fixed64::MAX`.
#[inline]
pub fn amount_to_fixed64(amount: u32) -> Fixed64 {
    Fixed64::saturating_from_num(amount)
}

/// Convert Fixed64 to f64. Use only for display and persistence.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Truncate toward zero into a non-negative whole amount.
///
/// Negative values clamp to 0; values beyond `u32::MAX` saturate.
#[inline]
pub fn floor_amount(v: Fixed64) -> u32 {
    if v <= Fixed64::ZERO {
        return 0;
    }
    v.to_num::<i64>().clamp(0, u32::MAX as i64) as u32
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}
