//! Fixed-point math utilities for deterministic resolution.
//!
//! Tonnage ratios, ram and charge damage, and hex-line interpolation all go
//! through fixed-point arithmetic so that two servers fed the same seed and
//! the same declarations compute bit-identical results.

use fixed::types::I32F32;

/// Fixed-point number type for all fractional rules math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Smallest nudge applied to hex-line endpoints so that lines running
/// exactly along a hex edge round consistently to one side (about 1e-6).
pub const EPSILON: Fixed = Fixed::from_bits(4_295);

/// Rounds a non-negative fixed-point value up to the next whole number.
///
/// Negative inputs clamp to zero; damage is never negative.
#[must_use]
pub fn ceil_u32(value: Fixed) -> u32 {
    if value <= Fixed::ZERO {
        return 0;
    }
    value.ceil().to_num::<u32>()
}

/// `ceil(tonnage / divisor * multiplier)`, the shape shared by all
/// weight-scaled physical damage formulas.
#[must_use]
pub fn tonnage_damage(tonnage: u32, divisor: u32, multiplier: u32) -> u32 {
    if divisor == 0 {
        return 0;
    }
    let ratio = Fixed::from_num(tonnage) / Fixed::from_num(divisor);
    ceil_u32(ratio * Fixed::from_num(multiplier))
}

/// Linearly interpolate between two fixed-point values.
#[must_use]
pub fn lerp(a: Fixed, b: Fixed, t: Fixed) -> Fixed {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_ceil_u32() {
        assert_eq!(ceil_u32(Fixed::from_num(0)), 0);
        assert_eq!(ceil_u32(Fixed::from_num(-3)), 0);
        assert_eq!(ceil_u32(Fixed::from_num(2)), 2);
        assert_eq!(ceil_u32(Fixed::from_num(2.25)), 3);
    }

    #[test]
    fn test_tonnage_damage() {
        // 65 tons punching: ceil(6.5)
        assert_eq!(tonnage_damage(65, 10, 1), 7);
        // 65 tons kicking: ceil(13)
        assert_eq!(tonnage_damage(65, 5, 1), 13);
        // 50 tons charging after 4 hexes: ceil(5 * 3)
        assert_eq!(tonnage_damage(50, 10, 3), 15);
        // dropship of 3500 tons ramming at net velocity 2
        assert_eq!(tonnage_damage(3_500, 10, 2), 700);
        assert_eq!(tonnage_damage(45, 10, 0), 0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = lerp(Fixed::from_num(0), Fixed::from_num(10), Fixed::from_num(0.5));
        assert_eq!(mid, Fixed::from_num(5));
    }
}
