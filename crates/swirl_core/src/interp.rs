//! Interpolation helpers.
//!
//! None of these clamp `t`: passing values outside `[0, 1]` extrapolates,
//! which callers rely on for overshooting easing curves.

use crate::error::{CoreError, CoreResult};
use crate::math::Vec2;

/// Linear interpolation: `a + t * (b - a)`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Component-wise [`lerp`] for vectors.
#[inline]
#[must_use]
pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

/// Inverse of [`lerp`]: where `v` lies on `[a, b]`.
///
/// # Errors
///
/// Returns [`CoreError::DivideByZero`] when `a == b`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> CoreResult<f32> {
    let span = b - a;
    if span == 0.0 {
        return Err(CoreError::DivideByZero { a, b });
    }
    Ok((v - a) / span)
}

/// Maps `v` from `[src_a, src_b]` onto `[dst_a, dst_b]`.
///
/// # Errors
///
/// Returns [`CoreError::DivideByZero`] when the source range is empty.
#[inline]
pub fn remap(src_a: f32, src_b: f32, dst_a: f32, dst_b: f32, v: f32) -> CoreResult<f32> {
    inverse_lerp(src_a, src_b, v).map(|t| lerp(dst_a, dst_b, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_extrapolates() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(10.0, 0.0, 0.25), 7.5);
        assert_eq!(lerp(0.0, 10.0, 1.5), 15.0);
        assert_eq!(lerp(0.0, 10.0, -0.5), -5.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.0, 10.0, 2.5), Ok(0.25));
        assert_eq!(inverse_lerp(10.0, 0.0, 2.5), Ok(0.75));
        assert_eq!(
            inverse_lerp(3.0, 3.0, 1.0),
            Err(CoreError::DivideByZero { a: 3.0, b: 3.0 })
        );
    }

    #[test]
    fn test_remap() {
        assert_eq!(remap(0.0, 1.0, 0.0, 255.0, 0.5), Ok(127.5));
        assert_eq!(remap(0.0, 10.0, 100.0, 0.0, 10.0), Ok(0.0));
        assert!(remap(1.0, 1.0, 0.0, 1.0, 0.3).is_err());
    }

    #[test]
    fn test_lerp_vec() {
        let v = lerp_vec(Vec2::ZERO, Vec2::new(10.0, -10.0), 0.5);
        assert_eq!(v, Vec2::new(5.0, -5.0));
    }
}
