//! Easing curves.
//!
//! An easing maps a normalized time onto a progress value. Curves are
//! expected to map `0 -> 0` and `1 -> 1`; anything in between is fair game,
//! including overshoot (`OutBack`, `ElasticOut`).
//!
//! Inputs are NOT clamped. Callers that want a bounded result must clamp
//! themselves.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Anything that can shape a normalized time value.
///
/// Implemented by [`Ease`] and by every `Fn(f32) -> f32`, so ad-hoc curves
/// can be plugged in without a wrapper type.
pub trait Easing: Send + Sync {
    /// Applies the curve to `t`.
    fn ease(&self, t: f32) -> f32;
}

impl<F> Easing for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    #[inline]
    fn ease(&self, t: f32) -> f32 {
        self(t)
    }
}

/// The built-in easing catalogue.
///
/// Serialized in `snake_case` (`"out_quint"`, `"in_out_sine"`, ...), which is
/// how presets name their curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Identity.
    #[default]
    Linear,
    /// `t^2`
    InQuad,
    /// Decelerating quadratic.
    OutQuad,
    /// Quadratic, accelerate then decelerate.
    InOutQuad,
    /// `t^3`
    InCubic,
    /// Decelerating cubic.
    OutCubic,
    /// Cubic, accelerate then decelerate.
    InOutCubic,
    /// `t^4`
    InQuart,
    /// Decelerating quartic.
    OutQuart,
    /// `t^5`
    InQuint,
    /// Decelerating quintic - big burst, long tail.
    OutQuint,
    /// Sine ease-in.
    InSine,
    /// Sine ease-out.
    OutSine,
    /// Sine ease-in-out.
    InOutSine,
    /// Exponential ease-in.
    InExpo,
    /// Exponential ease-out.
    OutExpo,
    /// Pulls back before moving forward.
    InBack,
    /// Overshoots the target, then settles.
    OutBack,
    /// Springy overshoot.
    ElasticOut,
    /// Bounces into place at the start.
    InBounce,
    /// Bounces into place at the end.
    OutBounce,
}

impl Ease {
    /// Every built-in curve, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
        Self::InQuart,
        Self::OutQuart,
        Self::InQuint,
        Self::OutQuint,
        Self::InSine,
        Self::OutSine,
        Self::InOutSine,
        Self::InExpo,
        Self::OutExpo,
        Self::InBack,
        Self::OutBack,
        Self::ElasticOut,
        Self::InBounce,
        Self::OutBounce,
    ];

    /// Applies the easing function to `t`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        const BACK_C1: f32 = 1.701_58;
        const BACK_C3: f32 = BACK_C1 + 1.0;

        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::InCubic => t.powi(3),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::InQuart => t.powi(4),
            Self::OutQuart => 1.0 - (1.0 - t).powi(4),
            Self::InQuint => t.powi(5),
            Self::OutQuint => 1.0 - (1.0 - t).powi(5),
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::InExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Self::InBack => BACK_C3 * t.powi(3) - BACK_C1 * t * t,
            Self::OutBack => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Self::ElasticOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = 2.0 * PI / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Self::InBounce => 1.0 - bounce_out(1.0 - t),
            Self::OutBounce => bounce_out(t),
        }
    }
}

impl Easing for Ease {
    #[inline]
    fn ease(&self, t: f32) -> f32 {
        self.apply(t)
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984_375
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_curves_hit_endpoints() {
        for ease in Ease::ALL {
            assert!(ease.apply(0.0).abs() < 1e-3, "{ease:?} at 0 = {}", ease.apply(0.0));
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-3, "{ease:?} at 1 = {}", ease.apply(1.0));
        }
    }

    #[test]
    fn test_shapes() {
        assert!(Ease::InQuad.apply(0.5) < 0.5);
        assert!(Ease::OutQuad.apply(0.5) > 0.5);
        assert!((Ease::InOutQuad.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Ease::OutBack.apply(0.8) > 1.0, "out_back overshoots");
    }

    #[test]
    fn test_closure_is_easing() {
        let half = |t: f32| t * 0.5;
        assert_eq!(half.ease(1.0), 0.5);

        let boxed: Box<dyn Easing> = Box::new(Ease::Linear);
        assert_eq!(boxed.ease(0.3), 0.3);
    }
}
