// SPDX-License-Identifier: Apache-2.0
//! Easing curves mapping normalized time to a normalized output value
//! (the animation update's step 6, "apply the easing curve").

use std::f32::consts::PI;

/// A named easing curve, or an opaque user-supplied one.
///
/// `Custom` stands in for the source's Lua-script easing callback: the
/// scene graph never calls into a scripting engine itself (Lua bindings
/// are a behavioral contract, not a language binding — see the purpose
/// and scope), so a host embedding a script runtime plugs its own
/// function in here.
#[derive(Clone)]
pub enum EasingCurve {
    /// `x = t`.
    Linear,
    /// `x = t^2`.
    InQuad,
    /// `x = 1 - (1-t)^2`.
    OutQuad,
    /// Quad ease-in for the first half, ease-out for the second.
    InOutQuad,
    /// `x = t^3`.
    InCubic,
    /// `x = 1 - (1-t)^3`.
    OutCubic,
    /// Half a sine wave, ease-in.
    InSine,
    /// Half a sine wave, ease-out.
    OutSine,
    /// A host-supplied easing function.
    Custom(std::sync::Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl std::fmt::Debug for EasingCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::InQuad => write!(f, "InQuad"),
            Self::OutQuad => write!(f, "OutQuad"),
            Self::InOutQuad => write!(f, "InOutQuad"),
            Self::InCubic => write!(f, "InCubic"),
            Self::OutCubic => write!(f, "OutCubic"),
            Self::InSine => write!(f, "InSine"),
            Self::OutSine => write!(f, "OutSine"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl EasingCurve {
    /// Applies the curve to `t` (expected in `[0, 1]`), returning `x`.
    #[must_use]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
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
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InSine => 1.0 - (t * PI / 2.0).cos(),
            Self::OutSine => (t * PI / 2.0).sin(),
            Self::Custom(f) => f(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_is_identity() {
        let c = EasingCurve::Linear;
        assert!((c.apply(0.25) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoints_are_fixed_for_every_curve() {
        for c in [
            EasingCurve::Linear,
            EasingCurve::InQuad,
            EasingCurve::OutQuad,
            EasingCurve::InOutQuad,
            EasingCurve::InCubic,
            EasingCurve::OutCubic,
            EasingCurve::InSine,
            EasingCurve::OutSine,
        ] {
            assert!((c.apply(0.0) - 0.0).abs() < 1e-5);
            assert!((c.apply(1.0) - 1.0).abs() < 1e-5);
        }
    }
}
