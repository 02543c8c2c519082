//! Normalized cubic bezier easing curves
//!
//! A curve maps segment progress `x` in `[0, 1]` to eased progress `y` in
//! `[0, 1]`, with implicit anchors at (0, 0) and (1, 1). Splitting a curve at
//! an interior point yields two renormalized curves that together trace the
//! original shape, which is what lets a key be inserted mid-segment without
//! changing the surrounding motion.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A normalized cubic bezier easing curve on the unit square
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bezier {
    /// First control point
    pub p1: Vec2,
    /// Second control point
    pub p2: Vec2,
}

impl Default for Bezier {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl Bezier {
    /// The identity easing, y = x
    pub const LINEAR: Self = Self {
        p1: Vec2::new(1.0 / 3.0, 1.0 / 3.0),
        p2: Vec2::new(2.0 / 3.0, 2.0 / 3.0),
    };

    /// Create a curve from its two control points
    #[must_use]
    pub const fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Eased progress at segment progress `x`
    #[must_use]
    pub fn evaluate(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        let u = self.solve_u(x);
        cubic(self.p1.y, self.p2.y, u)
    }

    /// Split the curve at segment progress `x` into the part before and after
    ///
    /// Both halves are renormalized to the unit square. Returns `None` when
    /// the split point is too close to an anchor to renormalize.
    #[must_use]
    pub fn split(&self, x: f32) -> Option<(Self, Self)> {
        const EDGE: f32 = 1e-4;
        if !(EDGE..=1.0 - EDGE).contains(&x) {
            return None;
        }
        let u = self.solve_u(x);

        // de Casteljau on (0,0), p1, p2, (1,1)
        let p0 = Vec2::ZERO;
        let p3 = Vec2::ONE;
        let q0 = p0.lerp(self.p1, u);
        let q1 = self.p1.lerp(self.p2, u);
        let q2 = self.p2.lerp(p3, u);
        let r0 = q0.lerp(q1, u);
        let r1 = q1.lerp(q2, u);
        let s = r0.lerp(r1, u);

        if s.x < EDGE || s.y < EDGE || s.x > 1.0 - EDGE || s.y > 1.0 - EDGE {
            return None;
        }

        let before = Self::new(q0 / s, r0 / s);
        let after = Self::new((r1 - s) / (Vec2::ONE - s), (q2 - s) / (Vec2::ONE - s));
        Some((before, after))
    }

    /// Curve parameter `u` with `x(u) == x`, by Newton with bisection fallback
    fn solve_u(&self, x: f32) -> f32 {
        let mut u = x;
        for _ in 0..8 {
            let err = cubic(self.p1.x, self.p2.x, u) - x;
            if err.abs() < 1e-6 {
                return u;
            }
            let d = cubic_derivative(self.p1.x, self.p2.x, u);
            if d.abs() < 1e-6 {
                break;
            }
            u = (u - err / d).clamp(0.0, 1.0);
        }

        // Bisection; x(u) is monotone for control points inside the unit square
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        for _ in 0..32 {
            u = (lo + hi) * 0.5;
            if cubic(self.p1.x, self.p2.x, u) < x {
                lo = u;
            } else {
                hi = u;
            }
        }
        u
    }
}

/// Cubic bezier component with anchors 0 and 1
fn cubic(c1: f32, c2: f32, u: f32) -> f32 {
    let v = 1.0 - u;
    3.0 * v * v * u * c1 + 3.0 * v * u * u * c2 + u * u * u
}

fn cubic_derivative(c1: f32, c2: f32, u: f32) -> f32 {
    let v = 1.0 - u;
    3.0 * v * v * c1 + 6.0 * v * u * (c2 - c1) + 3.0 * u * u * (1.0 - c2)
}
