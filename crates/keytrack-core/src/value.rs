//! Interpolatable value types.
//!
//! One generic capability trait replaces per-type interpolation code:
//! scalars, fixed-size vectors and matrices share the affine defaults,
//! while [`Quat`] overrides the spherical seams (slerp, spherical cubic,
//! finite-difference derivatives).

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Capability trait for values a keyframe track can interpolate.
///
/// Implementors provide `add`/`scale`/`dot`; everything else (affine lerp,
/// the 4-point cubic Bezier basis and its analytic derivatives) comes from
/// the provided methods. Rotation types override `lerp` and the cubic
/// family with spherical arithmetic.
///
/// Bezier control-point convention for a segment from key `k1` to `k2`
/// over time span `span`:
///
/// ```text
/// P0 = k1.out_value
/// P1 = P0 + k1.out_tangent * span
/// P2 = k2.in_value + k2.in_tangent * span
/// P3 = k2.in_value
/// ```
///
/// Tangents scale with the span so keyframe density does not distort the
/// curve shape. A straight segment of slope `m` (value per second) has
/// `out_tangent = m / 3` and `in_tangent = -m / 3`.
pub trait Interpolate: Copy + PartialEq + Debug {
    const ZERO: Self;

    fn add(self, other: Self) -> Self;
    fn scale(self, k: f32) -> Self;
    fn dot(self, other: Self) -> f32;

    #[inline]
    fn sub(self, other: Self) -> Self {
        self.add(other.scale(-1.0))
    }

    #[inline]
    fn magnitude(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit-length direction, or the value unchanged when it has no length.
    #[inline]
    fn normalized(self) -> Self {
        let len2 = self.dot(self);
        if len2 > 0.0 {
            self.scale(len2.sqrt().recip())
        } else {
            self
        }
    }

    #[inline]
    fn is_finite(self) -> bool {
        self.dot(self).is_finite()
    }

    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.add(b.sub(a).scale(t))
    }

    /// First derivative of the `lerp` path with respect to normalized time.
    /// The affine chord is constant; spherical types override this to follow
    /// the slerp arc.
    #[inline]
    fn linear_velocity(a: Self, b: Self, _t: f32) -> Self {
        b.sub(a)
    }

    /// Second derivative of the `lerp` path with respect to normalized time.
    #[inline]
    fn linear_acceleration(_a: Self, _b: Self, _t: f32) -> Self {
        Self::ZERO
    }

    /// 4-point cubic Bezier at normalized time `t` in [0,1].
    #[inline]
    fn cubic(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let u = 1.0 - t;
        p0.scale(u * u * u)
            .add(p1.scale(3.0 * u * u * t))
            .add(p2.scale(3.0 * u * t * t))
            .add(p3.scale(t * t * t))
    }

    /// First derivative of the Bezier basis with respect to normalized time.
    #[inline]
    fn cubic_velocity(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let u = 1.0 - t;
        p1.sub(p0)
            .scale(3.0 * u * u)
            .add(p2.sub(p1).scale(6.0 * u * t))
            .add(p3.sub(p2).scale(3.0 * t * t))
    }

    /// Second derivative of the Bezier basis with respect to normalized time.
    #[inline]
    fn cubic_acceleration(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let u = 1.0 - t;
        p2.add(p0)
            .add(p1.scale(-2.0))
            .scale(6.0 * u)
            .add(p3.add(p1).add(p2.scale(-2.0)).scale(6.0 * t))
    }
}

impl Interpolate for f32 {
    const ZERO: Self = 0.0;

    #[inline]
    fn add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn scale(self, k: f32) -> Self {
        self * k
    }

    #[inline]
    fn dot(self, other: Self) -> f32 {
        self * other
    }
}

macro_rules! impl_interpolate_array {
    ($($n:literal),*) => {$(
        impl Interpolate for [f32; $n] {
            const ZERO: Self = [0.0; $n];

            #[inline]
            fn add(self, other: Self) -> Self {
                let mut out = self;
                for i in 0..$n {
                    out[i] += other[i];
                }
                out
            }

            #[inline]
            fn scale(self, k: f32) -> Self {
                let mut out = self;
                for i in 0..$n {
                    out[i] *= k;
                }
                out
            }

            #[inline]
            fn dot(self, other: Self) -> f32 {
                let mut acc = 0.0;
                for i in 0..$n {
                    acc += self[i] * other[i];
                }
                acc
            }
        }
    )*};
}

// Vec2/Vec3/Vec4 and a column-major 4x4 matrix.
impl_interpolate_array!(2, 3, 4, 16);

/// Unit quaternion (x, y, z, w).
///
/// Participates in the same keyframe machinery as the affine types but all
/// blending is spherical: component-wise lerp/tangent math is invalid for
/// rotations and is never used on the value path.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quat(pub [f32; 4]);

/// Epsilon used by the spherical finite-difference derivatives.
const QUAT_DIFF_EPS: f32 = 1e-3;

impl Quat {
    pub const IDENTITY: Quat = Quat([0.0, 0.0, 0.0, 1.0]);

    /// Spherical linear interpolation with shortest-arc correction.
    /// Falls back to normalized lerp when the inputs are nearly parallel.
    pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
        let mut b = b;
        let mut d = a.dot(b);
        if d < 0.0 {
            b = b.scale(-1.0);
            d = -d;
        }
        if d > 0.9995 {
            return a.add(b.sub(a).scale(t)).normalized();
        }
        let theta = d.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        a.scale(wa).add(b.scale(wb))
    }

    /// Normalize, or substitute `fallback` when the quaternion has no length
    /// (degenerate control points from extreme tangents).
    fn unit_or(self, fallback: Quat) -> Quat {
        let len2 = self.dot(self);
        if len2 > 1e-12 {
            self.scale(len2.sqrt().recip())
        } else {
            fallback
        }
    }

    /// Align `self` to the same hemisphere as `reference` for differencing.
    fn hemi(self, reference: Quat) -> Quat {
        if self.dot(reference) < 0.0 {
            self.scale(-1.0)
        } else {
            self
        }
    }
}

impl Interpolate for Quat {
    const ZERO: Self = Quat([0.0; 4]);

    #[inline]
    fn add(self, other: Self) -> Self {
        Quat(self.0.add(other.0))
    }

    #[inline]
    fn scale(self, k: f32) -> Self {
        Quat(self.0.scale(k))
    }

    #[inline]
    fn dot(self, other: Self) -> f32 {
        self.0.dot(other.0)
    }

    #[inline]
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        Quat::slerp(a, b, t)
    }

    /// Derivative of the slerp arc, not the component-wise chord: with a
    /// far-hemisphere endpoint the chord points the wrong way and overstates
    /// the speed the value path actually moves at.
    fn linear_velocity(a: Self, b: Self, t: f32) -> Self {
        let tc = t.clamp(QUAT_DIFF_EPS, 1.0 - QUAT_DIFF_EPS);
        let center = Quat::slerp(a, b, tc);
        let before = Quat::slerp(a, b, tc - QUAT_DIFF_EPS).hemi(center);
        let after = Quat::slerp(a, b, tc + QUAT_DIFF_EPS).hemi(center);
        after.sub(before).scale(1.0 / (2.0 * QUAT_DIFF_EPS))
    }

    fn linear_acceleration(a: Self, b: Self, t: f32) -> Self {
        let tc = t.clamp(QUAT_DIFF_EPS, 1.0 - QUAT_DIFF_EPS);
        let center = Quat::slerp(a, b, tc);
        let before = Quat::slerp(a, b, tc - QUAT_DIFF_EPS).hemi(center);
        let after = Quat::slerp(a, b, tc + QUAT_DIFF_EPS).hemi(center);
        after
            .add(before)
            .sub(center.scale(2.0))
            .scale(1.0 / (QUAT_DIFF_EPS * QUAT_DIFF_EPS))
    }

    /// Spherical cubic (SCubic): quadrangle of slerps, unit length at every t.
    fn cubic(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let q1 = p0.unit_or(Quat::IDENTITY);
        let q2 = p3.unit_or(q1);
        let a = p1.unit_or(q1);
        let b = p2.unit_or(q2);
        let outer = Quat::slerp(q1, q2, t);
        let inner = Quat::slerp(a, b, t);
        Quat::slerp(outer, inner, 2.0 * t * (1.0 - t))
    }

    /// Symmetric finite difference of the spherical curve; analytic squad
    /// derivatives are not worth their complexity here.
    fn cubic_velocity(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let tc = t.clamp(QUAT_DIFF_EPS, 1.0 - QUAT_DIFF_EPS);
        let center = Self::cubic(p0, p1, p2, p3, tc);
        let before = Self::cubic(p0, p1, p2, p3, tc - QUAT_DIFF_EPS).hemi(center);
        let after = Self::cubic(p0, p1, p2, p3, tc + QUAT_DIFF_EPS).hemi(center);
        after.sub(before).scale(1.0 / (2.0 * QUAT_DIFF_EPS))
    }

    fn cubic_acceleration(p0: Self, p1: Self, p2: Self, p3: Self, t: f32) -> Self {
        let tc = t.clamp(QUAT_DIFF_EPS, 1.0 - QUAT_DIFF_EPS);
        let center = Self::cubic(p0, p1, p2, p3, tc);
        let before = Self::cubic(p0, p1, p2, p3, tc - QUAT_DIFF_EPS).hemi(center);
        let after = Self::cubic(p0, p1, p2, p3, tc + QUAT_DIFF_EPS).hemi(center);
        after
            .add(before)
            .sub(center.scale(2.0))
            .scale(1.0 / (QUAT_DIFF_EPS * QUAT_DIFF_EPS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slerp_midpoint_is_half_angle() {
        let a = Quat::IDENTITY;
        // 90 degrees around Y
        let b = Quat([0.0, std::f32::consts::FRAC_1_SQRT_2, 0.0, std::f32::consts::FRAC_1_SQRT_2]);
        let m = Quat::slerp(a, b, 0.5);
        // 45 degrees around Y
        assert!((m.0[1] - (std::f32::consts::FRAC_PI_8).sin()).abs() < 1e-5);
        assert!((m.0[3] - (std::f32::consts::FRAC_PI_8).cos()).abs() < 1e-5);
        assert!((m.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cubic_matches_bernstein_expansion() {
        let (p0, p1, p2, p3) = (0.0f32, 1.0, -1.0, 0.0);
        let t = 0.3f32;
        let u = 1.0 - t;
        let expected =
            u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3;
        assert!((f32::cubic(p0, p1, p2, p3, t) - expected).abs() < 1e-6);
    }
}
