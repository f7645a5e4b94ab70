//! Segment evaluation: the four interpolation primitives over a resolved
//! pair of adjacent keyframes.
//!
//! All functions take the leaving key `k1`, the entering key `k2`, the
//! segment's time span in seconds, and a normalized time `u` in [0,1].
//! Derivatives are converted from normalized-time to per-second units by
//! dividing by the span (and span squared for acceleration).

use crate::keyframe::{Interp, Keyframe};
use crate::value::Interpolate;

/// Spans shorter than this are treated as degenerate: the value holds at
/// `k1.out_value` and derivatives are zero, so coincident keys never divide
/// by zero or produce NaN.
pub const SPAN_EPSILON: f32 = 1e-6;

fn control_points<T: Interpolate>(k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32) -> (T, T, T, T) {
    let p0 = k1.out_value;
    let p3 = k2.in_value;
    let p1 = p0.add(k1.out_tangent.scale(span));
    let p2 = p3.add(k2.in_tangent.scale(span));
    (p0, p1, p2, p3)
}

fn mode_value<T: Interpolate>(mode: Interp, k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    match mode {
        // Strict midpoint tie-break: u < 0.5 holds the leaving value,
        // u >= 0.5 takes the entering value.
        Interp::Step => {
            if u < 0.5 {
                k1.out_value
            } else {
                k2.in_value
            }
        }
        Interp::Linear => T::lerp(k1.out_value, k2.in_value, u),
        Interp::Bezier => {
            let (p0, p1, p2, p3) = control_points(k1, k2, span);
            T::cubic(p0, p1, p2, p3, u)
        }
    }
}

/// d/du of the mode's curve (normalized-time derivative).
fn mode_velocity<T: Interpolate>(mode: Interp, k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    match mode {
        Interp::Step => T::ZERO,
        Interp::Linear => T::linear_velocity(k1.out_value, k2.in_value, u),
        Interp::Bezier => {
            let (p0, p1, p2, p3) = control_points(k1, k2, span);
            T::cubic_velocity(p0, p1, p2, p3, u)
        }
    }
}

/// d²/du² of the mode's curve.
fn mode_acceleration<T: Interpolate>(mode: Interp, k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    match mode {
        Interp::Step => T::ZERO,
        Interp::Linear => T::linear_acceleration(k1.out_value, k2.in_value, u),
        Interp::Bezier => {
            let (p0, p1, p2, p3) = control_points(k1, k2, span);
            T::cubic_acceleration(p0, p1, p2, p3, u)
        }
    }
}

/// Evaluate the segment's value.
///
/// When the two keys declare different modes, both curves are evaluated and
/// blended with `lerp`/`slerp` at the same `u`. That is a deliberate
/// compromise, not a true dual-mode spline: it avoids a discontinuity at
/// the mode boundary while keeping each half's intent visible near its own
/// keyframe.
pub fn segment_value<T: Interpolate>(k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    if span.abs() < SPAN_EPSILON {
        return k1.out_value;
    }
    let v = if k1.interp_out == k2.interp_in {
        mode_value(k1.interp_out, k1, k2, span, u)
    } else {
        let a = mode_value(k1.interp_out, k1, k2, span, u);
        let b = mode_value(k2.interp_in, k1, k2, span, u);
        T::lerp(a, b, u)
    };
    // NaN inputs degrade to the last known value, never into the frame loop.
    if v.is_finite() {
        v
    } else {
        k1.out_value
    }
}

/// First derivative of the segment in value units per second.
pub fn segment_velocity<T: Interpolate>(k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    if span.abs() < SPAN_EPSILON {
        return T::ZERO;
    }
    let d = if k1.interp_out == k2.interp_in {
        mode_velocity(k1.interp_out, k1, k2, span, u)
    } else {
        // d/du of (1-u)·A(u) + u·B(u), with the blend treated component-wise.
        let a = mode_value(k1.interp_out, k1, k2, span, u);
        let b = mode_value(k2.interp_in, k1, k2, span, u);
        let da = mode_velocity(k1.interp_out, k1, k2, span, u);
        let db = mode_velocity(k2.interp_in, k1, k2, span, u);
        da.scale(1.0 - u).add(db.scale(u)).add(b.sub(a))
    };
    let d = d.scale(1.0 / span);
    if d.is_finite() {
        d
    } else {
        T::ZERO
    }
}

/// Second derivative of the segment in value units per second squared.
pub fn segment_acceleration<T: Interpolate>(k1: &Keyframe<T>, k2: &Keyframe<T>, span: f32, u: f32) -> T {
    if span.abs() < SPAN_EPSILON {
        return T::ZERO;
    }
    let d = if k1.interp_out == k2.interp_in {
        mode_acceleration(k1.interp_out, k1, k2, span, u)
    } else {
        let da = mode_velocity(k1.interp_out, k1, k2, span, u);
        let db = mode_velocity(k2.interp_in, k1, k2, span, u);
        let dda = mode_acceleration(k1.interp_out, k1, k2, span, u);
        let ddb = mode_acceleration(k2.interp_in, k1, k2, span, u);
        dda.scale(1.0 - u)
            .add(ddb.scale(u))
            .add(db.sub(da).scale(2.0))
    };
    let d = d.scale(1.0 / (span * span));
    if d.is_finite() {
        d
    } else {
        T::ZERO
    }
}
