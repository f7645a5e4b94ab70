//! Tangent policies: spline-editing operations that rewrite a keyframe's
//! in/out tangents (and optionally values) to enforce continuity.
//!
//! Tangents follow the Bezier control-point convention in [`Interpolate`]:
//! a straight segment of slope `m` has `out_tangent = m/3` on the leaving
//! key and `in_tangent = -m/3` on the entering key. A key's in-direction is
//! therefore the negation of its out-direction when the curve is smooth,
//! which is why the unify operations negate the in side.

use serde::{Deserialize, Serialize};

use crate::eval::SPAN_EPSILON;
use crate::track::KeyframeTrack;
use crate::value::Interpolate;

/// Which side wins when unifying a keyframe's two tangents or values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TangentBias {
    Average,
    InBiased,
    OutBiased,
}

impl<T: Interpolate> KeyframeTrack<T> {
    /// The segment arriving at key `i`: `(previous index, span)`, or `None`
    /// for the first key of a non-looped track.
    fn incoming(&self, i: usize) -> Option<(usize, f32)> {
        if self.len() < 2 || i >= self.len() {
            return None;
        }
        if i == 0 && !self.looped() {
            return None;
        }
        let p = self.prev_index(i);
        Some((p, self.next_span(p)))
    }

    /// The segment leaving key `i`: `(next index, span)`, or `None` for the
    /// last key of a non-looped track.
    fn outgoing(&self, i: usize) -> Option<(usize, f32)> {
        if self.len() < 2 || i >= self.len() {
            return None;
        }
        if i == self.len() - 1 && !self.looped() {
            return None;
        }
        Some((self.next_index(i), self.next_span(i)))
    }

    /// Slope (value per second) of the straight line into key `i`.
    fn incoming_slope(&self, i: usize) -> Option<T> {
        let (p, span) = self.incoming(i)?;
        if span.abs() < SPAN_EPSILON {
            return None;
        }
        let keys = self.keys();
        Some(keys[i].in_value.sub(keys[p].out_value).scale(1.0 / span))
    }

    /// Slope (value per second) of the straight line out of key `i`.
    fn outgoing_slope(&self, i: usize) -> Option<T> {
        let (nx, span) = self.outgoing(i)?;
        if span.abs() < SPAN_EPSILON {
            return None;
        }
        let keys = self.keys();
        Some(keys[nx].in_value.sub(keys[i].out_value).scale(1.0 / span))
    }

    /// Recompute the out tangent from the straight-line slope to the next
    /// key, wrap-aware on looped tracks. The leaving half of the segment
    /// then reproduces the straight line exactly under Bezier evaluation.
    pub fn make_out_linear(&mut self, i: usize) {
        let tangent = self
            .outgoing_slope(i)
            .map(|m| m.scale(1.0 / 3.0))
            .unwrap_or(T::ZERO);
        if let Some(k) = self.key_mut(i) {
            k.out_tangent = tangent;
        }
    }

    /// Recompute the in tangent from the straight-line slope from the
    /// previous key, wrap-aware on looped tracks.
    pub fn make_in_linear(&mut self, i: usize) {
        let tangent = self
            .incoming_slope(i)
            .map(|m| m.scale(-1.0 / 3.0))
            .unwrap_or(T::ZERO);
        if let Some(k) = self.key_mut(i) {
            k.in_tangent = tangent;
        }
    }

    /// Align the two tangent directions, preserving each side's magnitude.
    ///
    /// `Average` blends the negated in-direction with the out-direction and
    /// reapplies the result to both sides; `InBiased`/`OutBiased` overwrite
    /// one side from the other's negation.
    pub fn unify_tangent_directions(&mut self, i: usize, bias: TangentBias) {
        let Some(k) = self.key(i).copied() else { return };
        let out_mag = k.out_tangent.magnitude();
        let in_mag = k.in_tangent.magnitude();
        let (out_t, in_t) = match bias {
            TangentBias::Average => {
                let dir = k
                    .out_tangent
                    .normalized()
                    .sub(k.in_tangent.normalized())
                    .normalized();
                if dir.magnitude() < SPAN_EPSILON {
                    return;
                }
                (dir.scale(out_mag), dir.scale(-in_mag))
            }
            TangentBias::OutBiased => {
                (k.out_tangent, k.out_tangent.normalized().scale(-in_mag))
            }
            TangentBias::InBiased => {
                (k.in_tangent.normalized().scale(-out_mag), k.in_tangent)
            }
        };
        if let Some(k) = self.key_mut(i) {
            k.out_tangent = out_t;
            k.in_tangent = in_t;
        }
    }

    /// Equalize the two tangent magnitudes, preserving directions. A side
    /// with zero length keeps its zero (its direction is undefined).
    pub fn unify_tangent_magnitudes(&mut self, i: usize, bias: TangentBias) {
        let Some(k) = self.key(i).copied() else { return };
        let out_mag = k.out_tangent.magnitude();
        let in_mag = k.in_tangent.magnitude();
        let target = match bias {
            TangentBias::Average => 0.5 * (out_mag + in_mag),
            TangentBias::InBiased => in_mag,
            TangentBias::OutBiased => out_mag,
        };
        if let Some(k) = self.key_mut(i) {
            k.out_tangent = k.out_tangent.normalized().scale(target);
            k.in_tangent = k.in_tangent.normalized().scale(target);
        }
    }

    /// Unify both direction and magnitude.
    pub fn unify_tangents(&mut self, i: usize, bias: TangentBias) {
        self.unify_tangent_directions(i, bias);
        self.unify_tangent_magnitudes(i, bias);
    }

    /// Collapse a value discontinuity at key `i` to a single value.
    pub fn unify_values(&mut self, i: usize, bias: TangentBias) {
        let Some(k) = self.key(i).copied() else { return };
        let value = match bias {
            TangentBias::Average => T::lerp(k.in_value, k.out_value, 0.5),
            TangentBias::InBiased => k.in_value,
            TangentBias::OutBiased => k.out_value,
        };
        if let Some(k) = self.key_mut(i) {
            k.in_value = value;
            k.out_value = value;
        }
    }

    /// Catmull-Rom-style auto tangents for key `i`.
    ///
    /// A pass-through key (`in_value == out_value`) takes the bias-weighted
    /// average of the slopes to its neighbors; a corner key derives each
    /// tangent independently from only its own side.
    pub fn generate_tangents(&mut self, i: usize, bias: TangentBias) {
        let Some(k) = self.key(i).copied() else { return };
        let slope_in = self.incoming_slope(i);
        let slope_out = self.outgoing_slope(i);
        let (out_t, in_t) = if !k.is_corner() {
            let m = match (slope_in, slope_out) {
                (Some(a), Some(b)) => match bias {
                    TangentBias::Average => a.add(b).scale(0.5),
                    TangentBias::InBiased => a,
                    TangentBias::OutBiased => b,
                },
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => T::ZERO,
            };
            (m.scale(1.0 / 3.0), m.scale(-1.0 / 3.0))
        } else {
            (
                slope_out.map(|m| m.scale(1.0 / 3.0)).unwrap_or(T::ZERO),
                slope_in.map(|m| m.scale(-1.0 / 3.0)).unwrap_or(T::ZERO),
            )
        };
        if let Some(k) = self.key_mut(i) {
            k.out_tangent = out_t;
            k.in_tangent = in_t;
        }
    }

    /// Run [`generate_tangents`](Self::generate_tangents) over every key.
    pub fn generate_all_tangents(&mut self, bias: TangentBias) {
        for i in 0..self.len() {
            self.generate_tangents(i, bias);
        }
    }
}
