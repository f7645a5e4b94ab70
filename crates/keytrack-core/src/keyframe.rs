//! Keyframe types: a time-stamped sample plus interpolation metadata.

use serde::{Deserialize, Serialize};

use crate::value::Interpolate;

/// Interpolation mode for one side of a segment.
///
/// The numeric codes are part of the textual encoding and must stay stable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interp {
    Step,
    Linear,
    Bezier,
}

impl Interp {
    #[inline]
    pub const fn code(self) -> u32 {
        match self {
            Interp::Step => 0,
            Interp::Linear => 1,
            Interp::Bezier => 2,
        }
    }

    #[inline]
    pub fn from_code(code: u32) -> Option<Interp> {
        match code {
            0 => Some(Interp::Step),
            1 => Some(Interp::Linear),
            2 => Some(Interp::Bezier),
            _ => None,
        }
    }
}

/// A continuous keyframe with asymmetric in/out values and tangents.
///
/// `in_value != out_value` models a value step exactly at the key;
/// `interp_in`/`interp_out` apply to the segment entering/leaving it.
/// Tangents are slopes per second divided by three (see [`Interpolate`]
/// for the control-point convention).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T: Interpolate> {
    pub time: f32,
    pub in_value: T,
    pub out_value: T,
    pub in_tangent: T,
    pub out_tangent: T,
    pub interp_in: Interp,
    pub interp_out: Interp,
}

impl<T: Interpolate> Keyframe<T> {
    /// A smooth pass-through key: identical in/out value, zero tangents,
    /// the same mode on both sides.
    pub fn smooth(time: f32, value: T, interp: Interp) -> Self {
        Self {
            time,
            in_value: value,
            out_value: value,
            in_tangent: T::ZERO,
            out_tangent: T::ZERO,
            interp_in: interp,
            interp_out: interp,
        }
    }

    /// True when the key carries a value discontinuity.
    #[inline]
    pub fn is_corner(&self) -> bool {
        self.in_value != self.out_value
    }
}

/// A discrete keyframe: a single held value, no tangents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepKeyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> StepKeyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}
