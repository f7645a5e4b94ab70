//! Curve: a keyframe track plus playback state and an optional baked cache.
//!
//! The evaluation state machine is an explicit two-state enum: `Keyframed`
//! walks the track through the segment evaluator, `Baked` indexes a
//! fixed-rate sample array. `bake()` and any structural edit are the only
//! transitions.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::eval::{self, SPAN_EPSILON};
use crate::keyframe::{Keyframe, StepKeyframe};
use crate::track::{KeyframeTrack, StepTrack};
use crate::value::Interpolate;

/// Wrap `t` into `[0, length)`; negative times wrap backwards.
pub(crate) fn wrap_time(t: f32, length: f32) -> f32 {
    if length <= 0.0 {
        return 0.0;
    }
    let m = t % length;
    if m < 0.0 {
        m + length
    } else {
        m
    }
}

/// Fixed-rate sample cache produced by [`Curve::bake`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedSamples<T> {
    /// Sample rate in frames per second.
    pub fps: f32,
    /// When set, lookups blend between adjacent samples (wrapping at the
    /// array end on looped tracks) instead of holding the nearest frame,
    /// so a coarse bake emulates higher apparent resolution.
    pub smooth: bool,
    pub samples: Vec<T>,
}

impl<T: Interpolate> BakedSamples<T> {
    /// O(1) lookup by time. `length_seconds`/`looped` come from the owning
    /// track; `fallback` is returned when the cache is empty.
    pub fn value_at(&self, time: f32, length_seconds: f32, looped: bool, fallback: T) -> T {
        let n = self.samples.len();
        if n == 0 {
            return fallback;
        }
        let t = if looped {
            wrap_time(time, length_seconds)
        } else {
            time.clamp(0.0, length_seconds.max(0.0))
        };
        let ft = t * self.fps;
        if self.smooth {
            let base = ft.floor();
            let frac = ft - base;
            let i0 = (base as usize).min(n - 1);
            let i1 = if looped { (i0 + 1) % n } else { (i0 + 1).min(n - 1) };
            T::lerp(self.samples[i0], self.samples[i1], frac)
        } else {
            self.samples[(ft.floor() as usize).min(n - 1)]
        }
    }
}

impl<T: Serialize> BakedSamples<T> {
    /// Stable JSON export for serializers/FFI.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Evaluation state: walk the track, or index the baked cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SampleMode<T> {
    Keyframed,
    Baked(BakedSamples<T>),
}

/// A resolved query position within a track.
#[derive(Copy, Clone, Debug)]
enum Resolved {
    /// Empty track: the default value applies.
    Empty,
    /// Single key, or a clamped out-of-range query on a non-looped track.
    Hold(usize),
    /// Inside the segment leaving key `i` toward key `j`.
    Segment { i: usize, j: usize, span: f32, u: f32 },
}

/// An animation track for one continuously interpolatable property.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Curve<T: Interpolate> {
    track: KeyframeTrack<T>,
    default_value: T,
    current_time: f32,
    current_value: T,
    current_velocity: T,
    mode: SampleMode<T>,
    /// Last resolved key index, reused by `advance` so monotone playback
    /// does not re-search from the track head. Never shared across threads.
    #[serde(skip)]
    hint: usize,
}

impl<T: Interpolate> Curve<T> {
    pub fn new(length_seconds: f32, looped: bool, default_value: T) -> Self {
        Self::from_track(KeyframeTrack::new(length_seconds, looped), default_value)
    }

    pub fn from_track(track: KeyframeTrack<T>, default_value: T) -> Self {
        Self {
            track,
            default_value,
            current_time: 0.0,
            current_value: default_value,
            current_velocity: T::ZERO,
            mode: SampleMode::Keyframed,
            hint: 0,
        }
    }

    #[inline]
    pub fn track(&self) -> &KeyframeTrack<T> {
        &self.track
    }

    /// Mutable track access. Any structural edit may invalidate a bake, so
    /// taking this reference conservatively drops the baked cache.
    pub fn track_mut(&mut self) -> &mut KeyframeTrack<T> {
        self.invalidate();
        &mut self.track
    }

    #[inline]
    pub fn default_value(&self) -> T {
        self.default_value
    }

    pub fn set_default_value(&mut self, value: T) {
        self.default_value = value;
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[inline]
    pub fn current_value(&self) -> T {
        self.current_value
    }

    #[inline]
    pub fn current_velocity(&self) -> T {
        self.current_velocity
    }

    #[inline]
    pub fn is_baked(&self) -> bool {
        matches!(self.mode, SampleMode::Baked(_))
    }

    pub fn baked(&self) -> Option<&BakedSamples<T>> {
        match &self.mode {
            SampleMode::Baked(b) => Some(b),
            SampleMode::Keyframed => None,
        }
    }

    /// Insert a keyframe (see [`KeyframeTrack::insert`] for the policy) and
    /// drop any baked cache.
    pub fn insert(&mut self, key: Keyframe<T>) -> Option<usize> {
        self.invalidate();
        self.track.insert(key)
    }

    /// Remove the key at `index` and drop any baked cache.
    pub fn remove(&mut self, index: usize) -> Option<Keyframe<T>> {
        self.invalidate();
        self.track.remove(index)
    }

    /// Sample the curve at `time` through the active mode.
    pub fn value_at(&self, time: f32) -> T {
        match &self.mode {
            SampleMode::Baked(b) => {
                b.value_at(time, self.track.length_seconds(), self.track.looped(), self.default_value)
            }
            SampleMode::Keyframed => self.value_at_keyframed(time),
        }
    }

    /// Sample the continuous track, ignoring any baked cache. This is the
    /// path `bake` itself samples, so a bake never reads a stale bake.
    pub fn value_at_keyframed(&self, time: f32) -> T {
        self.eval_value(self.resolve(time, None))
    }

    /// Baked-path sample, or `None` while keyframed.
    pub fn value_at_baked(&self, time: f32) -> Option<T> {
        self.baked().map(|b| {
            b.value_at(time, self.track.length_seconds(), self.track.looped(), self.default_value)
        })
    }

    /// Direct frame lookup in the baked cache.
    pub fn baked_frame(&self, frame: usize) -> Option<T> {
        self.baked().and_then(|b| b.samples.get(frame).copied())
    }

    /// First derivative at `time` in value units per second. Evaluated from
    /// the continuous track (the baked cache stores values only); zero on an
    /// empty track and in clamped out-of-range regions.
    pub fn velocity_at(&self, time: f32) -> T {
        let r = self.resolve(time, None);
        self.eval_velocity(r)
    }

    /// Second derivative at `time` in value units per second squared.
    pub fn acceleration_at(&self, time: f32) -> T {
        match self.resolve(time, None) {
            Resolved::Empty | Resolved::Hold(_) => T::ZERO,
            Resolved::Segment { i, j, span, u } => {
                let keys = self.track.keys();
                eval::segment_acceleration(&keys[i], &keys[j], span, u)
            }
        }
    }

    /// Bake to a fixed-rate cache with nearest-frame lookup.
    pub fn bake(&mut self, fps: f32) {
        self.bake_with(fps, false);
    }

    /// Bake at `fps`, with `smooth` enabling the lerp-constrained lookup.
    ///
    /// Samples the keyframed path at `ceil(length * fps)` evenly spaced
    /// points. Idempotent; must be re-invoked after structural edits (which
    /// drop the cache automatically when made through this type).
    pub fn bake_with(&mut self, fps: f32, smooth: bool) {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            warn!("bake fps {fps} invalid, falling back to 60");
            60.0
        };
        let count = ((self.track.length_seconds() * fps).ceil() as usize).max(1);
        let samples: Vec<T> = (0..count)
            .map(|i| self.value_at_keyframed(i as f32 / fps))
            .collect();
        debug!("baked {count} samples at {fps} fps");
        self.mode = SampleMode::Baked(BakedSamples { fps, smooth, samples });
    }

    /// Drop the baked cache and return to keyframed evaluation.
    pub fn invalidate(&mut self) {
        if self.is_baked() {
            debug!("baked cache invalidated");
            self.mode = SampleMode::Keyframed;
        }
        self.hint = 0;
    }

    /// Advance playback by `dt` seconds and refresh the cached value and
    /// velocity. Looped curves wrap into `[0, length)`; non-looped curves
    /// clamp to the clip bounds.
    pub fn advance(&mut self, dt: f32) {
        self.seek(self.current_time + dt);
    }

    /// Jump playback to an absolute time and refresh the cached outputs.
    /// A non-finite target is rejected so playback holds its last state.
    pub fn seek(&mut self, time: f32) {
        if !time.is_finite() {
            warn!("rejected seek to invalid time {time}");
            return;
        }
        let length = self.track.length_seconds();
        self.current_time = if self.track.looped() {
            wrap_time(time, length)
        } else {
            time.clamp(0.0, length.max(0.0))
        };
        let r = self.resolve(self.current_time, Some(self.hint));
        if let Resolved::Segment { i, .. } = r {
            self.hint = i;
        }
        self.current_value = match &self.mode {
            SampleMode::Baked(b) => b.value_at(
                self.current_time,
                length,
                self.track.looped(),
                self.default_value,
            ),
            SampleMode::Keyframed => self.eval_value(r),
        };
        self.current_velocity = self.eval_velocity(r);
    }

    fn eval_value(&self, r: Resolved) -> T {
        match r {
            Resolved::Empty => self.default_value,
            Resolved::Hold(i) => self.track.keys()[i].out_value,
            Resolved::Segment { i, j, span, u } => {
                let keys = self.track.keys();
                eval::segment_value(&keys[i], &keys[j], span, u)
            }
        }
    }

    fn eval_velocity(&self, r: Resolved) -> T {
        match r {
            Resolved::Empty | Resolved::Hold(_) => T::ZERO,
            Resolved::Segment { i, j, span, u } => {
                let keys = self.track.keys();
                eval::segment_velocity(&keys[i], &keys[j], span, u)
            }
        }
    }

    /// Map a query time to a track position.
    ///
    /// Out-of-range queries on a non-looped track clamp to the boundary
    /// key (no extrapolation). On a looped track the query is wrapped, and
    /// a position before the first key lands inside the wrap segment from
    /// the last key.
    fn resolve(&self, time: f32, hint: Option<usize>) -> Resolved {
        let keys = self.track.keys();
        let n = keys.len();
        if n == 0 {
            return Resolved::Empty;
        }
        // non-finite queries hold the first key: a bad time must degrade to
        // a frozen value, not a panic or a bogus derivative
        if n == 1 || !time.is_finite() {
            return Resolved::Hold(0);
        }
        let length = self.track.length_seconds();
        let looped = self.track.looped();
        let t = if looped { wrap_time(time, length) } else { time };
        let first = keys[0].time;
        let last = keys[n - 1].time;
        if !looped {
            if t <= first {
                return Resolved::Hold(0);
            }
            if t >= last {
                return Resolved::Hold(n - 1);
            }
        } else if t < first {
            let span = self.track.next_span(n - 1);
            let u = if span.abs() < SPAN_EPSILON {
                0.0
            } else {
                ((t + length - last) / span).clamp(0.0, 1.0)
            };
            return Resolved::Segment { i: n - 1, j: 0, span, u };
        }
        let i = match hint {
            Some(h) => self.track.key_before_from(t, h),
            None => self.track.key_before(t),
        }
        .unwrap_or(0);
        let j = self.track.next_index(i);
        let span = self.track.next_span(i);
        let u = if span.abs() < SPAN_EPSILON {
            0.0
        } else {
            ((t - keys[i].time) / span).clamp(0.0, 1.0)
        };
        Resolved::Segment { i, j, span, u }
    }
}

/// An animation track for a discrete property (bool, string, opaque tag).
/// Evaluation always holds the most recent keyframe at or before the query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepCurve<T> {
    track: StepTrack<T>,
    default_value: T,
    current_time: f32,
    current_value: T,
    baked: Option<BakedSamples<T>>,
}

impl<T: Clone + PartialEq + std::fmt::Debug> StepCurve<T> {
    pub fn new(length_seconds: f32, looped: bool, default_value: T) -> Self {
        Self {
            track: StepTrack::new(length_seconds, looped),
            default_value: default_value.clone(),
            current_time: 0.0,
            current_value: default_value,
            baked: None,
        }
    }

    #[inline]
    pub fn track(&self) -> &StepTrack<T> {
        &self.track
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[inline]
    pub fn current_value(&self) -> &T {
        &self.current_value
    }

    #[inline]
    pub fn is_baked(&self) -> bool {
        self.baked.is_some()
    }

    pub fn insert(&mut self, key: StepKeyframe<T>) -> Option<usize> {
        self.invalidate();
        self.track.insert(key)
    }

    pub fn remove(&mut self, index: usize) -> Option<StepKeyframe<T>> {
        self.invalidate();
        self.track.remove(index)
    }

    pub fn value_at(&self, time: f32) -> T {
        match &self.baked {
            Some(b) => self.baked_lookup(b, time),
            None => self.value_at_keyframed(time),
        }
    }

    pub fn value_at_keyframed(&self, time: f32) -> T {
        let keys = self.track.keys();
        if keys.is_empty() {
            return self.default_value.clone();
        }
        let t = if self.track.looped() {
            wrap_time(time, self.track.length_seconds())
        } else {
            time
        };
        match self.track.key_before(t) {
            Some(i) => keys[i].value.clone(),
            None => self.default_value.clone(),
        }
    }

    pub fn bake(&mut self, fps: f32) {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            warn!("bake fps {fps} invalid, falling back to 60");
            60.0
        };
        let count = ((self.track.length_seconds() * fps).ceil() as usize).max(1);
        let samples: Vec<T> = (0..count)
            .map(|i| self.value_at_keyframed(i as f32 / fps))
            .collect();
        debug!("baked {count} step samples at {fps} fps");
        self.baked = Some(BakedSamples {
            fps,
            smooth: false,
            samples,
        });
    }

    pub fn invalidate(&mut self) {
        self.baked = None;
    }

    pub fn advance(&mut self, dt: f32) {
        self.seek(self.current_time + dt);
    }

    pub fn seek(&mut self, time: f32) {
        if !time.is_finite() {
            warn!("rejected seek to invalid time {time}");
            return;
        }
        let length = self.track.length_seconds();
        self.current_time = if self.track.looped() {
            wrap_time(time, length)
        } else {
            time.clamp(0.0, length.max(0.0))
        };
        self.current_value = self.value_at(self.current_time);
    }

    fn baked_lookup(&self, baked: &BakedSamples<T>, time: f32) -> T {
        let n = baked.samples.len();
        if n == 0 {
            return self.default_value.clone();
        }
        let length = self.track.length_seconds();
        let t = if self.track.looped() {
            wrap_time(time, length)
        } else {
            time.clamp(0.0, length.max(0.0))
        };
        let i = ((t * baked.fps).floor() as usize).min(n - 1);
        baked.samples[i].clone()
    }
}
