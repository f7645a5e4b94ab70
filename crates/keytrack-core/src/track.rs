//! Sorted keyframe storage for one animated property.
//!
//! The source-of-truth layout is an arena: keys live in a `Vec` kept sorted
//! by time, and the circular prev/next linkage becomes wrap-around indices
//! (`(i + 1) % len`). The last key's successor is the first, which encodes
//! loop wrap-around without special cases at every query site.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::keyframe::{Keyframe, StepKeyframe};
use crate::value::Interpolate;

/// An ordered collection of continuous keyframes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyframeTrack<T: Interpolate> {
    length_seconds: f32,
    looped: bool,
    keys: Vec<Keyframe<T>>,
}

impl<T: Interpolate> KeyframeTrack<T> {
    pub fn new(length_seconds: f32, looped: bool) -> Self {
        Self {
            length_seconds: length_seconds.max(0.0),
            looped,
            keys: Vec::new(),
        }
    }

    #[inline]
    pub fn length_seconds(&self) -> f32 {
        self.length_seconds
    }

    #[inline]
    pub fn looped(&self) -> bool {
        self.looped
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    /// Extend (never shrink below the last key) the clip length.
    pub fn set_length_seconds(&mut self, length: f32) {
        let floor = self.keys.last().map(|k| k.time).unwrap_or(0.0);
        self.length_seconds = length.max(floor).max(0.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    #[inline]
    pub fn key(&self, index: usize) -> Option<&Keyframe<T>> {
        self.keys.get(index)
    }

    /// Mutable access to a key's values/tangents/modes.
    ///
    /// Times must not be edited through this accessor; move a key with
    /// remove + insert so the sort order is maintained.
    #[inline]
    pub fn key_mut(&mut self, index: usize) -> Option<&mut Keyframe<T>> {
        self.keys.get_mut(index)
    }

    /// Sorted insert by time. A key at an identical time overwrites the
    /// existing one (last write wins) so ordering stays strict. A key past
    /// the current length extends the length. Non-finite or negative times
    /// are rejected as a no-op.
    ///
    /// Returns the index of the inserted (or overwritten) key.
    pub fn insert(&mut self, key: Keyframe<T>) -> Option<usize> {
        if !key.time.is_finite() || key.time < 0.0 {
            warn!("rejected keyframe with invalid time {}", key.time);
            return None;
        }
        if key.time > self.length_seconds {
            self.length_seconds = key.time;
        }
        let idx = self.keys.partition_point(|k| k.time < key.time);
        if idx < self.keys.len() && self.keys[idx].time == key.time {
            self.keys[idx] = key;
        } else {
            self.keys.insert(idx, key);
        }
        Some(idx)
    }

    /// Remove the key at `index`. Out-of-range removal is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Keyframe<T>> {
        if index < self.keys.len() {
            Some(self.keys.remove(index))
        } else {
            None
        }
    }

    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.keys.len()
    }

    #[inline]
    pub fn prev_index(&self, index: usize) -> usize {
        (index + self.keys.len() - 1) % self.keys.len()
    }

    /// Time gap from a key to its successor, wrap-aware: across the wrap
    /// edge the span is `length - key.time + first.time`.
    pub fn next_span(&self, index: usize) -> f32 {
        let n = self.keys.len();
        if index >= n {
            return 0.0;
        }
        let j = (index + 1) % n;
        if j > index {
            self.keys[j].time - self.keys[index].time
        } else {
            self.length_seconds - self.keys[index].time + self.keys[j].time
        }
    }

    /// Index of the last key whose time is `<= time`.
    ///
    /// `None` when the track is empty, when the query time is not finite, or
    /// when the query precedes the first key on a non-looped track. On a
    /// looped track a pre-first query resolves to the last key (the wrap
    /// segment is in flight).
    pub fn key_before(&self, time: f32) -> Option<usize> {
        if self.keys.is_empty() || !time.is_finite() {
            return None;
        }
        if time < self.keys[0].time {
            return if self.looped {
                Some(self.keys.len() - 1)
            } else {
                None
            };
        }
        let idx = self.keys.partition_point(|k| k.time <= time);
        Some(idx - 1)
    }

    /// `key_before` that resumes from a previous result. Amortized O(1) for
    /// monotonically increasing query times; falls back to the binary search
    /// when the hint does not apply (time moved backwards, track edited).
    pub fn key_before_from(&self, time: f32, hint: usize) -> Option<usize> {
        let n = self.keys.len();
        if n == 0 || !time.is_finite() {
            return None;
        }
        if hint >= n || self.keys[hint].time > time {
            return self.key_before(time);
        }
        let mut i = hint;
        while i + 1 < n && self.keys[i + 1].time <= time {
            i += 1;
        }
        Some(i)
    }

    /// Check structural invariants: strictly increasing finite times and a
    /// length that covers the last key.
    pub fn validate(&self) -> Result<(), String> {
        let mut last = -f32::INFINITY;
        for k in &self.keys {
            if !k.time.is_finite() {
                return Err(format!("keyframe time must be finite, got {}", k.time));
            }
            if k.time <= last {
                return Err(format!(
                    "keyframe times must be strictly increasing ({last} then {})",
                    k.time
                ));
            }
            last = k.time;
        }
        if let Some(k) = self.keys.last() {
            if self.length_seconds < k.time {
                return Err(format!(
                    "track length {} shorter than last key {}",
                    self.length_seconds, k.time
                ));
            }
        }
        Ok(())
    }
}

/// An ordered collection of discrete (hold-only) keyframes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepTrack<T> {
    length_seconds: f32,
    looped: bool,
    keys: Vec<StepKeyframe<T>>,
}

impl<T: Clone + PartialEq + std::fmt::Debug> StepTrack<T> {
    pub fn new(length_seconds: f32, looped: bool) -> Self {
        Self {
            length_seconds: length_seconds.max(0.0),
            looped,
            keys: Vec::new(),
        }
    }

    #[inline]
    pub fn length_seconds(&self) -> f32 {
        self.length_seconds
    }

    #[inline]
    pub fn looped(&self) -> bool {
        self.looped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> &[StepKeyframe<T>] {
        &self.keys
    }

    /// Same policy as [`KeyframeTrack::insert`]: sorted, last write wins,
    /// auto-extends the length, rejects invalid times.
    pub fn insert(&mut self, key: StepKeyframe<T>) -> Option<usize> {
        if !key.time.is_finite() || key.time < 0.0 {
            warn!("rejected step keyframe with invalid time {}", key.time);
            return None;
        }
        if key.time > self.length_seconds {
            self.length_seconds = key.time;
        }
        let idx = self.keys.partition_point(|k| k.time < key.time);
        if idx < self.keys.len() && self.keys[idx].time == key.time {
            self.keys[idx] = key;
        } else {
            self.keys.insert(idx, key);
        }
        Some(idx)
    }

    pub fn remove(&mut self, index: usize) -> Option<StepKeyframe<T>> {
        if index < self.keys.len() {
            Some(self.keys.remove(index))
        } else {
            None
        }
    }

    /// See [`KeyframeTrack::key_before`].
    pub fn key_before(&self, time: f32) -> Option<usize> {
        if self.keys.is_empty() || !time.is_finite() {
            return None;
        }
        if time < self.keys[0].time {
            return if self.looped {
                Some(self.keys.len() - 1)
            } else {
                None
            };
        }
        let idx = self.keys.partition_point(|k| k.time <= time);
        Some(idx - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Interp;

    #[test]
    fn insert_keeps_strict_order() {
        let mut track = KeyframeTrack::new(1.0, false);
        for t in [0.5f32, 0.25, 0.75, 0.25, 1.0] {
            track.insert(Keyframe::smooth(t, t * 10.0, Interp::Linear));
        }
        assert_eq!(track.len(), 4);
        assert!(track.validate().is_ok());
    }
}
