use keytrack_core::{Interp, Keyframe, KeyframeTrack, StepKeyframe, StepTrack};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn mk_track(length: f32, looped: bool, times: &[f32]) -> KeyframeTrack<f32> {
    let mut track = KeyframeTrack::new(length, looped);
    for &t in times {
        track.insert(Keyframe::smooth(t, t * 10.0, Interp::Linear));
    }
    track
}

/// it should keep times strictly increasing across arbitrary insert orders
#[test]
fn insert_maintains_sort_order() {
    let track = mk_track(1.0, false, &[0.5, 0.25, 0.75, 1.0, 0.1]);
    assert_eq!(track.len(), 5);
    let times: Vec<f32> = track.keys().iter().map(|k| k.time).collect();
    for pair in times.windows(2) {
        assert!(pair[0] < pair[1], "times not strictly increasing: {times:?}");
    }
    assert!(track.validate().is_ok());
}

/// it should overwrite on duplicate time (last write wins) instead of duplicating
#[test]
fn insert_duplicate_time_overwrites() {
    let mut track = mk_track(1.0, false, &[0.25, 0.5]);
    track.insert(Keyframe::smooth(0.25, 99.0, Interp::Step));
    assert_eq!(track.len(), 2);
    approx(track.keys()[0].out_value, 99.0, 0.0);
    assert_eq!(track.keys()[0].interp_out, Interp::Step);
    assert!(track.validate().is_ok());
}

/// it should auto-extend the track length when a key lands past the end
#[test]
fn insert_past_end_extends_length() {
    let mut track = mk_track(1.0, false, &[0.5]);
    track.insert(Keyframe::smooth(2.5, 0.0, Interp::Linear));
    approx(track.length_seconds(), 2.5, 0.0);
    assert!(track.validate().is_ok());
}

/// it should reject NaN and negative times as a no-op
#[test]
fn insert_invalid_time_rejected() {
    let mut track = mk_track(1.0, false, &[0.5]);
    assert!(track.insert(Keyframe::smooth(f32::NAN, 0.0, Interp::Linear)).is_none());
    assert!(track.insert(Keyframe::smooth(-1.0, 0.0, Interp::Linear)).is_none());
    assert_eq!(track.len(), 1);
}

/// it should compute the wrap span as length - last.time + first.time
#[test]
fn next_span_wrap_edge() {
    let track = mk_track(2.0, true, &[0.5, 1.5]);
    approx(track.next_span(0), 1.0, 1e-6);
    approx(track.next_span(1), 1.0, 1e-6);
}

/// it should report the full loop period as the span of a single key
#[test]
fn next_span_single_key() {
    let track = mk_track(2.0, true, &[0.5]);
    approx(track.next_span(0), 2.0, 1e-6);
}

/// it should resolve key_before per loop mode when the query precedes the first key
#[test]
fn key_before_boundaries() {
    let empty: KeyframeTrack<f32> = KeyframeTrack::new(1.0, false);
    assert_eq!(empty.key_before(0.5), None);

    let track = mk_track(1.0, false, &[0.25, 0.5, 0.75]);
    assert_eq!(track.key_before(0.1), None);
    assert_eq!(track.key_before(0.25), Some(0));
    assert_eq!(track.key_before(0.6), Some(1));
    assert_eq!(track.key_before(9.0), Some(2));

    let looped = mk_track(1.0, true, &[0.25, 0.5, 0.75]);
    assert_eq!(looped.key_before(0.1), Some(2));
}

/// it should answer None for non-finite query times instead of panicking
#[test]
fn key_before_non_finite_time() {
    let track = mk_track(1.0, false, &[0.25, 0.5, 0.75]);
    assert_eq!(track.key_before(f32::NAN), None);
    assert_eq!(track.key_before(f32::INFINITY), None);
    assert_eq!(track.key_before_from(f32::NAN, 1), None);

    let looped = mk_track(1.0, true, &[0.25, 0.5, 0.75]);
    assert_eq!(looped.key_before(f32::NAN), None);

    let mut step: StepTrack<bool> = StepTrack::new(1.0, true);
    step.insert(StepKeyframe::new(0.5, true));
    assert_eq!(step.key_before(f32::NAN), None);
}

/// it should resume key_before from a valid hint and fall back otherwise
#[test]
fn key_before_from_hint() {
    let track = mk_track(10.0, false, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(track.key_before_from(7.2, 3), Some(7));
    assert_eq!(track.key_before_from(7.2, 7), Some(7));
    // hint ahead of the query time falls back to the search
    assert_eq!(track.key_before_from(3.2, 5), Some(3));
    // out-of-range hint falls back
    assert_eq!(track.key_before_from(3.2, 99), Some(3));
}

/// it should relink the order on removal and no-op on out-of-range indices
#[test]
fn remove_relinks_and_is_fail_soft() {
    let mut track = mk_track(1.0, true, &[0.25, 0.5, 0.75]);
    assert!(track.remove(10).is_none());
    let removed = track.remove(0).expect("first key removed");
    approx(removed.time, 0.25, 0.0);
    assert_eq!(track.len(), 2);
    approx(track.keys()[0].time, 0.5, 0.0);
    // wrap edge rebuilt: last -> first spans 1.0 - 0.75 + 0.5
    approx(track.next_span(1), 0.75, 1e-6);
    assert!(track.validate().is_ok());
}

/// it should never shrink the length below the last key
#[test]
fn set_length_clamps_to_last_key() {
    let mut track = mk_track(2.0, false, &[0.5, 1.0]);
    track.set_length_seconds(0.2);
    approx(track.length_seconds(), 1.0, 0.0);
    track.set_length_seconds(5.0);
    approx(track.length_seconds(), 5.0, 0.0);
}

/// it should apply the same insert/lookup policies to discrete tracks
#[test]
fn step_track_insert_and_lookup() {
    let mut track: StepTrack<bool> = StepTrack::new(1.0, false);
    track.insert(StepKeyframe::new(0.5, true));
    track.insert(StepKeyframe::new(0.0, false));
    track.insert(StepKeyframe::new(0.5, false)); // overwrite
    assert_eq!(track.len(), 2);
    assert_eq!(track.key_before(0.75), Some(1));
    assert!(!track.keys()[1].value);

    let looped: StepTrack<bool> = {
        let mut t = StepTrack::new(1.0, true);
        t.insert(StepKeyframe::new(0.5, true));
        t
    };
    assert_eq!(looped.key_before(0.1), Some(0));
}
