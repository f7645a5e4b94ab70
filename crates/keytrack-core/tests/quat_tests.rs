use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_8};

use keytrack_core::{Curve, Interp, Interpolate, Keyframe, Quat};

fn quat_approx(a: Quat, b: Quat, eps: f32) {
    // quaternions are hemisphere-ambiguous: q and -q are the same rotation
    let d = a.dot(b).abs();
    assert!(d >= 1.0 - eps, "left={a:?} right={b:?} |dot|={d}");
}

fn y_rotation(half_angle: f32) -> Quat {
    Quat([0.0, half_angle.sin(), 0.0, half_angle.cos()])
}

/// it should slerp rotation keys instead of lerping components
#[test]
fn linear_rotation_is_slerp() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
    curve.insert(Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Linear));
    curve.insert(Keyframe::smooth(1.0, q90, Interp::Linear));

    quat_approx(curve.value_at(0.5), y_rotation(FRAC_PI_8), 1e-5);
    // constant angular rate: quarter time is half of 45 degrees
    quat_approx(curve.value_at(0.25), y_rotation(FRAC_PI_8 / 2.0), 1e-5);
}

/// it should take the shortest arc when a key sits on the far hemisphere
#[test]
fn slerp_shortest_arc() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    let negated = q90.scale(-1.0); // same rotation, opposite sign
    let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
    curve.insert(Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Linear));
    curve.insert(Keyframe::smooth(1.0, negated, Interp::Linear));

    // midpoint is still 45 degrees around Y, not a near-180 detour
    quat_approx(curve.value_at(0.5), y_rotation(FRAC_PI_8), 1e-5);
}

/// it should keep spherical cubic samples at unit length
#[test]
fn spherical_cubic_stays_unit() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
    let mut k0 = Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Bezier);
    k0.out_tangent = Quat([0.0, 0.2, 0.0, 0.0]);
    let mut k1 = Keyframe::smooth(1.0, q90, Interp::Bezier);
    k1.in_tangent = Quat([0.1, 0.0, 0.0, 0.0]);
    curve.insert(k0);
    curve.insert(k1);

    for i in 0..=40 {
        let t = i as f32 / 40.0;
        let q = curve.value_at(t);
        assert!(
            (q.magnitude() - 1.0).abs() < 1e-4,
            "non-unit sample at t={t}: {q:?}"
        );
    }
    // endpoints hit the keys exactly
    quat_approx(curve.value_at(0.0), Quat::IDENTITY, 1e-5);
    quat_approx(curve.value_at(1.0), q90, 1e-5);
}

/// it should produce finite angular velocity and near-zero on a constant track
#[test]
fn rotation_velocity_is_finite() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
    curve.insert(Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Bezier));
    curve.insert(Keyframe::smooth(1.0, q90, Interp::Bezier));
    let v = curve.velocity_at(0.5);
    assert!(v.is_finite());
    assert!(v.magnitude() > 0.1, "rotating curve reports no motion: {v:?}");

    let mut constant = Curve::new(1.0, false, Quat::IDENTITY);
    constant.insert(Keyframe::smooth(0.0, q90, Interp::Bezier));
    constant.insert(Keyframe::smooth(1.0, q90, Interp::Bezier));
    let v = constant.velocity_at(0.5);
    assert!(v.magnitude() < 1e-2, "constant curve moves: {v:?}");
}

/// it should report linear rotation velocity along the slerp arc, not the chord
#[test]
fn linear_rotation_velocity_follows_arc() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    // same rotation on both hemispheres: shortest-arc speed must agree
    for target in [q90, q90.scale(-1.0)] {
        let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
        curve.insert(Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Linear));
        curve.insert(Keyframe::smooth(1.0, target, Interp::Linear));

        let v = curve.velocity_at(0.5);
        assert!(v.is_finite());
        // a 45-degree quaternion arc over one second moves pi/4 per second
        let speed = v.magnitude();
        assert!(
            (speed - std::f32::consts::FRAC_PI_4).abs() < 0.02,
            "speed {speed} for target {target:?}"
        );
        // slerp moves along the great circle: tangent to the current sample
        let q = curve.value_at(0.5);
        assert!(v.dot(q).abs() < 1e-2, "velocity not tangent: {v:?} at {q:?}");
        assert!(curve.acceleration_at(0.5).is_finite());
    }
}

/// it should keep baked rotation samples unit length under smooth lookup
#[test]
fn baked_rotation_stays_unit() {
    let q90 = Quat([0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]);
    let mut curve = Curve::new(1.0, false, Quat::IDENTITY);
    curve.insert(Keyframe::smooth(0.0, Quat::IDENTITY, Interp::Linear));
    curve.insert(Keyframe::smooth(1.0, q90, Interp::Linear));
    curve.bake_with(12.0, true);

    for i in 0..=50 {
        let t = i as f32 / 50.0;
        let q = curve.value_at(t);
        assert!(
            (q.magnitude() - 1.0).abs() < 1e-4,
            "non-unit baked sample at t={t}: {q:?}"
        );
    }
}
