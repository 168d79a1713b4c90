//! Critically damped interpolation helpers shared by the camera rig and
//! the character controller. Frame-rate independent: callers pass the
//! frame delta and keep the velocity state between frames.

use bevy::prelude::*;

/// Gradually move `current` toward `target` with a critically damped
/// spring. `velocity` is caller-owned state carried across frames;
/// `smooth_time` is roughly the time to cover most of the distance
/// (smaller = snappier). Never overshoots.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;

    // pade approximation of exp(-omega * dt)
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // clamp to the target when the spring would overshoot
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt.max(1e-6);
    }
    output
}

/// Vector form of [`smooth_damp`], damping each component with a shared
/// velocity vector.
pub fn smooth_damp_vec3(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    dt: f32,
) -> Vec3 {
    Vec3::new(
        smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt),
        smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt),
        smooth_damp(current.z, target.z, &mut velocity.z, smooth_time, dt),
    )
}

/// [`smooth_damp`] for angles in degrees, taking the shortest arc.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, smooth_time, dt)
}

/// Shortest signed difference between two angles in degrees, in (-180, 180].
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Frame-rate independent lerp/slerp factor for exponential decay toward a
/// target: `1 - exp(-dt / time_constant)`.
pub fn exp_decay_factor(time_constant: f32, dt: f32) -> f32 {
    1.0 - (-dt / time_constant.max(1e-4)).exp()
}
