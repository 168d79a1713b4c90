//! Smooth camera follow rig.
//!
//! Trails a target with critically damped position smoothing and an
//! exponential rotation ease toward the look-at point. Optional mouse
//! orbit with pitch clamping. Runs in `PostUpdate` so it sees the
//! target's final transform for the frame.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use crate::smoothing::{exp_decay_factor, smooth_damp_vec3};

pub struct CameraFollowPlugin;

impl Plugin for CameraFollowPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, follow_target);
    }
}

/// Mouse orbit settings for [`FollowCamera`]
#[derive(Debug, Clone)]
pub struct OrbitSettings {
    pub enabled: bool,
    pub sensitivity: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: 150.0,
            min_pitch: -35.0,
            max_pitch: 60.0,
        }
    }
}

/// Camera that smoothly follows a target entity
#[derive(Component, Debug)]
pub struct FollowCamera {
    pub target: Option<Entity>,
    /// Offset from the target in orbit-local space.
    pub offset: Vec3,
    /// Time for the camera position to catch up (smaller = snappier).
    pub follow_smooth_time: f32,
    pub rotation_smooth_time: f32,
    /// World-space bias added to the look-at point.
    pub look_at_offset: Vec3,
    pub orbit: OrbitSettings,
    // smoothing state
    velocity: Vec3,
    yaw: f32,
    pitch: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            target: None,
            offset: Vec3::new(0.0, 1.8, -3.5),
            follow_smooth_time: 0.12,
            rotation_smooth_time: 0.12,
            look_at_offset: Vec3::ZERO,
            orbit: OrbitSettings::default(),
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl FollowCamera {
    pub fn targeting(target: Entity) -> Self {
        Self {
            target: Some(target),
            ..default()
        }
    }

    /// Current orbit yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current orbit pitch in degrees, clamped into the orbit limits.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

/// Advance orbit angles from accumulated mouse motion. Pitch is clamped.
fn advance_orbit(camera: &mut FollowCamera, mouse_delta: Vec2, dt: f32) {
    camera.yaw += mouse_delta.x * camera.orbit.sensitivity * dt;
    camera.pitch -= mouse_delta.y * camera.orbit.sensitivity * dt;
    camera.pitch = camera
        .pitch
        .clamp(camera.orbit.min_pitch, camera.orbit.max_pitch);
}

/// Desired camera position: target plus orbit-rotated offset.
fn desired_position(camera: &FollowCamera, target_pos: Vec3) -> Vec3 {
    let look_rotation =
        Quat::from_euler(EulerRot::YXZ, camera.yaw.to_radians(), camera.pitch.to_radians(), 0.0);
    target_pos + look_rotation * camera.offset
}

fn follow_target(
    time: Res<Time>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut cameras: Query<(&mut Transform, &mut FollowCamera)>,
    targets: Query<&GlobalTransform, Without<FollowCamera>>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    for (mut transform, mut camera) in &mut cameras {
        let Some(target_pos) = camera
            .target
            .and_then(|target| targets.get(target).ok())
            .map(|t| t.translation())
        else {
            continue;
        };

        if camera.orbit.enabled {
            advance_orbit(&mut camera, mouse_delta, dt);
        }

        let desired = desired_position(&camera, target_pos);
        let mut velocity = camera.velocity;
        transform.translation = smooth_damp_vec3(
            transform.translation,
            desired,
            &mut velocity,
            camera.follow_smooth_time,
            dt,
        );
        camera.velocity = velocity;

        // ease toward looking slightly above the target's base
        let look_at = target_pos + Vec3::Y * 1.5 + camera.look_at_offset;
        let to_target = look_at - transform.translation;
        if to_target.length_squared() > 1e-6 {
            let desired_look = Transform::from_translation(transform.translation)
                .looking_at(look_at, Vec3::Y)
                .rotation;
            let factor = exp_decay_factor(camera.rotation_smooth_time, dt);
            transform.rotation = transform.rotation.slerp(desired_look, factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_position_default_orbit() {
        let camera = FollowCamera::default();
        let target = Vec3::new(10.0, 0.0, 10.0);
        // yaw = pitch = 0: offset applied as-is
        let desired = desired_position(&camera, target);
        assert!(desired.distance(target + camera.offset) < 1e-5);
    }

    #[test]
    fn test_desired_position_yawed() {
        let mut camera = FollowCamera::default();
        camera.offset = Vec3::new(0.0, 0.0, -4.0);
        camera.yaw = 90.0;
        let desired = desired_position(&camera, Vec3::ZERO);
        // 90 degree yaw swings the offset onto the -X axis
        assert!(desired.distance(Vec3::new(-4.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_orbit_pitch_clamped() {
        let mut camera = FollowCamera::default();
        advance_orbit(&mut camera, Vec2::new(0.0, -10_000.0), 1.0 / 60.0);
        assert!(camera.pitch() <= camera.orbit.max_pitch);

        advance_orbit(&mut camera, Vec2::new(0.0, 10_000.0), 1.0 / 60.0);
        assert!(camera.pitch() >= camera.orbit.min_pitch);
    }

    #[test]
    fn test_orbit_yaw_accumulates() {
        let mut camera = FollowCamera::default();
        let before = camera.yaw();
        advance_orbit(&mut camera, Vec2::new(10.0, 0.0), 1.0 / 60.0);
        assert!(camera.yaw() > before);
    }
}
