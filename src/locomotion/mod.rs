//! Smooth character locomotion.
//!
//! Keyboard-driven controller with critically damped speed and heading
//! smoothing, camera-relative movement, gravity integration and a simple
//! ground-plane grounded check. No physics engine: grounding is the
//! `y <= 0` plane.

use bevy::prelude::*;

use crate::camera::FollowCamera;
use crate::smoothing::{smooth_damp, smooth_damp_angle};

pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (read_move_input, apply_locomotion).chain());
    }
}

/// Small constant downforce that keeps the controller pressed onto the
/// ground while grounded.
const GROUNDED_DOWNFORCE: f32 = -2.0;

/// Locomotion parameters and smoothing state
#[derive(Component, Debug)]
pub struct CharacterMotor {
    /// Base walk speed (m/s).
    pub move_speed: f32,
    /// Multiplier while sprinting.
    pub sprint_multiplier: f32,
    /// Time to reach target speed (smaller = snappier).
    pub acceleration_time: f32,
    pub rotation_smooth_time: f32,
    /// Degrees added to the target facing, for strafing/animation sync.
    pub rotation_offset: f32,
    /// Gravity (negative).
    pub gravity: f32,
    /// Jump height in meters.
    pub jump_height: f32,
    /// Move relative to the follow camera's yaw when one exists.
    pub orient_to_camera: bool,
    pub grounded: bool,
    // smoothing state
    current_speed: f32,
    speed_smooth_velocity: f32,
    rotation_velocity: f32,
    vertical_velocity: f32,
}

impl Default for CharacterMotor {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_multiplier: 1.8,
            acceleration_time: 0.08,
            rotation_smooth_time: 0.12,
            rotation_offset: 0.0,
            gravity: -30.0,
            jump_height: 1.6,
            orient_to_camera: true,
            grounded: true,
            current_speed: 0.0,
            speed_smooth_velocity: 0.0,
            rotation_velocity: 0.0,
            vertical_velocity: 0.0,
        }
    }
}

impl CharacterMotor {
    /// Horizontal speed after smoothing, for animation blending.
    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }
}

/// Input vector fed by the keyboard system (or an AI controller)
#[derive(Component, Debug, Default)]
pub struct MoveInput {
    /// Normalized XZ movement, X = strafe, Y = forward.
    pub direction: Vec2,
    pub sprint: bool,
    pub jump: bool,
}

/// Initial vertical velocity for a jump of `height` meters under `gravity`.
pub fn jump_impulse(gravity: f32, height: f32) -> f32 {
    (height * -2.0 * gravity).max(0.0).sqrt()
}

/// World-space move direction for an input vector, rotated by the camera
/// yaw (degrees) when camera-relative movement is on.
pub fn move_direction(input: Vec2, camera_yaw: Option<f32>) -> Vec3 {
    let local = Vec3::new(input.x, 0.0, input.y);
    let dir = match camera_yaw {
        Some(yaw) => Quat::from_rotation_y(yaw.to_radians()) * local,
        None => local,
    };
    if dir.length_squared() > 1.0 {
        dir.normalize()
    } else {
        dir
    }
}

fn read_move_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut MoveInput>,
) {
    let mut dir = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        dir.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        dir.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        dir.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        dir.x += 1.0;
    }
    if dir.length_squared() > 0.01 {
        dir = dir.normalize();
    }

    let sprint =
        keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);
    let jump = keyboard.just_pressed(KeyCode::Space);

    for mut input in &mut query {
        input.direction = dir;
        input.sprint = sprint;
        input.jump = jump;
    }
}

fn apply_locomotion(
    time: Res<Time>,
    cameras: Query<&FollowCamera>,
    mut query: Query<(&mut Transform, &mut CharacterMotor, &MoveInput)>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let camera_yaw = cameras.get_single().ok().map(|c| c.yaw());

    for (mut transform, mut motor, input) in &mut query {
        let sprint = if input.sprint {
            motor.sprint_multiplier
        } else {
            1.0
        };
        let target_speed = motor.move_speed * sprint * input.direction.length();

        let mut speed_velocity = motor.speed_smooth_velocity;
        motor.current_speed = smooth_damp(
            motor.current_speed,
            target_speed,
            &mut speed_velocity,
            motor.acceleration_time,
            dt,
        );
        motor.speed_smooth_velocity = speed_velocity;

        let yaw_source = if motor.orient_to_camera { camera_yaw } else { None };
        let dir = move_direction(input.direction, yaw_source);

        if input.direction.length_squared() > 0.001 {
            // face the movement direction
            let target_yaw =
                dir.x.atan2(dir.z).to_degrees() + motor.rotation_offset;
            let (current_yaw, ..) = transform.rotation.to_euler(EulerRot::YXZ);
            let mut rotation_velocity = motor.rotation_velocity;
            let smoothed = smooth_damp_angle(
                current_yaw.to_degrees(),
                target_yaw,
                &mut rotation_velocity,
                motor.rotation_smooth_time,
                dt,
            );
            motor.rotation_velocity = rotation_velocity;
            transform.rotation = Quat::from_rotation_y(smoothed.to_radians());
        }

        if motor.grounded {
            if motor.vertical_velocity < 0.0 {
                motor.vertical_velocity = GROUNDED_DOWNFORCE;
            }
            if input.jump {
                motor.vertical_velocity = jump_impulse(motor.gravity, motor.jump_height);
                motor.grounded = false;
            }
        }
        motor.vertical_velocity += motor.gravity * dt;

        let horizontal = dir * motor.current_speed;
        transform.translation += (horizontal + Vec3::Y * motor.vertical_velocity) * dt;

        // ground plane at y = 0
        if transform.translation.y <= 0.0 {
            transform.translation.y = 0.0;
            motor.grounded = true;
        } else {
            motor.grounded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_defaults() {
        let motor = CharacterMotor::default();
        assert!((motor.move_speed - 5.0).abs() < f32::EPSILON);
        assert!((motor.sprint_multiplier - 1.8).abs() < f32::EPSILON);
        assert!(motor.grounded);
        assert!(motor.gravity < 0.0);
    }

    #[test]
    fn test_jump_impulse_reaches_height() {
        let gravity = -30.0;
        let height = 1.6;
        let v0 = jump_impulse(gravity, height);
        // peak height of a ballistic arc: v0^2 / (2 * -g)
        let peak = v0 * v0 / (2.0 * -gravity);
        assert!((peak - height).abs() < 1e-4);
    }

    #[test]
    fn test_jump_impulse_degenerate_inputs() {
        assert_eq!(jump_impulse(-30.0, 0.0), 0.0);
        // positive "gravity" must not produce NaN
        assert_eq!(jump_impulse(30.0, 1.0), 0.0);
    }

    #[test]
    fn test_move_direction_without_camera() {
        let dir = move_direction(Vec2::new(0.0, 1.0), None);
        assert!(dir.distance(Vec3::new(0.0, 0.0, 1.0)) < 1e-5);
    }

    #[test]
    fn test_move_direction_camera_relative() {
        // 90 degree camera yaw rotates forward input onto +X
        let dir = move_direction(Vec2::new(0.0, 1.0), Some(90.0));
        assert!(dir.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_move_direction_never_exceeds_unit_length() {
        let dir = move_direction(Vec2::new(1.0, 1.0), None);
        assert!(dir.length() <= 1.0 + 1e-5);
    }
}
