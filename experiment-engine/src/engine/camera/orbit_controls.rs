use std::f32::consts::PI;

use bevy::input::mouse::MouseScrollUnit;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};
use constants::render_settings::{ORBIT_DAMPING, ORBIT_MAX_DISTANCE, ORBIT_MIN_DISTANCE};

use crate::engine::scene::context::CameraRig;

/// Keeps the camera off the poles so `looking_at` keeps a stable up axis.
const POLE_MARGIN: f32 = 0.01;
const SETTLED_VELOCITY: f32 = 1e-5;

/// Damped orbit around the camera target. Input adds angular velocity; each
/// frame applies it and bleeds off `damping_factor` of what remains.
#[derive(Resource, Debug, Clone)]
pub struct OrbitControls {
    pub enabled: bool,
    pub damping_factor: f32,
    /// Radians per pixel of pointer travel.
    pub rotate_speed: f32,
    /// Metres per wheel line.
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    pending_dolly: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enabled: true,
            damping_factor: ORBIT_DAMPING,
            rotate_speed: 0.005,
            zoom_speed: 0.5,
            min_distance: ORBIT_MIN_DISTANCE,
            max_distance: ORBIT_MAX_DISTANCE,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            pending_dolly: 0.0,
        }
    }
}

impl OrbitControls {
    /// Queue a drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        if !self.enabled {
            return;
        }
        self.yaw_velocity -= delta.x * self.rotate_speed;
        self.pitch_velocity -= delta.y * self.rotate_speed;
    }

    /// Queue a distance change; negative moves towards the target.
    pub fn dolly(&mut self, amount: f32) {
        if self.enabled {
            self.pending_dolly += amount;
        }
    }

    pub fn stop(&mut self) {
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.pending_dolly = 0.0;
    }

    pub fn yaw_velocity(&self) -> f32 {
        self.yaw_velocity
    }

    pub fn is_settled(&self) -> bool {
        self.yaw_velocity == 0.0 && self.pitch_velocity == 0.0 && self.pending_dolly == 0.0
    }

    /// Apply one frame of motion to `rig`. Returns false when nothing moved.
    pub fn update(&mut self, rig: &mut CameraRig) -> bool {
        if self.is_settled() {
            return false;
        }
        let offset = rig.position - rig.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            self.stop();
            return false;
        }

        let azimuth = offset.x.atan2(offset.z) + self.yaw_velocity;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.pitch_velocity)
            .clamp(POLE_MARGIN, PI - POLE_MARGIN);
        let radius = (radius + self.pending_dolly).clamp(self.min_distance, self.max_distance);

        rig.position = rig.target
            + Vec3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );

        let retain = 1.0 - self.damping_factor;
        self.yaw_velocity *= retain;
        self.pitch_velocity *= retain;
        self.pending_dolly = 0.0;
        if self.yaw_velocity.abs() < SETTLED_VELOCITY {
            self.yaw_velocity = 0.0;
        }
        if self.pitch_velocity.abs() < SETTLED_VELOCITY {
            self.pitch_velocity = 0.0;
        }
        true
    }
}

/// Left drag orbits, wheel dollies.
pub fn orbit_input_system(
    mut controls: ResMut<OrbitControls>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
        controls.rotate(mouse_delta);
    }

    // Mouse wheel scroll accumulation (pixel and line scroll)
    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        let amount = -scroll_accum * controls.zoom_speed;
        controls.dolly(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use constants::render_settings::VIEWER_CAMERA;

    fn rig() -> CameraRig {
        CameraRig::new(&VIEWER_CAMERA, 1.5)
    }

    #[test]
    fn test_settled_controls_leave_camera_alone() {
        let mut controls = OrbitControls::default();
        let mut camera = rig();
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, VIEWER_CAMERA.position);
    }

    #[test]
    fn test_rotation_keeps_distance_and_decays() {
        let mut controls = OrbitControls::default();
        let mut camera = rig();
        let distance = camera.distance_to_target();
        controls.rotate(Vec2::new(100.0, 0.0));
        let initial = controls.yaw_velocity();

        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.distance_to_target(), distance, epsilon = 1e-4);
        assert_ne!(camera.position, VIEWER_CAMERA.position);
        assert_relative_eq!(controls.yaw_velocity(), initial * (1.0 - ORBIT_DAMPING));

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(controls.is_settled());
    }

    #[test]
    fn test_pitch_stops_short_of_pole() {
        let mut controls = OrbitControls::default();
        let mut camera = rig();
        controls.rotate(Vec2::new(0.0, 10_000.0));
        controls.update(&mut camera);
        let offset = camera.position - camera.target;
        assert!(offset.x.abs() + offset.z.abs() > 0.0);
    }

    #[test]
    fn test_dolly_respects_limits() {
        let mut controls = OrbitControls::default();
        let mut camera = rig();
        controls.dolly(-50.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.distance_to_target(), ORBIT_MIN_DISTANCE, epsilon = 1e-4);
        assert!(controls.is_settled());
    }

    #[test]
    fn test_disabled_controls_ignore_input() {
        let mut controls = OrbitControls {
            enabled: false,
            ..default()
        };
        controls.rotate(Vec2::splat(40.0));
        controls.dolly(2.0);
        assert!(controls.is_settled());
    }
}
