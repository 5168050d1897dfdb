use bevy::math::Vec3;

/// Multiplicative angular-velocity decay applied once per integration step.
/// Not a physical drag coefficient: the decay per second depends on frame rate.
pub const DAMPING_FACTOR: f32 = 0.995;

/// Longest frame gap fed to the integrator, in seconds.
pub const MAX_STEP_SECONDS: f32 = 0.1;

pub const DEFAULT_LENGTH: f32 = 2.0;
pub const DEFAULT_GRAVITY: f32 = 9.8;
pub const DEFAULT_INITIAL_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Fixed suspension point of the rig in world space.
pub const PIVOT_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);

pub const PIVOT_RADIUS: f32 = 0.1;
pub const BOB_RADIUS: f32 = 0.3;
pub const STRING_RADIUS: f32 = 0.01;
