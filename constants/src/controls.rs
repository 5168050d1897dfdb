//! Input domains accepted by the control surfaces.

/// Pendulum length slider range (metres).
pub const LENGTH_RANGE: (f32, f32) = (0.5, 3.0);

/// Gravity slider range (m/s²).
pub const GRAVITY_RANGE: (f32, f32) = (1.0, 20.0);

/// Initial angle slider range (radians).
pub const INITIAL_ANGLE_RANGE: (f32, f32) = (0.0, std::f32::consts::FRAC_PI_2);

pub const LENGTH_STEP: f32 = 0.1;
pub const GRAVITY_STEP: f32 = 0.5;
pub const ANGLE_STEP: f32 = 0.05;

/// Distance moved by one zoom-in/zoom-out button press (metres).
pub const ZOOM_STEP: f32 = 0.5;

/// Clamp a slider value into its range.
pub fn clamp_to_range(value: f32, range: (f32, f32)) -> f32 {
    value.clamp(range.0, range.1)
}
