use bevy::color::Color;
use bevy::math::Vec3;

pub const NEAR_CLIP: f32 = 0.1;
pub const FAR_CLIP: f32 = 1000.0;

/// Light grey stage background (#f0f0f0).
pub const BACKGROUND_COLOUR: Color = Color::srgb(0.941, 0.941, 0.941);

/// Camera preset for one kind of experiment view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPreset {
    pub fov_degrees: f32,
    pub position: Vec3,
    pub target: Vec3,
}

/// Light preset: white ambient plus one directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPreset {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
    pub shadows: bool,
}

pub const PENDULUM_CAMERA: CameraPreset = CameraPreset {
    fov_degrees: 75.0,
    position: Vec3::new(0.0, 0.0, 5.0),
    target: Vec3::ZERO,
};

pub const VIEWER_CAMERA: CameraPreset = CameraPreset {
    fov_degrees: 45.0,
    position: Vec3::new(0.0, 1.0, 5.0),
    target: Vec3::ZERO,
};

pub const PENDULUM_LIGHTS: LightPreset = LightPreset {
    ambient_intensity: 0.5,
    directional_intensity: 0.8,
    directional_position: Vec3::new(0.0, 10.0, 10.0),
    shadows: false,
};

pub const VIEWER_LIGHTS: LightPreset = LightPreset {
    ambient_intensity: 0.5,
    directional_intensity: 1.0,
    directional_position: Vec3::new(1.0, 10.0, 5.0),
    shadows: true,
};

/// Scale from unit light intensity to Bevy units.
pub const AMBIENT_BRIGHTNESS_SCALE: f32 = 500.0;
pub const DIRECTIONAL_ILLUMINANCE_SCALE: f32 = 10_000.0;

/// Orbit control damping, as a fraction of angular velocity removed per frame.
pub const ORBIT_DAMPING: f32 = 0.1;
pub const ORBIT_MIN_DISTANCE: f32 = 0.5;
pub const ORBIT_MAX_DISTANCE: f32 = 100.0;

/// Grid helper shown under loaded models.
pub const GRID_SIZE: f32 = 10.0;
pub const GRID_DIVISIONS: u32 = 10;
