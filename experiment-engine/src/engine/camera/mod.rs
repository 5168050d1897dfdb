//! Orbit camera controls for scene navigation.
//!
//! Mouse drag rotates around the camera target, the wheel dollies,
//! and released input decays with damping.

/// Orbit controls resource and mouse input system.
pub mod orbit_controls;
