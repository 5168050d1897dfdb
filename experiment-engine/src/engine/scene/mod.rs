//! Scene host and the objects it owns.
//!
//! The host mounts onto a drawing surface, drives the per-frame render loop,
//! and releases every entity, mesh and material it registered on disposal.

/// Camera rig, light presets and the registry of scene objects.
pub mod context;

/// Ground grid line mesh used by the asset viewer stage.
pub mod grid;

/// Scene host resource: mount, render loop ticks, resize and disposal.
///
/// Frame consumers plug in through the `FrameUpdate` trait.
pub mod host;

/// Bevy systems wiring the host to the window, camera and light entities.
pub mod lifecycle;

/// Pivot, string and bob entities presenting the pendulum simulation.
pub mod pendulum_rig;
