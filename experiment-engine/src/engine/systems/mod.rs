//! Core runtime systems for frame ticking and diagnostics.

/// Render loop ticks for the attached frame consumer.
pub mod frame_tick;

/// FPS tracking, pendulum state and viewer status notifications.
///
/// Sends updates to the embedding page via RPC and updates native UI overlays.
pub mod telemetry;
