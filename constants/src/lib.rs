//! Shared defaults for the experiment engine.
//!
//! Camera and light presets, control-surface ranges and pendulum
//! integration constants live here so the engine and any tooling agree
//! on the same numbers.

pub mod controls;
pub mod path;
pub mod pendulum;
pub mod render_settings;
