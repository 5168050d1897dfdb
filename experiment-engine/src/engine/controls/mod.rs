//! User control commands shared by the RPC bridge and keyboard shortcuts.
//!
//! Both surfaces emit [`ControlCommandEvent`]; a single system applies them
//! to the simulation, viewer and scene host before the frame is ticked.

/// System applying queued control commands.
pub mod apply;

/// Native keyboard shortcuts mapped onto control commands.
pub mod keyboard;

use bevy::prelude::*;
use constants::controls::{GRAVITY_RANGE, INITIAL_ANGLE_RANGE, LENGTH_RANGE, clamp_to_range};
use serde::Deserialize;

use crate::engine::simulation::pendulum::{ParameterChange, PendulumSimulation};
use crate::engine::viewer::asset_viewer::AssetFormat;
use crate::error::Result;

/// Partial update of the pendulum's slider-controlled parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ParameterUpdate {
    pub length: Option<f32>,
    pub gravity: Option<f32>,
    pub initial_angle: Option<f32>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.gravity.is_none() && self.initial_angle.is_none()
    }

    /// Clamp every present value into its slider range. Non-finite values
    /// are left for the engine to reject.
    pub fn clamped(self) -> Self {
        Self {
            length: self.length.map(|v| clamp_to_range(v, LENGTH_RANGE)),
            gravity: self.gravity.map(|v| clamp_to_range(v, GRAVITY_RANGE)),
            initial_angle: self
                .initial_angle
                .map(|v| clamp_to_range(v, INITIAL_ANGLE_RANGE)),
        }
    }

    /// Write each present value, length first. Returns the outcome per
    /// parameter in write order.
    pub fn apply_to(
        &self,
        simulation: &mut PendulumSimulation,
    ) -> Vec<(&'static str, Result<ParameterChange>)> {
        let mut outcomes = Vec::new();
        if let Some(length) = self.length {
            outcomes.push(("length", simulation.set_length(length)));
        }
        if let Some(gravity) = self.gravity {
            outcomes.push(("gravity", simulation.set_gravity(gravity)));
        }
        if let Some(initial_angle) = self.initial_angle {
            outcomes.push(("initial_angle", simulation.set_initial_angle(initial_angle)));
        }
        outcomes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    StartSimulation,
    PauseSimulation,
    ResumeSimulation,
    ToggleSimulation,
    ResetSimulation,
    SetParameters(ParameterUpdate),
    LoadModel { url: String, format: AssetFormat },
    ToggleAnimation,
    ResetView,
    Zoom(f32),
    ToggleFullscreen,
    Unmount,
}

/// Where a command came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Rpc,
    Keyboard,
}

#[derive(Event, Debug, Clone)]
pub struct ControlCommandEvent {
    pub command: ControlCommand,
    pub source: CommandSource,
}
