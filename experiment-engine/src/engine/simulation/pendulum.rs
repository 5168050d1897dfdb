use std::f32::consts::TAU;

use bevy::prelude::*;
use constants::pendulum::{
    DAMPING_FACTOR, DEFAULT_GRAVITY, DEFAULT_INITIAL_ANGLE, DEFAULT_LENGTH, MAX_STEP_SECONDS,
    PIVOT_POSITION,
};
use serde::{Deserialize, Serialize};

use crate::engine::scene::context::SceneContext;
use crate::engine::scene::host::FrameUpdate;
use crate::error::{EngineError, Result};

/// Playback phase of the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationPhase {
    /// Not started since the last reset; `angle == initial_angle`.
    #[default]
    Idle,
    Running,
    Paused,
}

/// How angular velocity decays between steps.
///
/// `PerStep` multiplies the velocity by a fixed factor on every integration
/// call regardless of `dt`, so the effective decay per second scales with the
/// frame rate. It is a visual simplification, not a physical drag term.
/// `PerSecond` retains the given fraction of velocity per simulated second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DampingModel {
    PerStep(f32),
    PerSecond(f32),
}

impl DampingModel {
    fn retention(&self, dt: f32) -> f32 {
        match *self {
            Self::PerStep(factor) => factor,
            Self::PerSecond(retention) => retention.powf(dt),
        }
    }
}

impl Default for DampingModel {
    fn default() -> Self {
        Self::PerStep(DAMPING_FACTOR)
    }
}

/// Physical parameters of the pendulum. Only editable while not running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumParams {
    /// String length in metres.
    pub length: f32,
    /// Gravitational acceleration in m/s².
    pub gravity: f32,
    /// Release angle from vertical in radians; also the reset value.
    pub initial_angle: f32,
}

impl PendulumParams {
    pub fn new(length: f32, gravity: f32, initial_angle: f32) -> Result<Self> {
        Ok(Self {
            length: validate_length(length)?,
            gravity: validate_gravity(gravity)?,
            initial_angle: validate_angle(initial_angle)?,
        })
    }

    /// Period of the linearised oscillator, `2π√(L/g)`.
    pub fn small_angle_period(&self) -> f32 {
        TAU * (self.length / self.gravity).sqrt()
    }
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            gravity: DEFAULT_GRAVITY,
            initial_angle: DEFAULT_INITIAL_ANGLE,
        }
    }
}

fn validate_length(value: f32) -> Result<f32> {
    validate_positive("length", value)
}

fn validate_gravity(value: f32) -> Result<f32> {
    validate_positive("gravity", value)
}

fn validate_positive(name: &'static str, value: f32) -> Result<f32> {
    if !value.is_finite() {
        return Err(EngineError::InvalidParameter {
            name,
            value,
            reason: "must be finite",
        });
    }
    if value <= 0.0 {
        return Err(EngineError::InvalidParameter {
            name,
            value,
            reason: "must be greater than zero",
        });
    }
    Ok(value)
}

fn validate_angle(value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InvalidParameter {
            name: "initial_angle",
            value,
            reason: "must be finite",
        })
    }
}

/// Result of a parameter write that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterChange {
    Applied,
    /// Writes while running are dropped, never queued.
    IgnoredWhileRunning,
}

/// Bob position relative to the pivot for a given string length and angle.
pub fn bob_offset(length: f32, angle: f32) -> Vec2 {
    Vec2::new(length * angle.sin(), -length * angle.cos())
}

/// World-space geometry of the rig, derived from the angle alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumPose {
    pub pivot: Vec3,
    pub bob: Vec3,
}

impl PendulumPose {
    pub fn new(pivot: Vec3, length: f32, angle: f32) -> Self {
        let offset = bob_offset(length, angle);
        Self {
            pivot,
            bob: pivot + offset.extend(0.0),
        }
    }

    pub fn string_midpoint(&self) -> Vec3 {
        (self.pivot + self.bob) * 0.5
    }

    pub fn string_length(&self) -> f32 {
        self.pivot.distance(self.bob)
    }
}

/// Serializable read-out pushed to the embedding page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendulumSnapshot {
    pub phase: SimulationPhase,
    pub angle: f32,
    pub angular_velocity: f32,
    pub length: f32,
    pub gravity: f32,
    pub initial_angle: f32,
    pub period: f32,
    pub energy: f32,
}

/// Simple planar pendulum integrated with semi-implicit Euler.
#[derive(Resource, Debug, Clone)]
pub struct PendulumSimulation {
    params: PendulumParams,
    angle: f32,
    angular_velocity: f32,
    phase: SimulationPhase,
    damping: DampingModel,
    pivot: Vec3,
}

impl PendulumSimulation {
    pub fn new(params: PendulumParams) -> Result<Self> {
        let params = PendulumParams::new(params.length, params.gravity, params.initial_angle)?;
        Ok(Self {
            params,
            angle: params.initial_angle,
            angular_velocity: 0.0,
            phase: SimulationPhase::Idle,
            damping: DampingModel::default(),
            pivot: PIVOT_POSITION,
        })
    }

    pub fn with_damping(mut self, damping: DampingModel) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn params(&self) -> PendulumParams {
        self.params
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimulationPhase::Running
    }

    pub fn damping(&self) -> DampingModel {
        self.damping
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// `Idle → Running`. Returns whether the phase changed.
    pub fn start(&mut self) -> bool {
        self.transition(SimulationPhase::Idle, SimulationPhase::Running)
    }

    /// `Running → Paused`.
    pub fn pause(&mut self) -> bool {
        self.transition(SimulationPhase::Running, SimulationPhase::Paused)
    }

    /// `Paused → Running`.
    pub fn resume(&mut self) -> bool {
        self.transition(SimulationPhase::Paused, SimulationPhase::Running)
    }

    /// Start/pause button semantics: pause when running, run otherwise.
    pub fn toggle(&mut self) -> SimulationPhase {
        match self.phase {
            SimulationPhase::Running => self.pause(),
            SimulationPhase::Idle => self.start(),
            SimulationPhase::Paused => self.resume(),
        };
        self.phase
    }

    fn transition(&mut self, from: SimulationPhase, to: SimulationPhase) -> bool {
        if self.phase != from {
            return false;
        }
        debug!("Pendulum {:?} -> {:?}", from, to);
        self.phase = to;
        true
    }

    /// Back to the release position at rest. Available from any phase.
    pub fn reset(&mut self) {
        self.angle = self.params.initial_angle;
        self.angular_velocity = 0.0;
        self.phase = SimulationPhase::Idle;
    }

    pub fn set_length(&mut self, length: f32) -> Result<ParameterChange> {
        let length = validate_length(length)?;
        Ok(self.write_param(|params| params.length = length))
    }

    pub fn set_gravity(&mut self, gravity: f32) -> Result<ParameterChange> {
        let gravity = validate_gravity(gravity)?;
        Ok(self.write_param(|params| params.gravity = gravity))
    }

    /// While idle the bob follows the new release angle; while paused only
    /// the reset value changes.
    pub fn set_initial_angle(&mut self, initial_angle: f32) -> Result<ParameterChange> {
        let initial_angle = validate_angle(initial_angle)?;
        let change = self.write_param(|params| params.initial_angle = initial_angle);
        if change == ParameterChange::Applied && self.phase == SimulationPhase::Idle {
            self.angle = initial_angle;
        }
        Ok(change)
    }

    fn write_param(&mut self, write: impl FnOnce(&mut PendulumParams)) -> ParameterChange {
        if self.is_running() {
            return ParameterChange::IgnoredWhileRunning;
        }
        write(&mut self.params);
        ParameterChange::Applied
    }

    /// Advance by `dt` seconds. Returns `Ok(false)` when nothing was
    /// integrated (not running, or no time elapsed).
    pub fn step(&mut self, dt: f32) -> Result<bool> {
        if !self.is_running() || !(dt > 0.0) {
            return Ok(false);
        }
        let dt = dt.min(MAX_STEP_SECONDS);

        let angular_acceleration = -(self.params.gravity / self.params.length) * self.angle.sin();
        let mut angular_velocity = self.angular_velocity + angular_acceleration * dt;
        let angle = self.angle + angular_velocity * dt;
        angular_velocity *= self.damping.retention(dt);

        if !angle.is_finite() || !angular_velocity.is_finite() {
            return Err(EngineError::StateDiverged {
                angle,
                angular_velocity,
            });
        }

        self.angle = angle;
        self.angular_velocity = angular_velocity;
        Ok(true)
    }

    pub fn pose(&self) -> PendulumPose {
        PendulumPose::new(self.pivot, self.params.length, self.angle)
    }

    /// Kinetic plus potential energy per kilogram of bob, zero at rest at the bottom.
    pub fn energy_per_unit_mass(&self) -> f32 {
        let length = self.params.length;
        let kinetic = 0.5 * length * length * self.angular_velocity * self.angular_velocity;
        let potential = self.params.gravity * length * (1.0 - self.angle.cos());
        kinetic + potential
    }

    pub fn snapshot(&self) -> PendulumSnapshot {
        PendulumSnapshot {
            phase: self.phase,
            angle: self.angle,
            angular_velocity: self.angular_velocity,
            length: self.params.length,
            gravity: self.params.gravity,
            initial_angle: self.params.initial_angle,
            period: self.params.small_angle_period(),
            energy: self.energy_per_unit_mass(),
        }
    }
}

impl Default for PendulumSimulation {
    fn default() -> Self {
        Self {
            params: PendulumParams::default(),
            angle: DEFAULT_INITIAL_ANGLE,
            angular_velocity: 0.0,
            phase: SimulationPhase::Idle,
            damping: DampingModel::default(),
            pivot: PIVOT_POSITION,
        }
    }
}

impl FrameUpdate for PendulumSimulation {
    fn frame_update(&mut self, _scene: &mut SceneContext, elapsed_seconds: f32) -> Result<()> {
        self.step(elapsed_seconds).map(|_| ())
    }
}
