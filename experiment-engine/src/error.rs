//! Error taxonomy shared by the scene host, simulation and viewer.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The display surface was missing or unusable when the scene mounted.
    #[error("scene setup failed: {0}")]
    Setup(String),

    /// A simulation parameter outside its valid domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// Network or parse failure while fetching a model.
    #[error("error loading model {url}: {cause}")]
    AssetLoad { url: String, cause: String },

    /// An integration step produced a non-finite state and was rolled back.
    #[error("pendulum state diverged (angle {angle}, angular velocity {angular_velocity})")]
    StateDiverged { angle: f32, angular_velocity: f32 },

    #[error("viewer has been disposed")]
    ViewerDisposed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
