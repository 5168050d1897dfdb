//! Experiment configuration assets.

/// JSON experiment manifest selecting the pendulum or the model viewer.
pub mod experiment_manifest;
