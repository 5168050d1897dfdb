//! Asset loading and initialisation systems.
//!
//! Manages the experiment manifest and the asynchronous model pipeline
//! feeding the asset viewer.

/// Experiment manifest loading and resource installation.
///
/// Falls back to the default pendulum experiment when the manifest is missing.
pub mod manifest_loader;

/// Model request, load polling and scene instantiation for the asset viewer.
///
/// Stale loads are discarded so only the most recent request attaches.
pub mod model_loader;
