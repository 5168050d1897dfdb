//! 3D asset viewer for glTF, OBJ and FBX models.
//!
//! Tracks the latest load request, centres loaded models on the origin,
//! and owns animation playback state.

/// Viewer resource: load requests, animation mixer and status readout.
pub mod asset_viewer;

/// Fullscreen toggling for the presentation surface.
pub mod presentation;

/// Ground grid and initial model request for the viewer scene.
pub mod stage;
