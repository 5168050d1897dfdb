use bevy::prelude::*;
use constants::render_settings::CameraPreset;
use serde::{Deserialize, Serialize};

use crate::engine::scene::context::SceneSettings;
use crate::engine::simulation::pendulum::{PendulumParams, PendulumSimulation};
use crate::error::Result;

/// Which experiment the page mounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    #[default]
    Pendulum,
    ModelViewer,
}

/// Overrides for the experiment's camera preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub fov_degrees: Option<f32>,
    pub position: Option<[f32; 3]>,
    pub target: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendulumConfig {
    pub length: Option<f32>,
    pub gravity: Option<f32>,
    pub initial_angle: Option<f32>,
    pub pivot: Option<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub url: String,
    /// Format tag; validated when the load is issued.
    #[serde(default = "default_model_format")]
    pub format: String,
}

fn default_model_format() -> String {
    "gltf".to_string()
}

/// Experiment manifest as a Bevy asset. Mirrors the JSON structure; every
/// section is optional and falls back to the experiment's presets.
#[derive(Asset, Debug, Clone, Default, Serialize, Deserialize, TypePath, Resource)]
pub struct ExperimentManifest {
    #[serde(default)]
    pub experiment: ExperimentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConfig>,
    /// sRGB triple in `0..=1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pendulum: Option<PendulumConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

impl ExperimentManifest {
    /// Camera, lights and background for the scene host.
    pub fn scene_settings(&self) -> SceneSettings {
        let base = match self.experiment {
            ExperimentKind::Pendulum => SceneSettings::pendulum(),
            ExperimentKind::ModelViewer => SceneSettings::model_viewer(),
        };
        SceneSettings {
            camera: self.camera_preset(base.camera),
            lights: base.lights,
            background: self
                .background
                .map(|[r, g, b]| Color::srgb(r, g, b))
                .unwrap_or(base.background),
        }
    }

    fn camera_preset(&self, base: CameraPreset) -> CameraPreset {
        let Some(camera) = &self.camera else {
            return base;
        };
        CameraPreset {
            fov_degrees: camera.fov_degrees.unwrap_or(base.fov_degrees),
            position: camera.position.map(Vec3::from).unwrap_or(base.position),
            target: camera.target.map(Vec3::from).unwrap_or(base.target),
        }
    }

    /// Build the simulation from the `pendulum` section, validating every
    /// value like a runtime write.
    pub fn pendulum_simulation(&self) -> Result<PendulumSimulation> {
        let defaults = PendulumParams::default();
        let config = self.pendulum.clone().unwrap_or_default();
        let params = PendulumParams::new(
            config.length.unwrap_or(defaults.length),
            config.gravity.unwrap_or(defaults.gravity),
            config.initial_angle.unwrap_or(defaults.initial_angle),
        )?;
        let simulation = PendulumSimulation::new(params)?;
        Ok(match config.pivot {
            Some(pivot) => simulation.with_pivot(Vec3::from(pivot)),
            None => simulation,
        })
    }

    /// URL and format tag of the model to show first. Missing entries come
    /// back empty so the viewer reports them.
    pub fn model_request(&self) -> (&str, &str) {
        match &self.model {
            Some(model) => (model.url.as_str(), model.format.as_str()),
            None => ("", "gltf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::render_settings::{PENDULUM_CAMERA, VIEWER_CAMERA, VIEWER_LIGHTS};

    #[test]
    fn test_empty_manifest_is_pendulum_preset() {
        let manifest: ExperimentManifest = serde_json::from_str("{}").unwrap();
        assert_eq!(manifest.experiment, ExperimentKind::Pendulum);
        assert_eq!(manifest.scene_settings().camera, PENDULUM_CAMERA);
        let sim = manifest.pendulum_simulation().unwrap();
        assert_eq!(sim.params(), PendulumParams::default());
    }

    #[test]
    fn test_viewer_manifest() {
        let manifest: ExperimentManifest = serde_json::from_str(
            r#"{
                "experiment": "model_viewer",
                "camera": { "position": [0.0, 2.0, 8.0] },
                "model": { "url": "models/robot.glb" }
            }"#,
        )
        .unwrap();
        let settings = manifest.scene_settings();
        assert_eq!(settings.camera.position, Vec3::new(0.0, 2.0, 8.0));
        assert_eq!(settings.camera.fov_degrees, VIEWER_CAMERA.fov_degrees);
        assert_eq!(settings.lights, VIEWER_LIGHTS);
        assert_eq!(manifest.model_request(), ("models/robot.glb", "gltf"));
    }

    #[test]
    fn test_invalid_pendulum_section_rejected() {
        let manifest: ExperimentManifest =
            serde_json::from_str(r#"{ "pendulum": { "length": 0.0 } }"#).unwrap();
        assert!(manifest.pendulum_simulation().is_err());
    }

    #[test]
    fn test_pivot_override() {
        let manifest: ExperimentManifest =
            serde_json::from_str(r#"{ "pendulum": { "pivot": [1.0, 3.0, 0.0] } }"#).unwrap();
        let sim = manifest.pendulum_simulation().unwrap();
        assert_eq!(sim.pivot(), Vec3::new(1.0, 3.0, 0.0));
    }
}
