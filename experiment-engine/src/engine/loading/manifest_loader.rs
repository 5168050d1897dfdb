use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::path::{MANIFEST_FILE, RELATIVE_MANIFEST_PATH};

use crate::engine::assets::experiment_manifest::{ExperimentKind, ExperimentManifest};
use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::core::app_state::AppState;
use crate::engine::loading::model_loader::ModelLoadPipeline;
use crate::engine::simulation::pendulum::PendulumSimulation;
use crate::engine::viewer::asset_viewer::AssetViewer;

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<ExperimentManifest>>,
}

// Start the loading process
pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    let manifest_path = format!("{}/{}", RELATIVE_MANIFEST_PATH, MANIFEST_FILE);
    manifest_loader.handle = Some(asset_server.load(manifest_path));
}

/// Install the experiment once the manifest resolves. A missing or broken
/// manifest falls back to the pendulum preset.
pub fn load_manifest_system(
    manifest_loader: Res<ManifestLoader>,
    manifests: Res<Assets<ExperimentManifest>>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = &manifest_loader.handle else {
        return;
    };

    let manifest = if let Some(manifest) = manifests.get(handle) {
        println!("✓ Experiment manifest loaded ({:?})", manifest.experiment);
        manifest.clone()
    } else if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
        warn!("Experiment manifest unavailable ({err}); using the pendulum preset");
        ExperimentManifest::default()
    } else {
        return;
    };

    install_experiment(&mut commands, manifest);
    next_state.set(AppState::Mounting);
}

/// Insert the resources of the experiment named by `manifest`.
pub fn install_experiment(commands: &mut Commands, manifest: ExperimentManifest) {
    match manifest.experiment {
        ExperimentKind::Pendulum => {
            let simulation = manifest.pendulum_simulation().unwrap_or_else(|err| {
                warn!("Invalid pendulum configuration: {err}; using defaults");
                PendulumSimulation::default()
            });
            commands.insert_resource(simulation);
        }
        ExperimentKind::ModelViewer => {
            commands.insert_resource(AssetViewer::default());
            commands.insert_resource(OrbitControls::default());
            commands.insert_resource(ModelLoadPipeline::default());
        }
    }
    commands.insert_resource(manifest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn install(manifest: ExperimentManifest) -> World {
        let mut world = World::new();
        world
            .run_system_once(move |mut commands: Commands| {
                install_experiment(&mut commands, manifest.clone())
            })
            .unwrap();
        world
    }

    #[test]
    fn test_pendulum_experiment_resources() {
        let world = install(ExperimentManifest::default());
        assert!(world.contains_resource::<PendulumSimulation>());
        assert!(!world.contains_resource::<AssetViewer>());
        assert!(world.contains_resource::<ExperimentManifest>());
    }

    #[test]
    fn test_viewer_experiment_resources() {
        let world = install(ExperimentManifest {
            experiment: ExperimentKind::ModelViewer,
            ..default()
        });
        assert!(world.contains_resource::<AssetViewer>());
        assert!(world.contains_resource::<OrbitControls>());
        assert!(world.contains_resource::<ModelLoadPipeline>());
        assert!(!world.contains_resource::<PendulumSimulation>());
    }

    #[test]
    fn test_invalid_pendulum_falls_back_to_defaults() {
        let manifest: ExperimentManifest =
            serde_json::from_str(r#"{ "pendulum": { "gravity": -1.0 } }"#).unwrap();
        let world = install(manifest);
        assert_eq!(
            world.resource::<PendulumSimulation>().params().gravity,
            PendulumSimulation::default().params().gravity
        );
    }
}
