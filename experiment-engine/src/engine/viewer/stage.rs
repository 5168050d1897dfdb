use bevy::prelude::*;
use constants::render_settings::{GRID_DIVISIONS, GRID_SIZE};

use crate::engine::assets::experiment_manifest::ExperimentManifest;
use crate::engine::scene::grid::spawn_grid_helper;
use crate::engine::scene::host::SceneHost;
use crate::engine::viewer::asset_viewer::AssetViewer;

/// Grid helper plus the manifest's initial model request.
pub fn spawn_viewer_stage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut host: ResMut<SceneHost>,
    mut viewer: ResMut<AssetViewer>,
    manifest: Res<ExperimentManifest>,
) {
    spawn_grid_helper(
        &mut commands,
        &mut meshes,
        &mut materials,
        &mut host,
        GRID_SIZE,
        GRID_DIVISIONS,
    );

    let (url, format) = manifest.model_request();
    if let Err(err) = viewer.load_tagged(url, format) {
        warn!("Initial model not loaded: {err}");
    }
}
