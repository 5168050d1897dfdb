use bevy::prelude::*;

use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::scene::host::SceneHost;
use crate::engine::simulation::pendulum::PendulumSimulation;
use crate::engine::viewer::asset_viewer::AssetViewer;

/// One render-loop tick with the pendulum attached.
pub fn advance_pendulum_frame(
    time: Res<Time>,
    mut host: ResMut<SceneHost>,
    controls: Option<ResMut<OrbitControls>>,
    mut simulation: ResMut<PendulumSimulation>,
) {
    host.render_loop_tick(
        time.delta_secs(),
        controls.map(|c| c.into_inner()),
        &mut *simulation,
    );
}

/// One render-loop tick with the asset viewer attached.
pub fn advance_viewer_frame(
    time: Res<Time>,
    mut host: ResMut<SceneHost>,
    controls: Option<ResMut<OrbitControls>>,
    mut viewer: ResMut<AssetViewer>,
) {
    host.render_loop_tick(
        time.delta_secs(),
        controls.map(|c| c.into_inner()),
        &mut *viewer,
    );
}
