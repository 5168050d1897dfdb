use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use constants::render_settings::{AMBIENT_BRIGHTNESS_SCALE, DIRECTIONAL_ILLUMINANCE_SCALE};

use super::context::{SceneObject, SceneObjectKind, SurfaceSize};
use super::host::{SceneHost, TickOutcome};
use crate::engine::assets::experiment_manifest::ExperimentManifest;
use crate::engine::core::app_state::AppState;
use crate::engine::loading::model_loader::ModelLoadPipeline;
use crate::engine::viewer::asset_viewer::AssetViewer;
use crate::rpc::web_rpc::WebRpcInterface;

/// Marks the camera driven by the host's `CameraRig`.
#[derive(Component)]
pub struct SceneCamera;

/// Attach the host to the primary window and spawn camera and lights.
pub fn mount_scene_host(
    mut commands: Commands,
    mut host: ResMut<SceneHost>,
    manifest: Res<ExperimentManifest>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut next_state: ResMut<NextState<AppState>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    let surface = windows
        .single()
        .ok()
        .map(|window| SurfaceSize::new(window.physical_width(), window.physical_height()));

    if let Err(err) = host.initialize(surface, &manifest.scene_settings()) {
        error!("{err}");
        rpc_interface.send_notification(
            "scene_error",
            serde_json::json!({ "message": err.to_string() }),
        );
        next_state.set(AppState::SetupFailed);
        return;
    }
    let Some(context) = host.context() else {
        return;
    };
    let rig = context.camera.clone();
    let lights = context.lights.clone();

    commands.insert_resource(ClearColor(context.background));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: lights.ambient_intensity * AMBIENT_BRIGHTNESS_SCALE,
        ..default()
    });

    let camera = commands
        .spawn((
            Camera3d::default(),
            Projection::Perspective(rig.projection()),
            rig.transform(),
            SceneCamera,
        ))
        .id();
    let light = commands
        .spawn((
            DirectionalLight {
                illuminance: lights.directional_intensity * DIRECTIONAL_ILLUMINANCE_SCALE,
                shadows_enabled: lights.shadows,
                ..default()
            },
            Transform::from_translation(lights.directional_position)
                .looking_at(Vec3::ZERO, Vec3::Y),
        ))
        .id();

    host.register(SceneObject::new(camera, SceneObjectKind::Camera));
    host.register(SceneObject::new(light, SceneObjectKind::Light));
    next_state.set(AppState::Running);
}

pub fn follow_surface_resize(
    mut resize_events: EventReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut host: ResMut<SceneHost>,
) {
    if resize_events.read().count() == 0 {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let (width, height) = (window.physical_width(), window.physical_height());
    if host.on_resize(width, height) {
        debug!("Scene resized to {}x{}", width, height);
    }
}

/// Copy the camera rig onto the render camera after a drawn tick.
pub fn present_camera(
    host: Res<SceneHost>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<SceneCamera>>,
) {
    if host.last_tick() != Some(TickOutcome::Drawn) {
        return;
    }
    let Some(rig) = host.camera() else {
        return;
    };
    for (mut transform, mut projection) in &mut cameras {
        *transform = rig.transform();
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.fov = rig.fov_degrees.to_radians();
            perspective.aspect_ratio = rig.aspect_ratio;
        }
    }
}

/// Tear the scene down: stop the render loop, drop viewer state, then free
/// every entity, mesh and material the host tracked.
pub fn dispose_scene_host(
    mut commands: Commands,
    mut host: ResMut<SceneHost>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    viewer: Option<ResMut<AssetViewer>>,
    pipeline: Option<ResMut<ModelLoadPipeline>>,
) {
    if let Some(mut viewer) = viewer {
        viewer.dispose();
    }
    if let Some(root) = pipeline.and_then(|mut pipeline| pipeline.clear()) {
        commands.entity(root).despawn();
    }

    let released = host.dispose();
    for entity in &released.entities {
        commands.entity(*entity).despawn();
    }
    for mesh in &released.meshes {
        meshes.remove(mesh);
    }
    for material in &released.materials {
        materials.remove(material);
    }
    info!(
        "Scene disposed: {} entities, {} meshes, {} materials released",
        released.entities.len(),
        released.meshes.len(),
        released.materials.len()
    );
}
