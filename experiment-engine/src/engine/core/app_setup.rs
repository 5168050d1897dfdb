use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use bevy_obj::ObjPlugin;
// Crate engine modules
use crate::engine::assets::experiment_manifest::ExperimentManifest;
use crate::engine::camera::orbit_controls::{OrbitControls, orbit_input_system};
use crate::engine::controls::ControlCommandEvent;
use crate::engine::controls::apply::apply_control_commands;
use crate::engine::controls::keyboard::handle_keyboard_shortcuts;
use crate::engine::core::app_state::{AppState, log_state_transitions};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::{ManifestLoader, load_manifest_system, start_loading};
use crate::engine::loading::model_loader::{
    attach_ready_models, poll_model_loads, request_model_loads, sync_animation_playback,
};
use crate::engine::scene::host::SceneHost;
use crate::engine::scene::lifecycle::{
    dispose_scene_host, follow_surface_resize, mount_scene_host, present_camera,
};
use crate::engine::scene::pendulum_rig::{present_pendulum, spawn_pendulum_rig};
use crate::engine::simulation::pendulum::PendulumSimulation;
use crate::engine::systems::frame_tick::{advance_pendulum_frame, advance_viewer_frame};
use crate::engine::systems::telemetry::{
    fps_notification_system, pendulum_state_notifications, viewer_status_notifications,
};
use crate::engine::viewer::asset_viewer::AssetViewer;
use crate::engine::viewer::stage::spawn_viewer_stage;
// Create Web RPC modules
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::core::app_state::FpsText;
#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::telemetry::fps_text_update_system;

/// Ordered stages of a running frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Resize, pointer, keyboard and RPC commands.
    Input,
    /// Render loop tick and model pipeline.
    Tick,
    /// Copy simulation and camera state onto entities.
    Present,
}

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers ExperimentManifest as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<ExperimentManifest>::new(&["json"]))
        // OBJ models load as scenes; FBX has no loader.
        .add_plugins(ObjPlugin)
        .add_plugins(WebRpcPlugin);

    // Initialise resources early
    app.init_resource::<ManifestLoader>()
        .init_resource::<SceneHost>()
        .add_event::<ControlCommandEvent>();

    // State-based system scheduling
    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            load_manifest_system.run_if(in_state(AppState::Configuring)),
        )
        .add_systems(OnEnter(AppState::Mounting), mount_scene_host)
        .add_systems(
            OnEnter(AppState::Running),
            (
                spawn_pendulum_rig.run_if(resource_exists::<PendulumSimulation>),
                spawn_viewer_stage.run_if(resource_exists::<AssetViewer>),
            ),
        )
        .add_systems(OnEnter(AppState::Disposed), dispose_scene_host);

    app.configure_sets(
        Update,
        (FrameSet::Input, FrameSet::Tick, FrameSet::Present)
            .chain()
            .run_if(in_state(AppState::Running)),
    );

    app.add_systems(
        Update,
        (
            follow_surface_resize,
            orbit_input_system.run_if(resource_exists::<OrbitControls>),
            handle_keyboard_shortcuts, // Native shortcuts or no-op for WASM
            apply_control_commands,
        )
            .chain()
            .in_set(FrameSet::Input),
    )
    .add_systems(
        Update,
        (
            advance_pendulum_frame.run_if(resource_exists::<PendulumSimulation>),
            (
                advance_viewer_frame,
                request_model_loads,
                poll_model_loads,
                attach_ready_models,
            )
                .chain()
                .run_if(resource_exists::<AssetViewer>),
        )
            .in_set(FrameSet::Tick),
    )
    .add_systems(
        Update,
        (
            present_camera,
            present_pendulum.run_if(resource_exists::<PendulumSimulation>),
            sync_animation_playback.run_if(resource_exists::<AssetViewer>),
        )
            .in_set(FrameSet::Present),
    );

    // Notifications to the embedding page
    app.add_systems(
        Update,
        (
            fps_notification_system,
            pendulum_state_notifications.run_if(resource_exists::<PendulumSimulation>),
            viewer_status_notifications.run_if(resource_exists::<AssetViewer>),
        )
            .run_if(in_state(AppState::Running)),
    )
    .add_systems(Update, log_state_transitions);

    // Add fps_text_update_system only for native builds.
    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Update, fps_text_update_system);
    }

    app
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }

    #[cfg(target_arch = "wasm32")]
    {
        let _ = &mut commands;
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: "wgpu=error,naga=warn".into(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
