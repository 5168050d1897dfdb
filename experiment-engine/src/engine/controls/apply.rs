use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::{ControlCommand, ControlCommandEvent};
use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::core::app_state::AppState;
use crate::engine::scene::host::SceneHost;
use crate::engine::simulation::pendulum::{ParameterChange, PendulumSimulation};
use crate::engine::viewer::asset_viewer::AssetViewer;
use crate::engine::viewer::presentation::toggle_fullscreen;

/// Apply queued commands to whichever experiment is mounted. Commands for
/// the other experiment are dropped with a debug log.
pub fn apply_control_commands(
    mut events: EventReader<ControlCommandEvent>,
    mut simulation: Option<ResMut<PendulumSimulation>>,
    mut viewer: Option<ResMut<AssetViewer>>,
    mut controls: Option<ResMut<OrbitControls>>,
    mut host: ResMut<SceneHost>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    for event in events.read() {
        debug!("Control {:?} from {:?}", event.command, event.source);

        match &event.command {
            ControlCommand::Unmount => {
                info!("Unmount requested");
                next_state.set(AppState::Disposed);
            }
            ControlCommand::ResetView => {
                if let Some(viewer) = viewer.as_deref() {
                    viewer.reset_view(&mut host, controls.as_deref_mut());
                } else if let Some(camera) = host.camera_mut() {
                    camera.reset_to_home();
                }
            }
            ControlCommand::Zoom(delta) => {
                if let Some(viewer) = viewer.as_deref() {
                    viewer.zoom(&mut host, *delta);
                } else if let Some(camera) = host.camera_mut() {
                    camera.dolly(*delta);
                }
            }
            ControlCommand::ToggleFullscreen => match windows.single_mut() {
                Ok(mut window) => {
                    let fullscreen = match viewer.as_deref() {
                        Some(viewer) => viewer.toggle_fullscreen(&mut *window),
                        None => toggle_fullscreen(&mut *window),
                    };
                    info!("Fullscreen: {}", fullscreen);
                }
                Err(err) => warn!("No window to present fullscreen: {err}"),
            },
            ControlCommand::LoadModel { url, format } => match viewer.as_deref_mut() {
                Some(viewer) => {
                    if let Err(err) = viewer.load(url, *format) {
                        warn!("{err}");
                    }
                }
                None => debug!("No asset viewer mounted; ignoring model load"),
            },
            ControlCommand::ToggleAnimation => {
                if let Some(viewer) = viewer.as_deref_mut() {
                    let playing = viewer.toggle_playback();
                    info!("Animation playing: {}", playing);
                }
            }
            command => match simulation.as_deref_mut() {
                Some(simulation) => apply_simulation_command(simulation, command),
                None => debug!("No pendulum mounted; ignoring {:?}", command),
            },
        }
    }
}

fn apply_simulation_command(simulation: &mut PendulumSimulation, command: &ControlCommand) {
    match command {
        ControlCommand::StartSimulation => {
            simulation.start();
        }
        ControlCommand::PauseSimulation => {
            simulation.pause();
        }
        ControlCommand::ResumeSimulation => {
            simulation.resume();
        }
        ControlCommand::ToggleSimulation => {
            simulation.toggle();
        }
        ControlCommand::ResetSimulation => simulation.reset(),
        ControlCommand::SetParameters(update) => {
            for (name, outcome) in update.apply_to(simulation) {
                match outcome {
                    Ok(ParameterChange::Applied) => debug!("Pendulum {name} updated"),
                    Ok(ParameterChange::IgnoredWhileRunning) => {
                        info!("Ignoring {name} change while the pendulum is running")
                    }
                    Err(err) => warn!("{err}"),
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::controls::{CommandSource, ParameterUpdate};
    use crate::engine::simulation::pendulum::SimulationPhase;
    use bevy::state::app::StatesPlugin;

    fn app_with_pendulum() -> App {
        let mut app = App::new();
        app.add_plugins(StatesPlugin)
            .init_state::<AppState>()
            .add_event::<ControlCommandEvent>()
            .init_resource::<SceneHost>()
            .insert_resource(PendulumSimulation::default())
            .add_systems(Update, apply_control_commands);
        app
    }

    fn send(app: &mut App, command: ControlCommand) {
        app.world_mut().send_event(ControlCommandEvent {
            command,
            source: CommandSource::Rpc,
        });
        app.update();
    }

    #[test]
    fn test_commands_drive_simulation() {
        let mut app = app_with_pendulum();
        send(
            &mut app,
            ControlCommand::SetParameters(ParameterUpdate {
                length: Some(1.0),
                ..default()
            }),
        );
        send(&mut app, ControlCommand::ToggleSimulation);
        {
            let sim = app.world().resource::<PendulumSimulation>();
            assert_eq!(sim.phase(), SimulationPhase::Running);
            assert_eq!(sim.params().length, 1.0);
        }

        send(
            &mut app,
            ControlCommand::SetParameters(ParameterUpdate {
                length: Some(2.5),
                ..default()
            }),
        );
        assert_eq!(
            app.world().resource::<PendulumSimulation>().params().length,
            1.0
        );

        send(&mut app, ControlCommand::ResetSimulation);
        assert_eq!(
            app.world().resource::<PendulumSimulation>().phase(),
            SimulationPhase::Idle
        );
    }

    #[test]
    fn test_unmount_moves_to_disposed() {
        let mut app = app_with_pendulum();
        send(&mut app, ControlCommand::Unmount);
        app.update();
        assert_eq!(
            *app.world().resource::<State<AppState>>().get(),
            AppState::Disposed
        );
    }
}
