#[cfg(not(target_arch = "wasm32"))]
use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use constants::controls::{ANGLE_STEP, GRAVITY_STEP, LENGTH_STEP, ZOOM_STEP};

#[cfg(not(target_arch = "wasm32"))]
use super::{CommandSource, ControlCommand, ControlCommandEvent, ParameterUpdate};
#[cfg(not(target_arch = "wasm32"))]
use crate::engine::simulation::pendulum::PendulumSimulation;

/// Slider nudge for a key, relative to the current parameters.
#[cfg(not(target_arch = "wasm32"))]
fn parameter_nudge(key: KeyCode, simulation: &PendulumSimulation) -> Option<ParameterUpdate> {
    let params = simulation.params();
    let update = match key {
        KeyCode::ArrowUp => ParameterUpdate {
            length: Some(params.length + LENGTH_STEP),
            ..default()
        },
        KeyCode::ArrowDown => ParameterUpdate {
            length: Some(params.length - LENGTH_STEP),
            ..default()
        },
        KeyCode::ArrowRight => ParameterUpdate {
            initial_angle: Some(params.initial_angle + ANGLE_STEP),
            ..default()
        },
        KeyCode::ArrowLeft => ParameterUpdate {
            initial_angle: Some(params.initial_angle - ANGLE_STEP),
            ..default()
        },
        KeyCode::KeyH => ParameterUpdate {
            gravity: Some(params.gravity + GRAVITY_STEP),
            ..default()
        },
        KeyCode::KeyG => ParameterUpdate {
            gravity: Some(params.gravity - GRAVITY_STEP),
            ..default()
        },
        _ => return None,
    };
    Some(update.clamped())
}

/// Commands for keys that need no engine state.
#[cfg(not(target_arch = "wasm32"))]
fn key_command(key: KeyCode) -> Option<ControlCommand> {
    match key {
        KeyCode::Space => Some(ControlCommand::ToggleSimulation),
        KeyCode::KeyR => Some(ControlCommand::ResetSimulation),
        KeyCode::KeyP => Some(ControlCommand::ToggleAnimation),
        KeyCode::Home => Some(ControlCommand::ResetView),
        KeyCode::Equal => Some(ControlCommand::Zoom(-ZOOM_STEP)),
        KeyCode::Minus => Some(ControlCommand::Zoom(ZOOM_STEP)),
        KeyCode::KeyF => Some(ControlCommand::ToggleFullscreen),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    simulation: Option<Res<PendulumSimulation>>,
    mut commands: EventWriter<ControlCommandEvent>,
) {
    for key in keyboard.get_just_pressed() {
        let command = key_command(*key).or_else(|| {
            simulation
                .as_deref()
                .and_then(|sim| parameter_nudge(*key, sim))
                .map(ControlCommand::SetParameters)
        });
        if let Some(command) = command {
            commands.write(ControlCommandEvent {
                command,
                source: CommandSource::Keyboard,
            });
        }
    }
}

/// Placeholder system for WASM builds where the embedding page owns the controls.
#[cfg(target_arch = "wasm32")]
pub fn handle_keyboard_shortcuts() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simulation::pendulum::PendulumParams;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_nudges_clamp_at_slider_limit() {
        let sim = PendulumSimulation::new(PendulumParams::new(2.95, 9.8, 0.5).unwrap()).unwrap();
        let update = parameter_nudge(KeyCode::ArrowUp, &sim).unwrap();
        assert_eq!(update.length, Some(3.0));
        assert!(update.gravity.is_none());
    }

    #[test]
    fn test_gravity_keys() {
        let sim = PendulumSimulation::default();
        let lower = parameter_nudge(KeyCode::KeyG, &sim).unwrap();
        let higher = parameter_nudge(KeyCode::KeyH, &sim).unwrap();
        assert_relative_eq!(lower.gravity.unwrap(), 9.3);
        assert_relative_eq!(higher.gravity.unwrap(), 10.3);
    }

    #[test]
    fn test_zoom_keys() {
        assert_eq!(
            key_command(KeyCode::Equal),
            Some(ControlCommand::Zoom(-ZOOM_STEP))
        );
        assert_eq!(key_command(KeyCode::KeyZ), None);
    }
}
