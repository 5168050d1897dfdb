use bevy::prelude::*;

/// Lifecycle of the mounted experiment.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// Waiting for the experiment manifest.
    #[default]
    Configuring,
    /// Scene host is being attached to the display surface.
    Mounting,
    Running,
    /// The display surface was unusable; nothing is rendered.
    SetupFailed,
    /// Torn down after an unmount request.
    Disposed,
}

#[derive(Component)]
pub struct FpsText;

pub fn log_state_transitions(mut transitions: EventReader<StateTransitionEvent<AppState>>) {
    for transition in transitions.read() {
        if let (Some(from), Some(to)) = (transition.exited, transition.entered) {
            println!("→ Transitioning from {:?} to {:?}", from, to);
        }
    }
}
