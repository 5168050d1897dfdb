use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

use crate::engine::core::app_state::FpsText;
use crate::engine::simulation::pendulum::{PendulumSimulation, SimulationPhase};
use crate::engine::viewer::asset_viewer::{AssetViewer, ViewerStatus};
use crate::rpc::web_rpc::WebRpcInterface;

/// Seconds between `pendulum_state` notifications while running.
const PENDULUM_STATE_INTERVAL: f32 = 0.1;

pub fn fps_notification_system(
    mut rpc_interface: ResMut<WebRpcInterface>,
    diagnostics: Res<DiagnosticsStore>,
    mut last_send_time: Local<f32>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    // Send FPS every 0.5 seconds
    if current_time - *last_send_time >= 0.5 {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                rpc_interface.send_notification(
                    "fps_update",
                    serde_json::json!({
                        "fps": value as f32
                    }),
                );
                *last_send_time = current_time;
            }
        }
    }
}

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

/// Throttle state for pendulum notifications.
#[derive(Default)]
pub struct PendulumStateThrottle {
    last_phase: Option<SimulationPhase>,
    last_send_time: f32,
}

impl PendulumStateThrottle {
    /// Whether a snapshot should go out at `now`.
    fn should_send(&mut self, phase: SimulationPhase, now: f32) -> bool {
        let phase_changed = self.last_phase != Some(phase);
        let due =
            phase == SimulationPhase::Running && now - self.last_send_time >= PENDULUM_STATE_INTERVAL;
        if phase_changed || due {
            self.last_phase = Some(phase);
            self.last_send_time = now;
            true
        } else {
            false
        }
    }
}

pub fn pendulum_state_notifications(
    mut rpc_interface: ResMut<WebRpcInterface>,
    simulation: Res<PendulumSimulation>,
    mut throttle: Local<PendulumStateThrottle>,
    time: Res<Time>,
) {
    if throttle.should_send(simulation.phase(), time.elapsed_secs()) {
        rpc_interface.send_notification(
            "pendulum_state",
            serde_json::to_value(simulation.snapshot()).unwrap_or_default(),
        );
    }
}

pub fn viewer_status_notifications(
    mut rpc_interface: ResMut<WebRpcInterface>,
    viewer: Res<AssetViewer>,
    mut last_status: Local<Option<ViewerStatus>>,
) {
    let status = viewer.status();
    if last_status.as_ref() == Some(&status) {
        return;
    }
    rpc_interface.send_notification(
        "viewer_status",
        serde_json::to_value(&status).unwrap_or_default(),
    );
    *last_status = Some(status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_change_sends_immediately() {
        let mut throttle = PendulumStateThrottle::default();
        assert!(throttle.should_send(SimulationPhase::Idle, 0.0));
        assert!(!throttle.should_send(SimulationPhase::Idle, 5.0));
        assert!(throttle.should_send(SimulationPhase::Running, 5.01));
        assert!(throttle.should_send(SimulationPhase::Paused, 5.02));
    }

    #[test]
    fn test_running_state_throttled() {
        let mut throttle = PendulumStateThrottle::default();
        assert!(throttle.should_send(SimulationPhase::Running, 1.0));
        assert!(!throttle.should_send(SimulationPhase::Running, 1.05));
        assert!(throttle.should_send(SimulationPhase::Running, 1.1));
    }
}
