use crate::engine::controls::{CommandSource, ControlCommand, ControlCommandEvent, ParameterUpdate};
use crate::engine::simulation::pendulum::PendulumSimulation;
use crate::engine::viewer::asset_viewer::{AssetFormat, AssetViewer};
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication with the embedding page.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the embedding page without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the embedding page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Notifications waiting for the next send pass.
    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<ControlCommandEvent>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the embedding page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Engine state answered directly by query methods.
struct RpcReadout<'a> {
    diagnostics: &'a DiagnosticsStore,
    pendulum: Option<&'a PendulumSimulation>,
    viewer: Option<&'a AssetViewer>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    diagnostics: Res<DiagnosticsStore>,
    pendulum: Option<Res<PendulumSimulation>>,
    viewer: Option<Res<AssetViewer>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut control_events: EventWriter<ControlCommandEvent>,
) {
    let readout = RpcReadout {
        diagnostics: &diagnostics,
        pendulum: pendulum.as_deref(),
        viewer: viewer.as_deref(),
    };

    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &readout, &mut control_events)
                {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Discarding malformed RPC message: {}", parse_error);
                rpc_interface.queue_response(create_error_response(
                    serde_json::Value::Null,
                    -32600,
                    "Invalid request",
                    Some(serde_json::json!({ "reason": parse_error.to_string() })),
                ));
            }
        }
    }
}

/// Handle individual RPC request. Commands run for requests and
/// notifications alike; only requests with an ID get a response, and for a
/// command that response only confirms it was queued.
fn handle_rpc_request(
    request: &RpcRequest,
    readout: &RpcReadout,
    control_events: &mut EventWriter<ControlCommandEvent>,
) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "get_fps" => handle_get_fps(readout.diagnostics),
        "get_pendulum_state" => handle_get_pendulum_state(readout.pendulum),
        "get_viewer_status" => handle_get_viewer_status(readout.viewer),
        method => match parse_control_command(method, &request.params) {
            Some(Ok(command)) => {
                info!("RPC control dispatched: {:?}", command);
                control_events.write(ControlCommandEvent {
                    command,
                    source: CommandSource::Rpc,
                });
                Ok(serde_json::json!({ "queued": true }))
            }
            Some(Err(error)) => Err(error),
            None => {
                warn!("Unknown RPC method: {}", request.method);
                Err(RpcError {
                    code: -32601,
                    message: "Method not found".to_string(),
                    data: Some(serde_json::json!({"method": request.method})),
                })
            }
        },
    };

    let id = request.id.clone()?;
    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Map a control method to its command. `None` for methods that are not
/// controls.
pub fn parse_control_command(
    method: &str,
    params: &serde_json::Value,
) -> Option<Result<ControlCommand, RpcError>> {
    let command = match method {
        "start_simulation" => Ok(ControlCommand::StartSimulation),
        "pause_simulation" => Ok(ControlCommand::PauseSimulation),
        "resume_simulation" => Ok(ControlCommand::ResumeSimulation),
        "toggle_simulation" => Ok(ControlCommand::ToggleSimulation),
        "reset_simulation" => Ok(ControlCommand::ResetSimulation),
        "set_pendulum_parameters" => parse_parameter_update(params),
        "load_model" => parse_load_model(params),
        "toggle_animation" => Ok(ControlCommand::ToggleAnimation),
        "reset_view" => Ok(ControlCommand::ResetView),
        "zoom" => parse_zoom(params),
        "toggle_fullscreen" => Ok(ControlCommand::ToggleFullscreen),
        "unmount" => Ok(ControlCommand::Unmount),
        _ => return None,
    };
    Some(command)
}

fn parse_parameter_update(params: &serde_json::Value) -> Result<ControlCommand, RpcError> {
    let update = serde_json::from_value::<ParameterUpdate>(params.clone()).map_err(|_| {
        RpcError::invalid_params("Expected numeric 'length', 'gravity' or 'initial_angle'")
    })?;
    if update.is_empty() {
        return Err(RpcError::invalid_params(
            "Expected at least one of 'length', 'gravity', 'initial_angle'",
        ));
    }
    Ok(ControlCommand::SetParameters(update.clamped()))
}

fn parse_load_model(params: &serde_json::Value) -> Result<ControlCommand, RpcError> {
    #[derive(serde::Deserialize)]
    struct LoadModelParams {
        url: String,
        #[serde(default = "default_format")]
        format: String,
    }

    fn default_format() -> String {
        AssetFormat::Gltf.to_string()
    }

    let parsed = serde_json::from_value::<LoadModelParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'url' and 'format' parameters"))?;
    let format = parsed
        .format
        .parse::<AssetFormat>()
        .map_err(|err| RpcError::invalid_params(&err.to_string()))?;
    if parsed.url.trim().is_empty() {
        return Err(RpcError::invalid_params("no model URL provided"));
    }
    Ok(ControlCommand::LoadModel {
        url: parsed.url,
        format,
    })
}

fn parse_zoom(params: &serde_json::Value) -> Result<ControlCommand, RpcError> {
    #[derive(serde::Deserialize)]
    struct ZoomParams {
        delta: f32,
    }

    let parsed = serde_json::from_value::<ZoomParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected numeric 'delta' parameter"))?;
    if !parsed.delta.is_finite() {
        return Err(RpcError::invalid_params("'delta' must be finite"));
    }
    Ok(ControlCommand::Zoom(parsed.delta))
}

/// Handle FPS retrieval with diagnostic system integration.
fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

fn handle_get_pendulum_state(
    pendulum: Option<&PendulumSimulation>,
) -> Result<serde_json::Value, RpcError> {
    let pendulum = pendulum.ok_or_else(|| RpcError::internal_error("No pendulum mounted"))?;
    serde_json::to_value(pendulum.snapshot())
        .map_err(|err| RpcError::internal_error(&err.to_string()))
}

fn handle_get_viewer_status(viewer: Option<&AssetViewer>) -> Result<serde_json::Value, RpcError> {
    let viewer = viewer.ok_or_else(|| RpcError::internal_error("No asset viewer mounted"))?;
    serde_json::to_value(viewer.status()).map_err(|err| RpcError::internal_error(&err.to_string()))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the embedding page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
