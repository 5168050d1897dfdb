//! JSON-RPC 2.0 communication layer for the embedding page.
//!
//! Implements bidirectional messaging between the experiment engine and the
//! host page via iframe postMessage, supporting both request-response and
//! notification patterns. Natively the queue is inert.
//!
//! ## Architecture
//!
//! The RPC system uses standard JSON-RPC 2.0 protocol with:
//! - **Requests**: Expect responses with matching IDs
//! - **Notifications**: One-way messages without responses
//! - **Responses**: Reply to requests with results or errors
//!
//! ## Message Flow
//!
//! ```text
//! Host page (Parent)     <──postMessage──>  Engine (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! ## Adding New RPC Methods
//!
//! ### 1. Define Request Handler
//!
//! Read-only queries get a case in `handle_rpc_request()`. Methods that change
//! engine state map to a `ControlCommand` in `parse_control_command()` and are
//! applied by `apply_control_commands` like keyboard shortcuts:
//!
//! ```rust,ignore
//! fn handle_rpc_request(request: &RpcRequest, ...) -> Option<RpcResponse> {
//!     let result = match request.method.as_str() {
//!         "your_query_name" => handle_your_query(&request.params, ...),
//!         // ... existing queries
//!         method => match parse_control_command(method, &request.params) { ... },
//!     };
//!     // ... response creation
//! }
//! ```
//!
//! ### 2. Implement Handler Function
//!
//! ```rust,ignore
//! fn handle_your_method(
//!     params: &Value,
//!     // ... required resources
//! ) -> Result<Value, RpcError> {
//!     // Deserialize parameters
//!     #[derive(Deserialize)]
//!     struct YourParams {
//!         field: String,
//!     }
//!
//!     let parsed = serde_json::from_value::<YourParams>(params.clone())
//!         .map_err(|_| RpcError::invalid_params("Expected 'field' parameter"))?;
//!
//!     // Process logic here
//!
//!     // Return success response
//!     Ok(json!({
//!         "success": true,
//!         "result": parsed.field
//!     }))
//! }
//! ```
//!
//! ### 3. Call From the Host Page
//!
//! ```typescript
//! // Request-response pattern
//! const response = await window.postMessage({
//!   jsonrpc: "2.0",
//!   method: "your_method_name",
//!   params: { field: "value" },
//!   id: 1
//! }, "*");
//!
//! // Notification pattern (no response expected)
//! window.postMessage({
//!   jsonrpc: "2.0",
//!   method: "your_notification",
//!   params: { data: "value" }
//! }, "*");
//! ```
//!
//! ## Sending Notifications from Bevy
//!
//! Use `WebRpcInterface::send_notification()` to push updates to the page:
//!
//! ```rust,ignore
//! fn your_system(mut rpc: ResMut<WebRpcInterface>) {
//!     rpc.send_notification("event_name", json!({
//!         "data": "value",
//!         "timestamp": 123456
//!     }));
//! }
//! ```
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! ## Existing Methods
//!
//! ### Simulation
//! - `start_simulation`, `pause_simulation`, `resume_simulation`, `toggle_simulation`
//! - `reset_simulation`: Restore the initial angle and zero velocity
//! - `set_pendulum_parameters`: Write `length`, `gravity` or `initial_angle` (clamped, idle only)
//! - `get_pendulum_state`: Current phase, angle, velocity and parameters
//!
//! ### Asset Viewer
//! - `load_model`: Request a `gltf`, `obj` or `fbx` model by `url`
//! - `toggle_animation`: Play or pause the loaded clips
//! - `reset_view`, `zoom`: Camera framing
//! - `toggle_fullscreen`: Enter or leave fullscreen presentation
//! - `get_viewer_status`: Loading flag, error, playback and source
//!
//! ### Lifecycle
//! - `unmount`: Dispose the scene host and everything it owns
//!
//! ### Diagnostics
//! - `get_fps`: Retrieve current frame rate
//!
//! Control methods reply `{"queued": true}`: the command is applied on the
//! next input pass and its effect arrives through the notifications below.
//!
//! ## Notifications
//! - `fps_update`, `pendulum_state`, `viewer_status`, `scene_error`

/// JSON-RPC 2.0 bidirectional communication system for the embedding page.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
