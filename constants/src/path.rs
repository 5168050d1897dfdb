/// Directory (relative to the asset root) holding experiment manifests.
pub const RELATIVE_MANIFEST_PATH: &str = "experiments";

/// Manifest file name inside [`RELATIVE_MANIFEST_PATH`].
pub const MANIFEST_FILE: &str = "manifest.json";

/// CSS selector of the canvas the engine mounts into on wasm.
pub const CANVAS_SELECTOR: &str = "#experiment-canvas";

pub const WINDOW_TITLE: &str = "Interactive Experiments";
