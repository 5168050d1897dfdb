use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::scene::context::SceneContext;
use crate::engine::scene::host::{FrameUpdate, SceneHost};
use crate::engine::viewer::presentation::{PresentationSurface, toggle_fullscreen};
use crate::error::{EngineError, Result};

/// Closed set of model formats the viewer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Gltf,
    Obj,
    Fbx,
}

impl AssetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Obj => "obj",
            Self::Fbx => "fbx",
        }
    }
}

impl FromStr for AssetFormat {
    type Err = EngineError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "gltf" => Ok(Self::Gltf),
            "obj" => Ok(Self::Obj),
            "fbx" => Ok(Self::Fbx),
            _ => Err(EngineError::UnsupportedFormat(tag.to_string())),
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSource {
    pub url: String,
    pub format: AssetFormat,
}

/// Sequence token of one `load` call. Only the newest ticket may attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// World-space axis-aligned bounds of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ModelBounds {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        }))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipInfo {
    pub name: Option<String>,
    pub duration: f32,
}

/// A model fetched and instantiated, waiting to be attached.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub root: Entity,
    pub bounds: Option<ModelBounds>,
    pub clips: Vec<ClipInfo>,
}

/// Playback clock shared by every clip of the asset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationMixer {
    time_scale: f32,
    elapsed: f32,
}

impl AnimationMixer {
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt * self.time_scale;
    }
}

#[derive(Debug, Clone)]
pub struct ViewerAsset {
    source: ModelSource,
    root: Entity,
    centering_offset: Vec3,
    bounds: Option<ModelBounds>,
    clips: Vec<ClipInfo>,
    playing: bool,
    mixer: AnimationMixer,
}

impl ViewerAsset {
    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn centering_offset(&self) -> Vec3 {
        self.centering_offset
    }

    pub fn bounds(&self) -> Option<ModelBounds> {
        self.bounds
    }

    pub fn clips(&self) -> &[ClipInfo] {
        &self.clips
    }

    pub fn has_animations(&self) -> bool {
        !self.clips.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }
}

/// What the caller must do with a finished load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResolution {
    /// Translate `root` by `centering_offset`, show it and despawn `previous`.
    Attached {
        root: Entity,
        previous: Option<Entity>,
        centering_offset: Vec3,
    },
    /// The previous asset stays attached.
    Failed(EngineError),
    /// Superseded or the viewer was disposed; despawn the instance.
    Discarded,
}

/// Observable viewer state, pushed to the embedding page.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewerStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub has_animations: bool,
    pub playing: bool,
    pub source: Option<ModelSource>,
    pub controls_enabled: bool,
}

#[derive(Debug, Clone)]
struct PendingLoad {
    ticket: LoadTicket,
    source: ModelSource,
}

#[derive(Resource, Debug, Default)]
pub struct AssetViewer {
    last_ticket: u64,
    pending: Option<PendingLoad>,
    asset: Option<ViewerAsset>,
    error: Option<String>,
    disposed: bool,
}

impl AssetViewer {
    /// Request `url`. Any earlier pending request is superseded.
    pub fn load(&mut self, url: &str, format: AssetFormat) -> Result<LoadTicket> {
        if self.disposed {
            return Err(EngineError::ViewerDisposed);
        }
        if url.trim().is_empty() {
            let err = EngineError::AssetLoad {
                url: String::new(),
                cause: "no model URL provided".into(),
            };
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        if let Some(previous) = self.pending.replace(PendingLoad {
            ticket,
            source: ModelSource {
                url: url.to_string(),
                format,
            },
        }) {
            debug!("Load of {} superseded by {}", previous.source.url, url);
        }
        self.error = None;
        Ok(ticket)
    }

    /// Like [`Self::load`] with the format given as a tag. Unknown tags fail
    /// before anything is requested.
    pub fn load_tagged(&mut self, url: &str, tag: &str) -> Result<LoadTicket> {
        let format = match tag.parse::<AssetFormat>() {
            Ok(format) => format,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };
        self.load(url, format)
    }

    pub fn pending_request(&self) -> Option<(LoadTicket, &ModelSource)> {
        self.pending.as_ref().map(|p| (p.ticket, &p.source))
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        !self.disposed && self.pending.as_ref().is_some_and(|p| p.ticket == ticket)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn asset(&self) -> Option<&ViewerAsset> {
        self.asset.as_ref()
    }

    /// Resolve the load identified by `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        outcome: std::result::Result<LoadedModel, String>,
    ) -> LoadResolution {
        if !self.is_current(ticket) {
            return LoadResolution::Discarded;
        }
        let Some(pending) = self.pending.take() else {
            return LoadResolution::Discarded;
        };

        match outcome {
            Ok(model) => {
                let centering_offset = model.bounds.map(|b| -b.center()).unwrap_or(Vec3::ZERO);
                let previous = self.asset.replace(ViewerAsset {
                    source: pending.source,
                    root: model.root,
                    centering_offset,
                    bounds: model.bounds,
                    clips: model.clips,
                    playing: false,
                    mixer: AnimationMixer::default(),
                });
                self.error = None;
                LoadResolution::Attached {
                    root: model.root,
                    previous: previous.map(|asset| asset.root),
                    centering_offset,
                }
            }
            Err(cause) => {
                let err = EngineError::AssetLoad {
                    url: pending.source.url,
                    cause,
                };
                self.error = Some(err.to_string());
                LoadResolution::Failed(err)
            }
        }
    }

    /// Flip playback. Returns the new playing state; without animations
    /// nothing changes.
    pub fn toggle_playback(&mut self) -> bool {
        let Some(asset) = self.asset.as_mut().filter(|a| a.has_animations()) else {
            return false;
        };
        asset.playing = !asset.playing;
        asset
            .mixer
            .set_time_scale(if asset.playing { 1.0 } else { 0.0 });
        asset.playing
    }

    /// Put the camera back where the scene was mounted.
    pub fn reset_view(&self, host: &mut SceneHost, controls: Option<&mut OrbitControls>) {
        if let Some(controls) = controls {
            controls.stop();
        }
        if let Some(camera) = host.camera_mut() {
            camera.reset_to_home();
        }
    }

    /// Move the camera `delta` metres along its view axis; negative is closer.
    pub fn zoom(&self, host: &mut SceneHost, delta: f32) {
        if let Some(camera) = host.camera_mut() {
            camera.dolly(delta);
        }
    }

    pub fn toggle_fullscreen(&self, surface: &mut dyn PresentationSurface) -> bool {
        toggle_fullscreen(surface)
    }

    pub fn status(&self) -> ViewerStatus {
        ViewerStatus {
            loading: self.is_loading(),
            error: self.error.clone(),
            has_animations: self.asset.as_ref().is_some_and(|a| a.has_animations()),
            playing: self.asset.as_ref().is_some_and(|a| a.playing),
            source: self.asset.as_ref().map(|a| a.source.clone()),
            controls_enabled: !self.disposed,
        }
    }

    /// Drop the attached asset and any pending request. Later completions are
    /// discarded. The scene host owns the asset entity and releases it.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.pending = None;
        self.asset = None;
    }
}

impl FrameUpdate for AssetViewer {
    fn frame_update(&mut self, _scene: &mut SceneContext, elapsed_seconds: f32) -> Result<()> {
        if let Some(asset) = self.asset.as_mut() {
            asset.mixer.advance(elapsed_seconds);
        }
        Ok(())
    }
}
