use bevy::prelude::*;

use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::scene::context::{CameraRig, SceneContext, SceneObject, SceneSettings, SurfaceSize};
use crate::error::{EngineError, Result};

/// Per-frame hook called by the render loop with the seconds since the
/// previous frame.
pub trait FrameUpdate {
    fn frame_update(&mut self, scene: &mut SceneContext, elapsed_seconds: f32) -> Result<()>;
}

/// Scene with nothing animated.
impl FrameUpdate for () {
    fn frame_update(&mut self, _scene: &mut SceneContext, _elapsed_seconds: f32) -> Result<()> {
        Ok(())
    }
}

/// Identifies one scheduled render loop. A cancelled handle never matches a
/// later loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderLoopHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Drawn,
    /// The frame update failed; nothing was presented but the loop continues.
    Skipped,
    Cancelled,
}

/// Resources handed back by [`SceneHost::dispose`] for the caller to free.
#[derive(Debug, Default)]
pub struct DisposedResources {
    pub entities: Vec<Entity>,
    pub meshes: Vec<Handle<Mesh>>,
    pub materials: Vec<Handle<StandardMaterial>>,
}

impl DisposedResources {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.meshes.is_empty() && self.materials.is_empty()
    }
}

/// Owns the scene context and the render loop attached to one display
/// surface.
#[derive(Resource, Debug, Default)]
pub struct SceneHost {
    context: Option<SceneContext>,
    render_loop: Option<RenderLoopHandle>,
    next_loop_id: u64,
    frames_drawn: u64,
    frames_skipped: u64,
    last_tick: Option<TickOutcome>,
}

impl SceneHost {
    /// Build the scene on `surface` and schedule its render loop.
    ///
    /// Fails without creating anything when the surface is missing or has no
    /// area, or when the host is already mounted.
    pub fn initialize(
        &mut self,
        surface: Option<SurfaceSize>,
        settings: &SceneSettings,
    ) -> Result<RenderLoopHandle> {
        if self.context.is_some() {
            return Err(EngineError::Setup("scene host is already mounted".into()));
        }
        let surface =
            surface.ok_or_else(|| EngineError::Setup("no display surface available".into()))?;
        if !surface.is_renderable() {
            return Err(EngineError::Setup(format!(
                "display surface has zero size ({}x{})",
                surface.width, surface.height
            )));
        }

        self.context = Some(SceneContext::new(surface, settings));
        self.next_loop_id += 1;
        let handle = RenderLoopHandle(self.next_loop_id);
        self.render_loop = Some(handle);
        info!(
            "Scene mounted on {}x{} surface",
            surface.width, surface.height
        );
        Ok(handle)
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&SceneContext> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut SceneContext> {
        self.context.as_mut()
    }

    pub fn camera(&self) -> Option<&CameraRig> {
        self.context.as_ref().map(|c| &c.camera)
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraRig> {
        self.context.as_mut().map(|c| &mut c.camera)
    }

    pub fn render_loop(&self) -> Option<RenderLoopHandle> {
        self.render_loop
    }

    pub fn is_rendering(&self) -> bool {
        self.context.is_some() && self.render_loop.is_some()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn last_tick(&self) -> Option<TickOutcome> {
        self.last_tick
    }

    /// Track a renderable so it is released on dispose. Returns false when
    /// nothing is mounted; the caller still owns the object.
    pub fn register(&mut self, object: SceneObject) -> bool {
        match self.context.as_mut() {
            Some(context) => {
                context.add_object(object);
                true
            }
            None => false,
        }
    }

    pub fn detach(&mut self, entity: Entity) -> Option<SceneObject> {
        self.context.as_mut()?.detach_object(entity)
    }

    /// Follow a surface resize. Returns true when the camera aspect changed.
    pub fn on_resize(&mut self, width: u32, height: u32) -> bool {
        match self.context.as_mut() {
            Some(context) => context.resize(SurfaceSize::new(width, height)),
            None => false,
        }
    }

    /// Run one frame: damped controls first, then the frame update, then the
    /// frame is marked drawn. A failing update skips the frame only.
    pub fn render_loop_tick(
        &mut self,
        elapsed_seconds: f32,
        controls: Option<&mut OrbitControls>,
        update: &mut dyn FrameUpdate,
    ) -> TickOutcome {
        let outcome = match (self.context.as_mut(), self.render_loop) {
            (Some(context), Some(_)) => {
                if let Some(controls) = controls {
                    controls.update(&mut context.camera);
                }
                match update.frame_update(context, elapsed_seconds) {
                    Ok(()) => {
                        self.frames_drawn += 1;
                        TickOutcome::Drawn
                    }
                    Err(err) => {
                        warn!("Skipping frame: {err}");
                        self.frames_skipped += 1;
                        TickOutcome::Skipped
                    }
                }
            }
            _ => TickOutcome::Cancelled,
        };
        self.last_tick = Some(outcome);
        outcome
    }

    /// Stop the loop identified by `handle`. Stale handles are ignored.
    pub fn cancel_render_loop(&mut self, handle: RenderLoopHandle) -> bool {
        if self.render_loop == Some(handle) {
            self.render_loop = None;
            debug!("Render loop {:?} cancelled", handle);
            true
        } else {
            false
        }
    }

    /// Cancel the render loop, then hand back every tracked entity, mesh and
    /// material. Calling this again returns nothing.
    pub fn dispose(&mut self) -> DisposedResources {
        if let Some(handle) = self.render_loop {
            self.cancel_render_loop(handle);
        }
        let mut released = DisposedResources::default();
        let Some(mut context) = self.context.take() else {
            return released;
        };
        for object in context.drain_objects() {
            released.entities.push(object.entity);
            released.meshes.extend(object.meshes);
            released.materials.extend(object.materials);
        }
        self.last_tick = None;
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::context::SceneObjectKind;
    use bevy::math::Vec2;

    fn mounted() -> SceneHost {
        let mut host = SceneHost::default();
        host.initialize(Some(SurfaceSize::new(640, 480)), &SceneSettings::pendulum())
            .unwrap();
        host
    }

    struct Recorder {
        calls: Vec<f32>,
        camera_seen: Option<Vec3>,
        fail: bool,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                camera_seen: None,
                fail: false,
            }
        }
    }

    impl FrameUpdate for Recorder {
        fn frame_update(&mut self, scene: &mut SceneContext, elapsed_seconds: f32) -> Result<()> {
            self.calls.push(elapsed_seconds);
            self.camera_seen = Some(scene.camera.position);
            if self.fail {
                Err(EngineError::StateDiverged {
                    angle: f32::NAN,
                    angular_velocity: f32::NAN,
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_missing_surface_creates_nothing() {
        let mut host = SceneHost::default();
        let err = host.initialize(None, &SceneSettings::pendulum()).unwrap_err();
        assert!(matches!(err, EngineError::Setup(_)));
        assert!(!host.is_mounted());
        assert!(host.render_loop().is_none());
    }

    #[test]
    fn test_zero_sized_surface_rejected() {
        let mut host = SceneHost::default();
        let result = host.initialize(Some(SurfaceSize::new(0, 300)), &SceneSettings::pendulum());
        assert!(result.is_err());
        assert!(!host.is_mounted());
    }

    #[test]
    fn test_second_initialize_rejected() {
        let mut host = mounted();
        let first = host.render_loop();
        assert!(host
            .initialize(Some(SurfaceSize::new(10, 10)), &SceneSettings::model_viewer())
            .is_err());
        assert_eq!(host.render_loop(), first);
        assert_eq!(host.context().unwrap().surface(), SurfaceSize::new(640, 480));
    }

    #[test]
    fn test_controls_update_before_frame_update() {
        let mut host = mounted();
        let home = host.camera().unwrap().position;
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(120.0, 0.0));
        let mut recorder = Recorder::new();

        let outcome = host.render_loop_tick(0.016, Some(&mut controls), &mut recorder);

        assert_eq!(outcome, TickOutcome::Drawn);
        assert_eq!(recorder.calls, vec![0.016]);
        let seen = recorder.camera_seen.unwrap();
        assert_ne!(seen, home);
        assert_eq!(Some(&seen), host.camera().map(|c| &c.position));
        assert_eq!(host.frames_drawn(), 1);
    }

    #[test]
    fn test_failed_update_skips_frame_and_keeps_loop() {
        let mut host = mounted();
        let mut recorder = Recorder::new();
        recorder.fail = true;
        assert_eq!(
            host.render_loop_tick(0.016, None, &mut recorder),
            TickOutcome::Skipped
        );
        assert!(host.is_rendering());
        recorder.fail = false;
        assert_eq!(
            host.render_loop_tick(0.016, None, &mut recorder),
            TickOutcome::Drawn
        );
        assert_eq!(host.frames_drawn(), 1);
        assert_eq!(host.frames_skipped(), 1);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut host = mounted();
        assert!(host.on_resize(1000, 500));
        assert_eq!(host.camera().unwrap().aspect_ratio, 2.0);
        assert!(!host.on_resize(0, 0));
        assert_eq!(host.camera().unwrap().aspect_ratio, 2.0);
    }

    #[test]
    fn test_stale_cancel_ignored() {
        let mut host = mounted();
        let handle = host.render_loop().unwrap();
        host.dispose();
        host.initialize(Some(SurfaceSize::new(10, 10)), &SceneSettings::pendulum())
            .unwrap();
        assert!(!host.cancel_render_loop(handle));
        assert!(host.is_rendering());
    }

    #[test]
    fn test_dispose_releases_everything_once() {
        let mut host = mounted();
        let mesh = Handle::<Mesh>::default();
        let material = Handle::<StandardMaterial>::default();
        assert!(host.register(
            SceneObject::new(Entity::from_raw(3), SceneObjectKind::Bob)
                .with_mesh(mesh)
                .with_material(material)
        ));
        assert!(host.register(SceneObject::new(Entity::from_raw(4), SceneObjectKind::Camera)));

        let released = host.dispose();
        assert_eq!(released.entities, vec![Entity::from_raw(3), Entity::from_raw(4)]);
        assert_eq!(released.meshes.len(), 1);
        assert_eq!(released.materials.len(), 1);
        assert!(!host.is_mounted());
        assert!(host.render_loop().is_none());

        let mut recorder = Recorder::new();
        assert_eq!(
            host.render_loop_tick(0.016, None, &mut recorder),
            TickOutcome::Cancelled
        );
        assert!(recorder.calls.is_empty());
        assert!(host.dispose().is_empty());
    }

    #[test]
    fn test_register_without_mount_is_refused() {
        let mut host = SceneHost::default();
        assert!(!host.register(SceneObject::new(Entity::from_raw(1), SceneObjectKind::Grid)));
    }
}
