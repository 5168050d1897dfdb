use bevy::prelude::*;
use constants::render_settings::{
    BACKGROUND_COLOUR, CameraPreset, FAR_CLIP, LightPreset, NEAR_CLIP, ORBIT_MIN_DISTANCE,
    PENDULUM_CAMERA, PENDULUM_LIGHTS, VIEWER_CAMERA, VIEWER_LIGHTS,
};

/// Size of the render surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized surface cannot be rendered to (collapsed element,
    /// minimised window).
    pub fn is_renderable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Perspective camera state owned by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    home_position: Vec3,
    home_target: Vec3,
}

impl CameraRig {
    pub fn new(preset: &CameraPreset, aspect_ratio: f32) -> Self {
        Self {
            position: preset.position,
            target: preset.target,
            fov_degrees: preset.fov_degrees,
            aspect_ratio,
            near: NEAR_CLIP,
            far: FAR_CLIP,
            home_position: preset.position,
            home_target: preset.target,
        }
    }

    pub fn home_position(&self) -> Vec3 {
        self.home_position
    }

    /// Unit vector from the camera towards its target.
    pub fn view_axis(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn distance_to_target(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Restore the pose the scene was mounted with.
    pub fn reset_to_home(&mut self) {
        self.position = self.home_position;
        self.target = self.home_target;
    }

    /// Move along the view axis by `delta` metres; negative moves closer.
    /// The camera stops `ORBIT_MIN_DISTANCE` short of its target.
    pub fn dolly(&mut self, delta: f32) {
        let axis = self.view_axis();
        let distance = (self.distance_to_target() + delta).max(ORBIT_MIN_DISTANCE);
        self.position = self.target - axis * distance;
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).looking_at(self.target, Vec3::Y)
    }

    pub fn projection(&self) -> PerspectiveProjection {
        PerspectiveProjection {
            fov: self.fov_degrees.to_radians(),
            aspect_ratio: self.aspect_ratio,
            near: self.near,
            far: self.far,
            ..default()
        }
    }
}

/// White ambient light plus one directional light.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
    pub shadows: bool,
}

impl From<&LightPreset> for LightRig {
    fn from(preset: &LightPreset) -> Self {
        Self {
            ambient_intensity: preset.ambient_intensity,
            directional_intensity: preset.directional_intensity,
            directional_position: preset.directional_position,
            shadows: preset.shadows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneObjectKind {
    Camera,
    Light,
    Pivot,
    Bob,
    String,
    Grid,
    Model,
}

/// A renderable owned by the scene, with the GPU-backed assets it holds.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub entity: Entity,
    pub kind: SceneObjectKind,
    pub meshes: Vec<Handle<Mesh>>,
    pub materials: Vec<Handle<StandardMaterial>>,
}

impl SceneObject {
    pub fn new(entity: Entity, kind: SceneObjectKind) -> Self {
        Self {
            entity,
            kind,
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Handle<Mesh>) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_material(mut self, material: Handle<StandardMaterial>) -> Self {
        self.materials.push(material);
        self
    }
}

/// Everything needed to build a scene besides the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub camera: CameraPreset,
    pub lights: LightPreset,
    pub background: Color,
}

impl SceneSettings {
    pub fn pendulum() -> Self {
        Self {
            camera: PENDULUM_CAMERA,
            lights: PENDULUM_LIGHTS,
            background: BACKGROUND_COLOUR,
        }
    }

    pub fn model_viewer() -> Self {
        Self {
            camera: VIEWER_CAMERA,
            lights: VIEWER_LIGHTS,
            background: BACKGROUND_COLOUR,
        }
    }
}

/// Camera, lights, surface and renderables of one mounted scene.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub camera: CameraRig,
    pub lights: LightRig,
    pub background: Color,
    surface: SurfaceSize,
    objects: Vec<SceneObject>,
}

impl SceneContext {
    pub fn new(surface: SurfaceSize, settings: &SceneSettings) -> Self {
        Self {
            camera: CameraRig::new(&settings.camera, surface.aspect_ratio()),
            lights: LightRig::from(&settings.lights),
            background: settings.background,
            surface,
            objects: Vec::new(),
        }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Follow a surface size change. Zero-sized surfaces are ignored and the
    /// last renderable aspect is kept.
    pub fn resize(&mut self, surface: SurfaceSize) -> bool {
        if !surface.is_renderable() || surface == self.surface {
            return false;
        }
        self.surface = surface;
        self.camera.aspect_ratio = surface.aspect_ratio();
        true
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Forget an object without releasing it; the caller takes ownership.
    pub fn detach_object(&mut self, entity: Entity) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.entity == entity)?;
        Some(self.objects.remove(index))
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn find(&self, kind: SceneObjectKind) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.kind == kind)
    }

    pub(crate) fn drain_objects(&mut self) -> Vec<SceneObject> {
        std::mem::take(&mut self.objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context() -> SceneContext {
        SceneContext::new(SurfaceSize::new(800, 400), &SceneSettings::model_viewer())
    }

    #[test]
    fn test_aspect_follows_resize() {
        let mut ctx = context();
        assert_relative_eq!(ctx.camera.aspect_ratio, 2.0);
        assert!(ctx.resize(SurfaceSize::new(300, 600)));
        assert_relative_eq!(ctx.camera.aspect_ratio, 0.5);
    }

    #[test]
    fn test_zero_sized_resize_ignored() {
        let mut ctx = context();
        assert!(!ctx.resize(SurfaceSize::new(0, 600)));
        assert_eq!(ctx.surface(), SurfaceSize::new(800, 400));
        assert_relative_eq!(ctx.camera.aspect_ratio, 2.0);
    }

    #[test]
    fn test_dolly_moves_along_view_axis() {
        let mut rig = CameraRig::new(&VIEWER_CAMERA, 1.0);
        let axis = rig.view_axis();
        let start = rig.position;
        rig.dolly(-0.5);
        assert_relative_eq!(rig.position.distance(start), 0.5, epsilon = 1e-5);
        assert_relative_eq!((rig.position - start).normalize().dot(axis), 1.0, epsilon = 1e-5);

        rig.dolly(-100.0);
        assert_relative_eq!(rig.distance_to_target(), ORBIT_MIN_DISTANCE, epsilon = 1e-5);

        rig.reset_to_home();
        assert_eq!(rig.position, VIEWER_CAMERA.position);
        assert_eq!(rig.target, VIEWER_CAMERA.target);
    }

    #[test]
    fn test_detach_object() {
        let mut ctx = context();
        let entity = Entity::from_raw(7);
        ctx.add_object(SceneObject::new(entity, SceneObjectKind::Model));
        assert!(ctx.find(SceneObjectKind::Model).is_some());
        assert!(ctx.detach_object(entity).is_some());
        assert!(ctx.objects().is_empty());
    }
}
