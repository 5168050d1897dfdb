use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy::render::primitives::Aabb;
use bevy::scene::SceneInstanceReady;

use crate::engine::scene::context::{SceneObject, SceneObjectKind};
use crate::engine::scene::host::SceneHost;
use crate::engine::viewer::asset_viewer::{
    AssetFormat, AssetViewer, ClipInfo, LoadResolution, LoadTicket, LoadedModel, ModelBounds,
};

/// Asset server handle of a model being fetched.
#[derive(Debug, Clone)]
enum ModelHandle {
    Gltf(Handle<Gltf>),
    Scene(Handle<Scene>),
}

impl ModelHandle {
    /// Start the fetch. OBJ goes through the `bevy_obj` scene loader; FBX has
    /// no loader and fails before any I/O.
    fn request(
        asset_server: &AssetServer,
        url: &str,
        format: AssetFormat,
    ) -> std::result::Result<Self, String> {
        match format {
            AssetFormat::Gltf => Ok(Self::Gltf(asset_server.load(url.to_string()))),
            AssetFormat::Obj => Ok(Self::Scene(asset_server.load(url.to_string()))),
            AssetFormat::Fbx => Err("no loader is registered for fbx models".into()),
        }
    }

    fn load_state(&self, asset_server: &AssetServer) -> Option<LoadState> {
        match self {
            Self::Gltf(handle) => asset_server.get_load_state(handle),
            Self::Scene(handle) => asset_server.get_load_state(handle),
        }
    }
}

#[derive(Debug)]
struct InFlightModel {
    ticket: LoadTicket,
    url: String,
    handle: ModelHandle,
}

/// A scene instance spawned hidden, waiting for its entities to exist.
#[derive(Debug)]
struct InstantiatingModel {
    ticket: LoadTicket,
    root: Entity,
    clips: Vec<Handle<AnimationClip>>,
    clip_info: Vec<ClipInfo>,
    ready: bool,
}

/// Tracks the single model load the viewer currently cares about.
#[derive(Resource, Debug, Default)]
pub struct ModelLoadPipeline {
    in_flight: Option<InFlightModel>,
    instantiating: Option<InstantiatingModel>,
}

impl ModelLoadPipeline {
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.instantiating.is_none()
    }

    fn tracks(&self, ticket: LoadTicket) -> bool {
        self.in_flight.as_ref().is_some_and(|m| m.ticket == ticket)
            || self.instantiating.as_ref().is_some_and(|m| m.ticket == ticket)
    }

    /// Forget every load. Returns the root of a half-built instance, which
    /// the caller must despawn.
    pub fn clear(&mut self) -> Option<Entity> {
        self.in_flight = None;
        self.instantiating.take().map(|m| m.root)
    }
}

/// Marks the root entity of a spawned model.
#[derive(Component, Debug)]
pub struct ModelRoot {
    pub ticket: LoadTicket,
}

/// Start fetching whatever the viewer most recently asked for.
pub fn request_model_loads(
    mut pipeline: ResMut<ModelLoadPipeline>,
    mut viewer: ResMut<AssetViewer>,
    asset_server: Res<AssetServer>,
) {
    let Some((ticket, source)) = viewer.pending_request() else {
        return;
    };
    if pipeline.tracks(ticket) {
        return;
    }

    info!("Loading {} model from {}", source.format, source.url);
    let url = source.url.clone();
    let handle = match ModelHandle::request(&asset_server, &url, source.format) {
        Ok(handle) => handle,
        Err(cause) => {
            if let LoadResolution::Failed(err) = viewer.complete_load(ticket, Err(cause)) {
                error!("{err}");
            }
            return;
        }
    };
    if let Some(previous) = pipeline.in_flight.replace(InFlightModel {
        ticket,
        url,
        handle,
    }) {
        debug!("Dropping superseded load of {}", previous.url);
    }
}

/// Turn a finished fetch into a hidden scene instance, or report failure.
pub fn poll_model_loads(
    mut commands: Commands,
    mut pipeline: ResMut<ModelLoadPipeline>,
    mut viewer: ResMut<AssetViewer>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    clips: Res<Assets<AnimationClip>>,
) {
    let Some(in_flight) = pipeline.in_flight.as_ref() else {
        return;
    };
    if !viewer.is_current(in_flight.ticket) {
        debug!("Discarding stale load of {}", in_flight.url);
        pipeline.in_flight = None;
        return;
    }

    match in_flight.handle.load_state(&asset_server) {
        Some(LoadState::Loaded) => {}
        Some(LoadState::Failed(err)) => {
            let Some(in_flight) = pipeline.in_flight.take() else {
                return;
            };
            if let LoadResolution::Failed(err) =
                viewer.complete_load(in_flight.ticket, Err(err.to_string()))
            {
                error!("{err}");
            }
            return;
        }
        _ => return,
    }

    let resolved = match &in_flight.handle {
        ModelHandle::Gltf(handle) => {
            let Some(gltf) = gltfs.get(handle) else {
                return;
            };
            gltf.default_scene
                .clone()
                .or_else(|| gltf.scenes.first().cloned())
                .map(|scene| {
                    let clip_info = describe_clips(gltf, &gltf.animations, &clips);
                    (scene, gltf.animations.clone(), clip_info)
                })
        }
        ModelHandle::Scene(handle) => Some((handle.clone(), Vec::new(), Vec::new())),
    };

    let Some(in_flight) = pipeline.in_flight.take() else {
        return;
    };
    let Some((scene, clip_handles, clip_info)) = resolved else {
        if let LoadResolution::Failed(err) =
            viewer.complete_load(in_flight.ticket, Err("model contains no scenes".into()))
        {
            error!("{err}");
        }
        return;
    };

    let root = commands
        .spawn((
            SceneRoot(scene),
            Transform::default(),
            Visibility::Hidden,
            ModelRoot {
                ticket: in_flight.ticket,
            },
        ))
        .observe(mark_model_ready)
        .id();
    debug!("Instantiating {} as {:?}", in_flight.url, root);

    if let Some(stale) = pipeline.instantiating.replace(InstantiatingModel {
        ticket: in_flight.ticket,
        root,
        clips: clip_handles,
        clip_info,
        ready: false,
    }) {
        commands.entity(stale.root).despawn();
    }
}

fn describe_clips(
    gltf: &Gltf,
    handles: &[Handle<AnimationClip>],
    clips: &Assets<AnimationClip>,
) -> Vec<ClipInfo> {
    handles
        .iter()
        .map(|handle| ClipInfo {
            name: gltf
                .named_animations
                .iter()
                .find(|(_, named)| *named == handle)
                .map(|(name, _)| name.to_string()),
            duration: clips.get(handle).map(|clip| clip.duration()).unwrap_or(0.0),
        })
        .collect()
}

fn mark_model_ready(trigger: Trigger<SceneInstanceReady>, mut pipeline: ResMut<ModelLoadPipeline>) {
    if let Some(instance) = pipeline.instantiating.as_mut() {
        if instance.root == trigger.target() {
            instance.ready = true;
        }
    }
}

/// Attach an instantiated model: centre it, swap out the previous asset and
/// start its clips frozen.
pub fn attach_ready_models(
    mut commands: Commands,
    mut pipeline: ResMut<ModelLoadPipeline>,
    mut viewer: ResMut<AssetViewer>,
    mut host: ResMut<SceneHost>,
    children: Query<&Children>,
    mesh_bounds: Query<(&Aabb, &GlobalTransform)>,
    mut roots: Query<(&mut Transform, &mut Visibility), With<ModelRoot>>,
    mut players: Query<&mut AnimationPlayer>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
) {
    let Some(instance) = pipeline.instantiating.take_if(|m| m.ready) else {
        return;
    };

    if !host.is_mounted() {
        if let LoadResolution::Failed(err) =
            viewer.complete_load(instance.ticket, Err("scene host is not mounted".into()))
        {
            error!("{err}");
        }
        commands.entity(instance.root).despawn();
        return;
    }

    let model = LoadedModel {
        root: instance.root,
        bounds: model_bounds(instance.root, &children, &mesh_bounds),
        clips: instance.clip_info.clone(),
    };

    match viewer.complete_load(instance.ticket, Ok(model)) {
        LoadResolution::Attached {
            root,
            previous,
            centering_offset,
        } => {
            if let Ok((mut transform, mut visibility)) = roots.get_mut(root) {
                transform.translation = centering_offset;
                *visibility = Visibility::Inherited;
            }
            // Mounted was checked above, so the new root is owned before the
            // old one goes.
            host.register(SceneObject::new(root, SceneObjectKind::Model));
            if let Some(previous) = previous {
                host.detach(previous);
                commands.entity(previous).despawn();
            }
            start_clips_frozen(
                &mut commands,
                root,
                &instance.clips,
                &children,
                &mut players,
                &mut graphs,
            );
            info!(
                "Model attached with {} animation clip(s)",
                instance.clips.len()
            );
        }
        LoadResolution::Discarded | LoadResolution::Failed(_) => {
            debug!("Discarding instance {:?}", instance.root);
            commands.entity(instance.root).despawn();
        }
    }
}

/// World bounds of every mesh under `root`.
pub fn model_bounds(
    root: Entity,
    children: &Query<&Children>,
    mesh_bounds: &Query<(&Aabb, &GlobalTransform)>,
) -> Option<ModelBounds> {
    let mut corners = Vec::new();
    for entity in std::iter::once(root).chain(children.iter_descendants(root)) {
        if let Ok((aabb, transform)) = mesh_bounds.get(entity) {
            corners.extend(aabb_corners(aabb).map(|c| transform.transform_point(c)));
        }
    }
    ModelBounds::from_points(corners)
}

fn aabb_corners(aabb: &Aabb) -> [Vec3; 8] {
    let center = Vec3::from(aabb.center);
    let half = Vec3::from(aabb.half_extents);
    [
        center + Vec3::new(-half.x, -half.y, -half.z),
        center + Vec3::new(half.x, -half.y, -half.z),
        center + Vec3::new(-half.x, half.y, -half.z),
        center + Vec3::new(half.x, half.y, -half.z),
        center + Vec3::new(-half.x, -half.y, half.z),
        center + Vec3::new(half.x, -half.y, half.z),
        center + Vec3::new(-half.x, half.y, half.z),
        center + Vec3::new(half.x, half.y, half.z),
    ]
}

/// Every clip plays on repeat at speed zero until playback is toggled.
fn start_clips_frozen(
    commands: &mut Commands,
    root: Entity,
    clips: &[Handle<AnimationClip>],
    children: &Query<&Children>,
    players: &mut Query<&mut AnimationPlayer>,
    graphs: &mut Assets<AnimationGraph>,
) {
    if clips.is_empty() {
        return;
    }
    let (graph, nodes) = AnimationGraph::from_clips(clips.iter().cloned());
    let graph = graphs.add(graph);

    for entity in children.iter_descendants(root) {
        let Ok(mut player) = players.get_mut(entity) else {
            continue;
        };
        for node in &nodes {
            player.play(*node).repeat().set_speed(0.0);
        }
        commands
            .entity(entity)
            .insert(AnimationGraphHandle(graph.clone()));
    }
}

/// Keep every player's speed in step with the viewer's mixer.
pub fn sync_animation_playback(
    viewer: Res<AssetViewer>,
    children: Query<&Children>,
    mut players: Query<&mut AnimationPlayer>,
    mut applied: Local<Option<(Entity, f32)>>,
) {
    let Some(asset) = viewer.asset() else {
        *applied = None;
        return;
    };
    let wanted = (asset.root(), asset.mixer().time_scale());
    if *applied == Some(wanted) {
        return;
    }

    for entity in children.iter_descendants(asset.root()) {
        if let Ok(mut player) = players.get_mut(entity) {
            for (_, animation) in player.playing_animations_mut() {
                animation.set_speed(wanted.1);
            }
        }
    }
    *applied = Some(wanted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::context::{SceneSettings, SurfaceSize};
    use bevy::animation::graph::AnimationNodeIndex;
    use bevy::asset::AssetMetaCheck;
    use bevy::ecs::system::RunSystemOnce;
    use bevy_obj::ObjPlugin;
    use std::time::Duration;

    fn mounted_host() -> SceneHost {
        let mut host = SceneHost::default();
        host.initialize(Some(SurfaceSize::new(640, 480)), &SceneSettings::model_viewer())
            .unwrap();
        host
    }

    fn attach_world(host: SceneHost) -> World {
        let mut world = World::new();
        world.init_resource::<ModelLoadPipeline>();
        world.insert_resource(AssetViewer::default());
        world.insert_resource(host);
        world.init_resource::<Assets<AnimationGraph>>();
        world
    }

    /// Spawn a hidden instance whose single mesh spans (-1,0,-1)..(1,2,1)
    /// around `mesh_offset`, and mark it ready.
    fn spawn_ready_instance(world: &mut World, ticket: LoadTicket, mesh_offset: Vec3) -> Entity {
        let mesh = world
            .spawn((
                Aabb::from_min_max(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)),
                GlobalTransform::from_translation(mesh_offset),
            ))
            .id();
        let root = world
            .spawn((Transform::default(), Visibility::Hidden, ModelRoot { ticket }))
            .add_child(mesh)
            .id();
        world.resource_mut::<ModelLoadPipeline>().instantiating = Some(InstantiatingModel {
            ticket,
            root,
            clips: Vec::new(),
            clip_info: Vec::new(),
            ready: true,
        });
        root
    }

    fn attached_models(world: &World) -> Vec<Entity> {
        world
            .resource::<SceneHost>()
            .context()
            .unwrap()
            .objects()
            .iter()
            .filter(|o| o.kind == SceneObjectKind::Model)
            .map(|o| o.entity)
            .collect()
    }

    fn obj_app() -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                meta_check: AssetMetaCheck::Never,
                ..default()
            },
            ObjPlugin,
        ))
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .init_asset::<Image>()
        .init_asset::<Scene>()
        .init_asset::<Gltf>()
        .init_asset::<AnimationClip>()
        .init_resource::<ModelLoadPipeline>()
        .insert_resource(AssetViewer::default())
        .add_systems(Update, (request_model_loads, poll_model_loads).chain());
        app.finish();
        app.cleanup();
        app
    }

    #[test]
    fn test_bounds_cover_transformed_meshes() {
        let mut world = World::new();
        let child = world
            .spawn((
                Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0)),
                GlobalTransform::from_translation(Vec3::new(4.0, 0.0, 0.0)),
            ))
            .id();
        let root = world.spawn(GlobalTransform::IDENTITY).add_child(child).id();

        let bounds = world
            .run_system_once(
                move |children: Query<&Children>,
                      meshes: Query<(&Aabb, &GlobalTransform)>| {
                    model_bounds(root, &children, &meshes)
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(bounds.min, Vec3::new(3.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 1.0, 1.0));
        assert_eq!(bounds.center(), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_clear_returns_half_built_root() {
        let mut viewer = AssetViewer::default();
        let ticket = viewer.load("tree.gltf", AssetFormat::Gltf).unwrap();
        let mut pipeline = ModelLoadPipeline::default();
        assert!(pipeline.is_idle());
        pipeline.instantiating = Some(InstantiatingModel {
            ticket,
            root: Entity::from_raw(9),
            clips: Vec::new(),
            clip_info: Vec::new(),
            ready: false,
        });
        assert_eq!(pipeline.clear(), Some(Entity::from_raw(9)));
        assert!(pipeline.is_idle());
    }

    #[test]
    fn test_attach_centres_and_shows_model() {
        let mut world = attach_world(mounted_host());
        let ticket = world
            .resource_mut::<AssetViewer>()
            .load("tree.gltf", AssetFormat::Gltf)
            .unwrap();
        let root = spawn_ready_instance(&mut world, ticket, Vec3::new(4.0, 0.0, 0.0));

        world.run_system_once(attach_ready_models).unwrap();

        assert_eq!(
            world.get::<Transform>(root).unwrap().translation,
            Vec3::new(-4.0, -1.0, 0.0)
        );
        assert_eq!(*world.get::<Visibility>(root).unwrap(), Visibility::Inherited);
        assert_eq!(world.resource::<AssetViewer>().asset().unwrap().root(), root);
        assert_eq!(attached_models(&world), vec![root]);
        assert!(world.resource::<ModelLoadPipeline>().is_idle());
    }

    #[test]
    fn test_new_model_replaces_previous() {
        let mut world = attach_world(mounted_host());
        let first_ticket = world
            .resource_mut::<AssetViewer>()
            .load("a.gltf", AssetFormat::Gltf)
            .unwrap();
        let first = spawn_ready_instance(&mut world, first_ticket, Vec3::ZERO);
        world.run_system_once(attach_ready_models).unwrap();

        let second_ticket = world
            .resource_mut::<AssetViewer>()
            .load("b.obj", AssetFormat::Obj)
            .unwrap();
        let second = spawn_ready_instance(&mut world, second_ticket, Vec3::ZERO);
        world.run_system_once(attach_ready_models).unwrap();

        assert!(world.get_entity(first).is_err());
        assert_eq!(attached_models(&world), vec![second]);
        assert_eq!(world.resource::<AssetViewer>().asset().unwrap().root(), second);
    }

    #[test]
    fn test_superseded_instance_is_despawned() {
        let mut world = attach_world(mounted_host());
        let stale_ticket = world
            .resource_mut::<AssetViewer>()
            .load("slow.gltf", AssetFormat::Gltf)
            .unwrap();
        world
            .resource_mut::<AssetViewer>()
            .load("fast.gltf", AssetFormat::Gltf)
            .unwrap();
        let stale = spawn_ready_instance(&mut world, stale_ticket, Vec3::ZERO);

        world.run_system_once(attach_ready_models).unwrap();

        assert!(world.get_entity(stale).is_err());
        let viewer = world.resource::<AssetViewer>();
        assert!(viewer.asset().is_none());
        assert!(viewer.is_loading());
        assert!(attached_models(&world).is_empty());
    }

    #[test]
    fn test_unmounted_host_keeps_previous_asset_alive() {
        let mut world = attach_world(mounted_host());
        let first_ticket = world
            .resource_mut::<AssetViewer>()
            .load("a.gltf", AssetFormat::Gltf)
            .unwrap();
        let first = spawn_ready_instance(&mut world, first_ticket, Vec3::ZERO);
        world.run_system_once(attach_ready_models).unwrap();

        world.resource_mut::<SceneHost>().dispose();
        let second_ticket = world
            .resource_mut::<AssetViewer>()
            .load("b.gltf", AssetFormat::Gltf)
            .unwrap();
        let second = spawn_ready_instance(&mut world, second_ticket, Vec3::ZERO);
        world.run_system_once(attach_ready_models).unwrap();

        assert!(world.get_entity(second).is_err());
        assert!(world.get_entity(first).is_ok());
        let viewer = world.resource::<AssetViewer>();
        assert_eq!(viewer.asset().unwrap().root(), first);
        assert!(viewer.error().unwrap().contains("not mounted"));
    }

    #[test]
    fn test_playback_toggle_reaches_players() {
        let mut world = attach_world(mounted_host());
        let node = AnimationNodeIndex::new(1);
        let mut player = AnimationPlayer::default();
        player.play(node).repeat().set_speed(0.0);
        let player = world.spawn(player).id();
        let root = world.spawn(Transform::default()).add_child(player).id();

        let ticket = world
            .resource_mut::<AssetViewer>()
            .load("walker.gltf", AssetFormat::Gltf)
            .unwrap();
        let model = LoadedModel {
            root,
            bounds: None,
            clips: vec![ClipInfo {
                name: Some("walk".into()),
                duration: 1.0,
            }],
        };
        world
            .resource_mut::<AssetViewer>()
            .complete_load(ticket, Ok(model));
        assert!(world.resource_mut::<AssetViewer>().toggle_playback());

        world.run_system_once(sync_animation_playback).unwrap();

        let speed = world
            .get::<AnimationPlayer>(player)
            .unwrap()
            .animation(node)
            .unwrap()
            .speed();
        assert_eq!(speed, 1.0);
    }

    #[test]
    fn test_obj_model_loads_through_asset_server() {
        let mut app = obj_app();
        let stale_ticket = app
            .world_mut()
            .resource_mut::<AssetViewer>()
            .load("models/old.gltf", AssetFormat::Gltf)
            .unwrap();
        let stale = app.world_mut().spawn(ModelRoot { ticket: stale_ticket }).id();
        app.world_mut()
            .resource_mut::<ModelLoadPipeline>()
            .instantiating = Some(InstantiatingModel {
            ticket: stale_ticket,
            root: stale,
            clips: Vec::new(),
            clip_info: Vec::new(),
            ready: false,
        });
        let ticket = app
            .world_mut()
            .resource_mut::<AssetViewer>()
            .load("models/tetrahedron.obj", AssetFormat::Obj)
            .unwrap();

        for _ in 0..500 {
            app.update();
            let pipeline = app.world().resource::<ModelLoadPipeline>();
            let replaced = pipeline
                .instantiating
                .as_ref()
                .is_some_and(|m| m.ticket == ticket);
            if replaced || app.world().resource::<AssetViewer>().error().is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(app.world().resource::<AssetViewer>().error(), None);
        let root = app
            .world()
            .resource::<ModelLoadPipeline>()
            .instantiating
            .as_ref()
            .map(|m| m.root)
            .unwrap();
        assert_eq!(app.world().get::<ModelRoot>(root).unwrap().ticket, ticket);
        assert!(app.world().get::<SceneRoot>(root).is_some());
        assert!(app.world().get_entity(stale).is_err());
    }

    #[test]
    fn test_fbx_request_fails_without_fetching() {
        let mut app = obj_app();
        app.world_mut()
            .resource_mut::<AssetViewer>()
            .load("models/robot.fbx", AssetFormat::Fbx)
            .unwrap();

        app.update();

        let viewer = app.world().resource::<AssetViewer>();
        assert!(!viewer.is_loading());
        assert!(viewer.error().unwrap().contains("fbx"));
        assert!(app.world().resource::<ModelLoadPipeline>().is_idle());
    }
}
