use bevy::prelude::*;
use constants::pendulum::{BOB_RADIUS, PIVOT_RADIUS, STRING_RADIUS};

use super::context::{SceneObject, SceneObjectKind};
use super::host::SceneHost;
use crate::engine::simulation::pendulum::{PendulumPose, PendulumSimulation};

#[derive(Component)]
pub struct PendulumPivot;

#[derive(Component)]
pub struct PendulumBob;

/// Unit-height cylinder stretched between pivot and bob each frame.
#[derive(Component)]
pub struct PendulumString;

const PIVOT_COLOUR: Color = Color::srgb(0.6, 0.6, 0.6);
const BOB_COLOUR: Color = Color::srgb(0.231, 0.51, 0.965);

/// Transform placing a unit cylinder along the Y axis from `pose.bob` to
/// `pose.pivot`.
pub fn string_transform(pose: &PendulumPose) -> Transform {
    let direction = (pose.pivot - pose.bob).try_normalize().unwrap_or(Vec3::Y);
    Transform {
        translation: pose.string_midpoint(),
        rotation: Quat::from_rotation_arc(Vec3::Y, direction),
        scale: Vec3::new(1.0, pose.string_length(), 1.0),
    }
}

pub fn spawn_pendulum_rig(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut host: ResMut<SceneHost>,
    simulation: Res<PendulumSimulation>,
) {
    let pose = simulation.pose();

    let pivot_mesh = meshes.add(Sphere::new(PIVOT_RADIUS));
    let pivot_material = materials.add(StandardMaterial {
        base_color: PIVOT_COLOUR,
        ..default()
    });
    let pivot = commands
        .spawn((
            Mesh3d(pivot_mesh.clone()),
            MeshMaterial3d(pivot_material.clone()),
            Transform::from_translation(pose.pivot),
            PendulumPivot,
        ))
        .id();

    let bob_mesh = meshes.add(Sphere::new(BOB_RADIUS));
    let bob_material = materials.add(StandardMaterial {
        base_color: BOB_COLOUR,
        ..default()
    });
    let bob = commands
        .spawn((
            Mesh3d(bob_mesh.clone()),
            MeshMaterial3d(bob_material.clone()),
            Transform::from_translation(pose.bob),
            PendulumBob,
        ))
        .id();

    let string_mesh = meshes.add(Cylinder::new(STRING_RADIUS, 1.0));
    let string_material = materials.add(StandardMaterial {
        base_color: Color::BLACK,
        unlit: true,
        ..default()
    });
    let string = commands
        .spawn((
            Mesh3d(string_mesh.clone()),
            MeshMaterial3d(string_material.clone()),
            string_transform(&pose),
            PendulumString,
        ))
        .id();

    let objects = [
        SceneObject::new(pivot, SceneObjectKind::Pivot)
            .with_mesh(pivot_mesh)
            .with_material(pivot_material),
        SceneObject::new(bob, SceneObjectKind::Bob)
            .with_mesh(bob_mesh)
            .with_material(bob_material),
        SceneObject::new(string, SceneObjectKind::String)
            .with_mesh(string_mesh)
            .with_material(string_material),
    ];
    for object in objects {
        let entity = object.entity;
        if !host.register(object) {
            commands.entity(entity).despawn();
        }
    }
    info!("Pendulum rig spawned at {}", pose.pivot);
}

/// Move the bob and string to the simulated angle.
pub fn present_pendulum(
    simulation: Res<PendulumSimulation>,
    mut bobs: Query<&mut Transform, (With<PendulumBob>, Without<PendulumString>)>,
    mut strings: Query<&mut Transform, (With<PendulumString>, Without<PendulumBob>)>,
) {
    if !simulation.is_changed() {
        return;
    }
    let pose = simulation.pose();
    for mut transform in &mut bobs {
        transform.translation = pose.bob;
    }
    for mut transform in &mut strings {
        *transform = string_transform(&pose);
    }
}
