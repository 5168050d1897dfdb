//! Flat reference grid shown under loaded models.
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;

use super::context::{SceneObject, SceneObjectKind};
use super::host::SceneHost;

#[derive(Component)]
pub struct GroundGrid;

/// Line-list mesh of a square grid on the XZ plane, centred on the origin.
pub fn grid_mesh(size: f32, divisions: u32) -> Mesh {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        // Line parallel to X
        positions.push([-half, 0.0, offset]);
        positions.push([half, 0.0, offset]);
        // Line parallel to Z
        positions.push([offset, 0.0, -half]);
        positions.push([offset, 0.0, half]);
    }

    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
}

/// Spawn the grid helper and hand it to the host.
pub fn spawn_grid_helper(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    host: &mut SceneHost,
    size: f32,
    divisions: u32,
) {
    let mesh = meshes.add(grid_mesh(size, divisions));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.53, 0.53, 0.53),
        unlit: true,
        ..default()
    });

    let entity = commands
        .spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::default(),
            GroundGrid,
        ))
        .id();

    let object = SceneObject::new(entity, SceneObjectKind::Grid)
        .with_mesh(mesh)
        .with_material(material);
    if !host.register(object) {
        commands.entity(entity).despawn();
    }
}
