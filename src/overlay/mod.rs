//! Grid overlay and simple tile rendering.
//!
//! Draws the grid bounds and ground-plane lines as gizmos for tilemaps
//! carrying a [`GridOverlay`] marker, and attaches cuboid meshes to
//! freshly placed tiles so the sandbox has something to look at. Pure
//! reads of grid state, no mutation of the occupancy map.

use bevy::prelude::*;

use crate::grid::{GridConfig, TileInstance, Tilemap3d};

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (draw_grid_overlay, attach_tile_meshes));
    }
}

/// Marker: draw bounds and ground lines for this tilemap
#[derive(Component, Debug, Default)]
pub struct GridOverlay;

/// Total world-space extent of the configured grid.
pub fn bounds_size(config: &GridConfig) -> Vec3 {
    Vec3::new(
        config.width() as f32 * config.cell_size().x,
        config.height() as f32 * config.cell_size().y,
        config.depth() as f32 * config.cell_size().z,
    )
}

/// Center of the grid bounds in world space.
pub fn bounds_center(config: &GridConfig, origin: Vec3) -> Vec3 {
    origin + bounds_size(config) * 0.5
}

/// Ground-plane grid lines: (width + 1) lines along Z and (depth + 1)
/// lines along X, as world-space segment endpoints.
pub fn ground_lines(config: &GridConfig, origin: Vec3) -> Vec<(Vec3, Vec3)> {
    let size = bounds_size(config);
    let cell = config.cell_size();
    let mut lines = Vec::with_capacity((config.width() + config.depth() + 2) as usize);
    for x in 0..=config.width() {
        let a = origin + Vec3::new(x as f32 * cell.x, 0.0, 0.0);
        lines.push((a, a + Vec3::new(0.0, 0.0, size.z)));
    }
    for z in 0..=config.depth() {
        let a = origin + Vec3::new(0.0, 0.0, z as f32 * cell.z);
        lines.push((a, a + Vec3::new(size.x, 0.0, 0.0)));
    }
    lines
}

fn draw_grid_overlay(
    mut gizmos: Gizmos,
    grids: Query<(&GlobalTransform, &Tilemap3d), With<GridOverlay>>,
) {
    for (transform, grid) in &grids {
        let origin = transform.translation();

        gizmos.cuboid(
            Transform::from_translation(bounds_center(&grid.config, origin))
                .with_scale(bounds_size(&grid.config)),
            Color::srgba(0.0, 0.6, 1.0, 0.15),
        );

        let line_color = Color::srgba(0.0, 0.6, 1.0, 0.35);
        for (a, b) in ground_lines(&grid.config, origin) {
            gizmos.line(a, b, line_color);
        }
    }
}

/// Give newly spawned tile entities a cuboid mesh tinted by their
/// prototype. Runs once per tile (the `Without<Mesh3d>` filter).
fn attach_tile_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    tiles: Query<(Entity, &TileInstance), Without<Mesh3d>>,
) {
    for (entity, instance) in &tiles {
        let [sx, sy, sz] = instance.prototype.size;
        let [r, g, b] = instance.prototype.color;
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Cuboid::new(sx * 0.95, sy * 0.95, sz * 0.95))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                perceptual_roughness: 0.8,
                ..default()
            })),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_size_and_center() {
        let config = GridConfig::new(4, 2, 3, Vec3::new(1.0, 2.0, 1.5));
        assert_eq!(bounds_size(&config), Vec3::new(4.0, 4.0, 4.5));

        let origin = Vec3::new(10.0, 0.0, -5.0);
        assert_eq!(
            bounds_center(&config, origin),
            origin + Vec3::new(2.0, 2.0, 2.25)
        );
    }

    #[test]
    fn test_ground_lines_count() {
        let config = GridConfig::new(3, 1, 5, Vec3::ONE);
        let lines = ground_lines(&config, Vec3::ZERO);
        // (width + 1) + (depth + 1)
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_ground_lines_span_the_grid() {
        let config = GridConfig::new(2, 1, 2, Vec3::splat(2.0));
        let origin = Vec3::new(1.0, 0.0, 1.0);
        let lines = ground_lines(&config, origin);

        // first line runs along Z at the origin's X
        let (a, b) = lines[0];
        assert_eq!(a, origin);
        assert_eq!(b, origin + Vec3::new(0.0, 0.0, 4.0));

        // all lines sit on the ground plane of the grid
        for (a, b) in &lines {
            assert_eq!(a.y, origin.y);
            assert_eq!(b.y, origin.y);
        }
    }
}
