//! Sparse 3D tile grid.
//!
//! A fixed-size logical lattice (width x height x depth cells of a
//! configurable cell size) with a sparse coordinate -> tile-entity map.
//! Placement, removal, bulk fill and world<->cell conversion live here;
//! input handling, previews and undo belong to the painter.

use bevy::math::Affine3A;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::palette::{TilePalette, TilePrototype};

/// Smallest legal cell extent per axis. Anything below is clamped up.
pub const MIN_CELL_SIZE: f32 = 0.01;

/// Grid dimensions and cell size. Self-correcting: every constructor and
/// setter clamps dimensions to >= 1 and cell-size components to
/// [`MIN_CELL_SIZE`], so a degenerate configuration is never observable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    width: i32,
    height: i32,
    depth: i32,
    cell_size: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(10, 4, 10, Vec3::ONE)
    }
}

impl GridConfig {
    pub fn new(width: i32, height: i32, depth: i32, cell_size: Vec3) -> Self {
        let mut config = Self {
            width,
            height,
            depth,
            cell_size,
        };
        config.sanitize();
        config
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn set_dimensions(&mut self, width: i32, height: i32, depth: i32) {
        self.width = width;
        self.height = height;
        self.depth = depth;
        self.sanitize();
    }

    pub fn set_cell_size(&mut self, cell_size: Vec3) {
        self.cell_size = cell_size;
        self.sanitize();
    }

    fn sanitize(&mut self) {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        self.depth = self.depth.max(1);
        self.cell_size = self.cell_size.max(Vec3::splat(MIN_CELL_SIZE));
    }

    /// Offset of a cell's anchor point relative to the grid origin.
    pub fn cell_offset(&self, cell: IVec3) -> Vec3 {
        cell.as_vec3() * self.cell_size
    }

    /// World-space anchor of `cell`. No bounds check: callable for any
    /// integer coordinate, including outside the grid (preview, extrapolation).
    pub fn world_position(&self, origin: Vec3, cell: IVec3) -> Vec3 {
        origin + self.cell_offset(cell)
    }

    /// Inverse of [`world_position`](Self::world_position). Lossy many-to-one:
    /// each component is rounded to the nearest integer (f32 `round`, halves
    /// away from zero), so any point within half a cell of a lattice point
    /// maps to that point.
    pub fn world_to_cell(&self, origin: Vec3, world_pos: Vec3) -> IVec3 {
        let local = (world_pos - origin) / self.cell_size;
        IVec3::new(
            local.x.round() as i32,
            local.y.round() as i32,
            local.z.round() as i32,
        )
    }

    /// Sole authority for bounds checks; every mutating grid op consults this.
    pub fn is_inside(&self, cell: IVec3) -> bool {
        cell.x >= 0
            && cell.x < self.width
            && cell.y >= 0
            && cell.y < self.height
            && cell.z >= 0
            && cell.z < self.depth
    }
}

/// A placed tile entity. Carries its cell and the prototype it was
/// instantiated from (the painter's journal restores overwritten tiles
/// from this).
#[derive(Component, Debug, Clone)]
pub struct TileInstance {
    pub cell: IVec3,
    pub prototype: TilePrototype,
}

/// Spawn frame for placed tiles: the parent entity and the transform
/// taking grid-local points into that parent's local space.
///
/// Tiles always occupy `origin + cell * cell_size` in world space no
/// matter which entity they are parented under; the anchor carries the
/// conversion that keeps that true for parents with non-identity
/// transforms.
#[derive(Debug, Clone, Copy)]
pub struct TileAnchor {
    pub parent: Entity,
    pub grid_to_parent: Affine3A,
}

impl TileAnchor {
    /// Parent directly under the grid entity. Grid space and parent
    /// space coincide, so the conversion is the identity.
    pub fn grid_local(grid_entity: Entity) -> Self {
        Self {
            parent: grid_entity,
            grid_to_parent: Affine3A::IDENTITY,
        }
    }

    /// Parent under an arbitrary entity, reframing grid-space positions
    /// into its local space.
    pub fn reframed(
        parent: Entity,
        parent_global: &GlobalTransform,
        grid_global: &GlobalTransform,
    ) -> Self {
        Self {
            parent,
            grid_to_parent: parent_global.affine().inverse() * grid_global.affine(),
        }
    }
}

impl From<Entity> for TileAnchor {
    fn from(grid_entity: Entity) -> Self {
        Self::grid_local(grid_entity)
    }
}

/// Map entry for an occupied cell. The prototype is duplicated here so
/// occupancy lookups stay synchronous while the spawned entity's
/// components are still queued.
#[derive(Debug, Clone)]
struct PlacedTile {
    entity: Entity,
    prototype: TilePrototype,
}

/// The tilemap component. Owns the occupancy map exclusively: every
/// mutation goes through [`place_tile`](Self::place_tile),
/// [`remove_tile`](Self::remove_tile), [`clear`](Self::clear) or
/// [`fill_layer`](Self::fill_layer).
///
/// Shrinking the configured bounds does not evict tiles that end up
/// outside the new bounds; only new placements and removals are
/// bounds-checked.
#[derive(Component, Debug, Default)]
pub struct Tilemap3d {
    pub config: GridConfig,
    /// When true, placed instances keep the prototype's authored rotation;
    /// otherwise `place_rotation` is applied.
    pub use_prototype_rotation: bool,
    /// Euler rotation (degrees) applied to placed tiles when
    /// `use_prototype_rotation` is false.
    pub place_rotation: Vec3,
    /// Where spawned tiles are parented; `None` parents under the grid
    /// entity itself.
    pub tile_parent: Option<Entity>,
    /// Optional palette of paintable prototypes.
    pub palette: Option<TilePalette>,
    /// Fallback prototype when no palette is assigned.
    pub fallback_prototype: Option<TilePrototype>,
    tiles: HashMap<IVec3, PlacedTile>,
}

impl Tilemap3d {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            ..default()
        }
    }

    /// Prototype the painter should use for `index`: the palette entry at
    /// that index (clamped into range), else the fallback prototype.
    pub fn prototype(&self, index: usize) -> Option<&TilePrototype> {
        if let Some(palette) = &self.palette {
            if let Some(prototype) = palette.get_clamped(index) {
                return Some(prototype);
            }
        }
        self.fallback_prototype.as_ref()
    }

    pub fn has_tile(&self, cell: IVec3) -> bool {
        self.tiles.contains_key(&cell)
    }

    pub fn tile_at(&self, cell: IVec3) -> Option<Entity> {
        self.tiles.get(&cell).map(|tile| tile.entity)
    }

    /// Prototype of the tile occupying `cell`. Maintained synchronously
    /// with the map, so it is reliable in the same frame as the placement
    /// while the spawn commands are still queued.
    pub fn prototype_at(&self, cell: IVec3) -> Option<&TilePrototype> {
        self.tiles.get(&cell).map(|tile| &tile.prototype)
    }

    pub fn occupied_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.tiles.keys().copied()
    }

    /// Place a tile at `cell`, overwriting any existing occupant.
    ///
    /// Returns `None` without side effects when `cell` is out of bounds.
    /// The spawned entity is parented under the anchor's parent with its
    /// grid-space position reframed into that parent's local space, so
    /// the tile sits at `origin + cell * cell_size` in world space
    /// regardless of which entity owns it.
    pub fn place_tile(
        &mut self,
        commands: &mut Commands,
        anchor: impl Into<TileAnchor>,
        cell: IVec3,
        prototype: &TilePrototype,
    ) -> Option<Entity> {
        if !self.config.is_inside(cell) {
            return None;
        }
        let anchor = anchor.into();

        // remove existing occupant first
        self.remove_tile(commands, cell);

        let rotation = if self.use_prototype_rotation {
            prototype.rotation()
        } else {
            euler_degrees(self.place_rotation)
        };
        let tile_in_grid =
            Affine3A::from_rotation_translation(rotation, self.config.cell_offset(cell));

        let entity = commands
            .spawn((
                Name::new(format!(
                    "{}_({},{},{})",
                    prototype.name, cell.x, cell.y, cell.z
                )),
                TileInstance {
                    cell,
                    prototype: prototype.clone(),
                },
                Transform::from_matrix(Mat4::from(anchor.grid_to_parent * tile_in_grid)),
            ))
            .set_parent(anchor.parent)
            .id();

        self.tiles.insert(
            cell,
            PlacedTile {
                entity,
                prototype: prototype.clone(),
            },
        );
        Some(entity)
    }

    /// Remove the tile at `cell`. No-op when the cell is unoccupied.
    ///
    /// The despawn itself is deferred by the command queue, but the map
    /// entry is erased synchronously: `has_tile`/`tile_at` report vacancy
    /// as soon as this returns.
    pub fn remove_tile(&mut self, commands: &mut Commands, cell: IVec3) {
        if let Some(tile) = self.tiles.remove(&cell) {
            commands.entity(tile.entity).despawn();
        }
    }

    /// Remove every occupied cell. Idempotent.
    pub fn clear(&mut self, commands: &mut Commands) {
        // snapshot: removing while iterating the live map is unsafe
        let cells: Vec<IVec3> = self.tiles.keys().copied().collect();
        for cell in cells {
            self.remove_tile(commands, cell);
        }
    }

    /// Fill an entire horizontal layer with `prototype`, overwriting
    /// existing tiles. `layer` is clamped into `[0, height - 1]`.
    pub fn fill_layer(
        &mut self,
        commands: &mut Commands,
        anchor: impl Into<TileAnchor>,
        layer: i32,
        prototype: &TilePrototype,
    ) {
        let anchor = anchor.into();
        let layer = layer.clamp(0, self.config.height() - 1);
        for x in 0..self.config.width() {
            for z in 0..self.config.depth() {
                // cells are independent; clamped coordinates are always in bounds
                self.place_tile(commands, anchor, IVec3::new(x, layer, z), prototype);
            }
        }
    }
}

fn euler_degrees(angles: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        angles.x.to_radians(),
        angles.y.to_radians(),
        angles.z.to_radians(),
    )
}
