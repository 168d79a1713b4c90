//! Edge case & boundary tests for the tile grid
//!
//! Behavior at system boundaries:
//! - Out-of-bounds placement -> rejected, no side effects
//! - Redundant removal -> silent no-op
//! - Degenerate configuration -> silently corrected, never invalid
//! - Overwrite, fill, clear semantics on small grids

use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;

use tilemap3d::grid::{GridConfig, TileInstance, Tilemap3d, MIN_CELL_SIZE};
use tilemap3d::palette::TilePrototype;

// ============================================================
// Helpers
// ============================================================

fn proto(name: &str) -> TilePrototype {
    TilePrototype::new(name)
}

/// Run `f` with deferred commands against `world`, then flush them.
fn with_commands<R>(
    world: &mut World,
    f: impl FnOnce(&mut Commands) -> R,
) -> R {
    let mut queue = CommandQueue::default();
    let result = {
        let mut commands = Commands::new(&mut queue, world);
        f(&mut commands)
    };
    queue.apply(world);
    result
}

fn spawn_anchor(world: &mut World) -> Entity {
    world.spawn_empty().id()
}

fn live_tiles(world: &mut World) -> usize {
    let mut query = world.query::<&TileInstance>();
    query.iter(world).count()
}

// ============================================================
// 1. Bounds rejection
// ============================================================

#[test]
fn out_of_bounds_placement_is_rejected_on_every_axis() {
    let mut world = World::new();
    let anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::new(GridConfig::new(3, 3, 3, Vec3::ONE));

    let outside = [
        IVec3::new(-1, 0, 0),
        IVec3::new(0, -1, 0),
        IVec3::new(0, 0, -1),
        IVec3::new(3, 0, 0),
        IVec3::new(0, 3, 0),
        IVec3::new(0, 0, 3),
        IVec3::new(i32::MAX, 0, 0),
        IVec3::new(0, i32::MIN, 0),
    ];

    with_commands(&mut world, |commands| {
        for cell in outside {
            assert!(
                grid.place_tile(commands, anchor, cell, &proto("stone")).is_none(),
                "placement at {cell} should be rejected"
            );
        }
    });

    assert_eq!(grid.occupied_count(), 0);
    assert_eq!(live_tiles(&mut world), 0);
}

#[test]
fn out_of_bounds_lookup_is_just_unoccupied() {
    let grid = Tilemap3d::default();
    assert!(!grid.has_tile(IVec3::new(-100, -100, -100)));
    assert!(grid.tile_at(IVec3::new(9999, 0, 0)).is_none());
}

// ============================================================
// 2. Removal semantics
// ============================================================

#[test]
fn removing_empty_cells_repeatedly_is_harmless() {
    let mut world = World::new();
    let _anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::default();

    with_commands(&mut world, |commands| {
        for _ in 0..3 {
            grid.remove_tile(commands, IVec3::new(1, 1, 1));
            grid.remove_tile(commands, IVec3::new(-5, 0, 2));
        }
    });
    assert_eq!(grid.occupied_count(), 0);
}

#[test]
fn remove_then_lookup_in_same_frame_sees_vacancy() {
    let mut world = World::new();
    let anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::default();
    let cell = IVec3::new(0, 0, 0);

    // despawn is deferred until the queue flushes, but the grid must
    // report the cell empty as soon as remove_tile returns
    with_commands(&mut world, |commands| {
        grid.place_tile(commands, anchor, cell, &proto("stone"));
        grid.remove_tile(commands, cell);
        assert!(!grid.has_tile(cell));
        assert!(grid.place_tile(commands, anchor, cell, &proto("grass")).is_some());
    });

    assert_eq!(grid.occupied_count(), 1);
    assert_eq!(live_tiles(&mut world), 1);
}

// ============================================================
// 3. Degenerate configuration
// ============================================================

#[test]
fn zero_and_negative_dimensions_normalize_to_one() {
    let config = GridConfig::new(0, 0, 0, Vec3::ONE);
    assert_eq!((config.width(), config.height(), config.depth()), (1, 1, 1));

    let config = GridConfig::new(i32::MIN, -1, -9999, Vec3::ONE);
    assert_eq!((config.width(), config.height(), config.depth()), (1, 1, 1));
}

#[test]
fn tiny_cell_sizes_clamp_to_minimum() {
    let config = GridConfig::new(2, 2, 2, Vec3::new(0.0, 0.001, -3.0));
    assert_eq!(config.cell_size(), Vec3::splat(MIN_CELL_SIZE));
}

#[test]
fn one_by_one_grid_still_works() {
    let mut world = World::new();
    let anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::new(GridConfig::new(1, 1, 1, Vec3::ONE));

    with_commands(&mut world, |commands| {
        assert!(grid.place_tile(commands, anchor, IVec3::ZERO, &proto("only")).is_some());
        assert!(grid
            .place_tile(commands, anchor, IVec3::new(1, 0, 0), &proto("only"))
            .is_none());
        grid.fill_layer(commands, anchor, 42, &proto("only"));
    });
    assert_eq!(grid.occupied_count(), 1);
}

// ============================================================
// 4. Overwrite / fill / clear scenario
// ============================================================

#[test]
fn fill_remove_clear_scenario_3x1x3() {
    let mut world = World::new();
    let anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::new(GridConfig::new(3, 1, 3, Vec3::ONE));

    with_commands(&mut world, |commands| {
        grid.fill_layer(commands, anchor, 0, &proto("stone"));
    });
    assert_eq!(grid.occupied_count(), 9);
    assert_eq!(live_tiles(&mut world), 9);
    for x in 0..3 {
        for z in 0..3 {
            assert!(grid.has_tile(IVec3::new(x, 0, z)));
        }
    }

    with_commands(&mut world, |commands| {
        grid.remove_tile(commands, IVec3::new(1, 0, 1));
    });
    assert_eq!(grid.occupied_count(), 8);
    assert!(!grid.has_tile(IVec3::new(1, 0, 1)));

    with_commands(&mut world, |commands| {
        grid.clear(commands);
    });
    assert_eq!(grid.occupied_count(), 0);
    assert_eq!(live_tiles(&mut world), 0);
}

#[test]
fn refill_overwrites_every_tile_exactly_once() {
    let mut world = World::new();
    let anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::new(GridConfig::new(4, 2, 4, Vec3::ONE));

    with_commands(&mut world, |commands| {
        grid.fill_layer(commands, anchor, 1, &proto("dirt"));
        grid.fill_layer(commands, anchor, 1, &proto("grass"));
    });

    // still one tile per cell, all replaced
    assert_eq!(grid.occupied_count(), 16);
    assert_eq!(live_tiles(&mut world), 16);
    let mut query = world.query::<&TileInstance>();
    let grass = query
        .iter(&world)
        .filter(|t| t.prototype.name == "grass")
        .count();
    assert_eq!(grass, 16);
}

#[test]
fn clear_on_empty_grid_is_a_noop() {
    let mut world = World::new();
    let _anchor = spawn_anchor(&mut world);
    let mut grid = Tilemap3d::default();

    with_commands(&mut world, |commands| {
        grid.clear(commands);
        grid.clear(commands);
    });
    assert_eq!(grid.occupied_count(), 0);
}

// ============================================================
// 5. Coordinate mapping extremes
// ============================================================

#[test]
fn world_position_accepts_any_coordinate() {
    let config = GridConfig::new(2, 2, 2, Vec3::new(0.5, 0.5, 0.5));
    let origin = Vec3::new(-10.0, 3.0, 10.0);
    let pos = config.world_position(origin, IVec3::new(-1000, 1000, 0));
    assert_eq!(pos, origin + Vec3::new(-500.0, 500.0, 0.0));
}

#[test]
fn world_to_cell_half_cell_neighborhood() {
    let config = GridConfig::new(10, 10, 10, Vec3::ONE);
    let origin = Vec3::ZERO;
    let center = config.world_position(origin, IVec3::new(4, 2, 7));

    // anywhere strictly within half a cell maps back to the same cell
    for offset in [
        Vec3::new(0.49, 0.0, 0.0),
        Vec3::new(-0.49, 0.3, -0.3),
        Vec3::new(0.0, -0.49, 0.49),
    ] {
        assert_eq!(
            config.world_to_cell(origin, center + offset),
            IVec3::new(4, 2, 7)
        );
    }
}
