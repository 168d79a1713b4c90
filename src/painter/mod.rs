//! Interactive tile painter.
//!
//! Converts pointer rays into grid cells, previews the hovered cell and
//! applies place/remove/fill/clear edits to the tilemap. Every edit is
//! announced as a [`TileEditEvent`] and recorded in the [`EditJournal`]
//! for undo/redo. The grid itself stays input- and history-free.
//!
//! Controls: Tab toggles paint mode. Left click places, right click
//! removes. `[`/`]` cycle the palette prototype, PageUp/PageDown change
//! the active layer, F fills the layer, Delete clears the grid,
//! Ctrl+Z / Ctrl+Y undo and redo.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::grid::{TileAnchor, Tilemap3d};
use crate::palette::TilePrototype;

pub mod journal;

pub use journal::{CellEdit, EditGroup, EditJournal};

pub struct PainterPlugin;

impl Plugin for PainterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PainterState>()
            .init_resource::<EditJournal>()
            .add_event::<TileEditEvent>()
            .add_systems(
                Update,
                (
                    painter_hotkeys,
                    update_hover_cell,
                    apply_paint_clicks,
                    apply_history,
                    record_edits,
                )
                    .chain(),
            )
            .add_systems(Update, draw_paint_preview.after(update_hover_cell));
    }
}

/// Painter mode and selection state
#[derive(Resource, Debug, Default)]
pub struct PainterState {
    pub paint_mode: bool,
    /// Index into the grid's palette (clamped on resolution).
    pub selected: usize,
    /// Active Y layer painted onto.
    pub layer: i32,
    /// Cell under the cursor this frame, `None` when not painting or the
    /// pointer is outside the grid.
    pub hover_cell: Option<IVec3>,
}

/// An applied edit group, emitted after the grid was mutated
#[derive(Event, Debug, Clone)]
pub struct TileEditEvent {
    pub grid: Entity,
    pub edits: EditGroup,
}

/// Distance along a ray to the intersection with an infinite plane.
/// `None` when the ray is parallel to the plane or points away from it.
pub fn ray_plane_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    let denom = plane_normal.dot(ray_dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = plane_normal.dot(plane_point - ray_origin) / denom;
    (t >= 0.0).then_some(t)
}

/// Spawn frame for a grid's tiles. Falls back to parenting under the
/// grid entity when the configured parent has no transform.
fn resolve_anchor(
    grid: &Tilemap3d,
    grid_entity: Entity,
    grid_global: &GlobalTransform,
    transforms: &Query<&GlobalTransform>,
) -> TileAnchor {
    match grid.tile_parent {
        Some(parent) => transforms
            .get(parent)
            .map(|parent_global| TileAnchor::reframed(parent, parent_global, grid_global))
            .unwrap_or_else(|_| TileAnchor::grid_local(grid_entity)),
        None => TileAnchor::grid_local(grid_entity),
    }
}

/// Replay an edit group through the grid. `undo` applies the before
/// states, otherwise the after states.
pub(crate) fn apply_edit_group(
    grid: &mut Tilemap3d,
    commands: &mut Commands,
    anchor: impl Into<TileAnchor>,
    group: &[CellEdit],
    undo: bool,
) {
    let anchor = anchor.into();
    for edit in group {
        let desired = if undo { &edit.before } else { &edit.after };
        match desired {
            Some(prototype) => {
                grid.place_tile(commands, anchor, edit.cell, prototype);
            }
            None => grid.remove_tile(commands, edit.cell),
        }
    }
}

fn painter_hotkeys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut state: ResMut<PainterState>,
    mut grids: Query<(Entity, &GlobalTransform, &mut Tilemap3d)>,
    transforms: Query<&GlobalTransform>,
    mut commands: Commands,
    mut edits: EventWriter<TileEditEvent>,
) {
    let Ok((grid_entity, grid_global, mut grid)) = grids.get_single_mut() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::Tab) {
        state.paint_mode = !state.paint_mode;
        info!(
            "Paint mode {}",
            if state.paint_mode { "on" } else { "off" }
        );
    }
    if !state.paint_mode {
        return;
    }

    if keyboard.just_pressed(KeyCode::BracketLeft) {
        state.selected = state.selected.saturating_sub(1);
    }
    if keyboard.just_pressed(KeyCode::BracketRight) {
        state.selected += 1;
    }
    if keyboard.just_pressed(KeyCode::PageUp) {
        state.layer = (state.layer + 1).clamp(0, grid.config.height() - 1);
    }
    if keyboard.just_pressed(KeyCode::PageDown) {
        state.layer = (state.layer - 1).clamp(0, grid.config.height() - 1);
    }

    if keyboard.just_pressed(KeyCode::KeyF) {
        match grid.prototype(state.selected).cloned() {
            Some(prototype) => {
                let mut group = Vec::new();
                for x in 0..grid.config.width() {
                    for z in 0..grid.config.depth() {
                        let cell =
                            IVec3::new(x, state.layer.clamp(0, grid.config.height() - 1), z);
                        group.push(CellEdit {
                            cell,
                            before: grid.prototype_at(cell).cloned(),
                            after: Some(prototype.clone()),
                        });
                    }
                }
                let anchor = resolve_anchor(&grid, grid_entity, grid_global, &transforms);
                grid.fill_layer(&mut commands, anchor, state.layer, &prototype);
                info!("Filled layer {} with '{}'", state.layer, prototype.name);
                edits.send(TileEditEvent {
                    grid: grid_entity,
                    edits: group,
                });
            }
            None => warn!("Fill layer: no prototype assigned (palette or fallback)"),
        }
    }

    if keyboard.just_pressed(KeyCode::Delete) {
        let group: EditGroup = grid
            .occupied_cells()
            .map(|cell| CellEdit {
                cell,
                before: grid.prototype_at(cell).cloned(),
                after: None,
            })
            .collect();
        grid.clear(&mut commands);
        info!("Cleared {} tiles", group.len());
        edits.send(TileEditEvent {
            grid: grid_entity,
            edits: group,
        });
    }
}

fn update_hover_cell(
    mut state: ResMut<PainterState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    grids: Query<(&GlobalTransform, &Tilemap3d), Without<Camera3d>>,
) {
    state.hover_cell = None;
    if !state.paint_mode {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };
    let Ok((grid_transform, grid)) = grids.get_single() else {
        return;
    };

    let origin = grid_transform.translation();
    let plane_point = origin + Vec3::Y * (state.layer as f32 * grid.config.cell_size().y);
    let Some(t) = ray_plane_intersection(ray.origin, *ray.direction, plane_point, Vec3::Y) else {
        return;
    };
    let hit = ray.origin + *ray.direction * t;

    let projected = grid.config.world_to_cell(origin, hit);
    let cell = IVec3::new(projected.x, state.layer, projected.z);
    if grid.config.is_inside(cell) {
        state.hover_cell = Some(cell);
    }
}

fn apply_paint_clicks(
    mouse: Res<ButtonInput<MouseButton>>,
    state: Res<PainterState>,
    mut grids: Query<(Entity, &GlobalTransform, &mut Tilemap3d)>,
    transforms: Query<&GlobalTransform>,
    mut commands: Commands,
    mut edits: EventWriter<TileEditEvent>,
) {
    if !state.paint_mode {
        return;
    }
    let Some(cell) = state.hover_cell else {
        return;
    };
    let Ok((grid_entity, grid_global, mut grid)) = grids.get_single_mut() else {
        return;
    };

    if mouse.just_pressed(MouseButton::Left) {
        let Some(prototype) = grid.prototype(state.selected).cloned() else {
            warn!("Place tile: no prototype assigned (palette or fallback)");
            return;
        };
        let before = grid.prototype_at(cell).cloned();
        let anchor = resolve_anchor(&grid, grid_entity, grid_global, &transforms);
        if grid
            .place_tile(&mut commands, anchor, cell, &prototype)
            .is_some()
        {
            debug!("Placed '{}' at {}", prototype.name, cell);
            edits.send(TileEditEvent {
                grid: grid_entity,
                edits: vec![CellEdit {
                    cell,
                    before,
                    after: Some(prototype),
                }],
            });
        }
    } else if mouse.just_pressed(MouseButton::Right) {
        let Some(before) = grid.prototype_at(cell).cloned() else {
            return;
        };
        grid.remove_tile(&mut commands, cell);
        debug!("Removed tile at {}", cell);
        edits.send(TileEditEvent {
            grid: grid_entity,
            edits: vec![CellEdit {
                cell,
                before: Some(before),
                after: None,
            }],
        });
    }
}

fn apply_history(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut journal: ResMut<EditJournal>,
    mut grids: Query<(Entity, &GlobalTransform, &mut Tilemap3d)>,
    transforms: Query<&GlobalTransform>,
    mut commands: Commands,
) {
    let ctrl =
        keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if !ctrl {
        return;
    }
    let Ok((grid_entity, grid_global, mut grid)) = grids.get_single_mut() else {
        return;
    };
    let anchor = resolve_anchor(&grid, grid_entity, grid_global, &transforms);

    if keyboard.just_pressed(KeyCode::KeyZ) {
        if let Some(group) = journal.undo() {
            apply_edit_group(&mut grid, &mut commands, anchor, &group, true);
            info!("Undo ({} cells)", group.len());
        }
    } else if keyboard.just_pressed(KeyCode::KeyY) {
        if let Some(group) = journal.redo() {
            apply_edit_group(&mut grid, &mut commands, anchor, &group, false);
            info!("Redo ({} cells)", group.len());
        }
    }
}

fn record_edits(mut events: EventReader<TileEditEvent>, mut journal: ResMut<EditJournal>) {
    for event in events.read() {
        journal.push(event.edits.clone());
    }
}

fn draw_paint_preview(
    mut gizmos: Gizmos,
    state: Res<PainterState>,
    grids: Query<(&GlobalTransform, &Tilemap3d)>,
) {
    if !state.paint_mode {
        return;
    }
    let Some(cell) = state.hover_cell else {
        return;
    };
    let Ok((grid_transform, grid)) = grids.get_single() else {
        return;
    };

    let rotation = if grid.use_prototype_rotation {
        grid.prototype(state.selected)
            .map(|p| p.rotation())
            .unwrap_or(Quat::IDENTITY)
    } else {
        Quat::from_euler(
            EulerRot::XYZ,
            grid.place_rotation.x.to_radians(),
            grid.place_rotation.y.to_radians(),
            grid.place_rotation.z.to_radians(),
        )
    };

    let center = grid
        .config
        .world_position(grid_transform.translation(), cell);
    gizmos.cuboid(
        Transform::from_translation(center)
            .with_rotation(rotation)
            .with_scale(grid.config.cell_size()),
        Color::srgba(0.0, 1.0, 0.0, 0.35),
    );
}
