//! Tilemap3D - Sparse 3D tile grid for Bevy
//!
//! This crate provides a small tile-placement toolkit:
//! - Sparse 3D tile grid (placement, removal, bulk fill, world<->cell mapping)
//! - Tile palettes loaded from RON assets
//! - Interactive painter with hover preview and undo/redo journal
//! - Grid bounds/line overlay rendering
//! - Smooth camera follow rig and character locomotion controller
//! - Settings file with hot-reload

pub mod camera;
pub mod grid;
pub mod locomotion;
pub mod logging;
pub mod overlay;
pub mod painter;
pub mod palette;
pub mod settings;
pub mod smoothing;
