//! Tile palettes.
//!
//! A palette is a named, ordered collection of tile prototypes the painter
//! can cycle through. Palettes are plain data (no engine handles) so they
//! round-trip through RON asset files.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors when loading a palette asset
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("failed to read palette file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse palette RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("palette '{0}' contains no prototypes")]
    Empty(String),
}

/// A placeable tile prototype: the blueprint every placed instance is
/// spawned from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePrototype {
    pub name: String,
    /// Authored orientation, Euler degrees in XYZ order.
    #[serde(default)]
    pub rotation_euler: [f32; 3],
    /// Tint used by the overlay renderer, linear RGB.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    /// Visual cuboid extents in world units.
    #[serde(default = "default_size")]
    pub size: [f32; 3],
}

fn default_color() -> [f32; 3] {
    [0.6, 0.6, 0.6]
}

fn default_size() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl TilePrototype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotation_euler: [0.0; 3],
            color: default_color(),
            size: default_size(),
        }
    }

    /// Authored orientation as a quaternion.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler[0].to_radians(),
            self.rotation_euler[1].to_radians(),
            self.rotation_euler[2].to_radians(),
        )
    }
}

/// Named, ordered collection of prototypes available to paint with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TilePalette {
    pub name: String,
    pub prototypes: Vec<TilePrototype>,
}

impl TilePalette {
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Prototype at `index`, clamped into range. `None` only for an empty palette.
    pub fn get_clamped(&self, index: usize) -> Option<&TilePrototype> {
        if self.prototypes.is_empty() {
            return None;
        }
        self.prototypes.get(index.min(self.prototypes.len() - 1))
    }

    pub fn from_ron_str(source: &str) -> Result<Self, PaletteError> {
        let palette: TilePalette = ron::from_str(source)?;
        if palette.prototypes.is_empty() {
            return Err(PaletteError::Empty(palette.name));
        }
        Ok(palette)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }
}
