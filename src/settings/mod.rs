//! Sandbox settings with file-watch hot-reload.
//!
//! Grid dimensions, placement policy and the palette path live in
//! `assets/settings.ron`. A `notify` watcher picks up edits at runtime,
//! validates the file before applying, and keeps the previous settings
//! on a parse failure.

use bevy::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::grid::{GridConfig, Tilemap3d};

pub const SETTINGS_FILE: &str = "assets/settings.ron";

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SettingsReloadState::default())
            .add_event::<SettingsReloadEvent>()
            .add_systems(Startup, setup_settings_watcher)
            .add_systems(Update, (process_settings_changes, apply_reloaded_settings));
    }
}

/// Errors when loading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub cell_size: [f32; 3],
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: 10,
            height: 4,
            depth: 10,
            cell_size: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementSettings {
    pub use_prototype_rotation: bool,
    pub place_rotation: [f32; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilemapSettings {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub placement: PlacementSettings,
    #[serde(default)]
    pub palette_path: Option<String>,
}

impl TilemapSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let source = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&source)?)
    }

    /// Load `path`, falling back to defaults with a warning on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "Could not load settings from {:?} ({err}), using defaults",
                    path.as_ref()
                );
                Self::default()
            }
        }
    }

    /// Grid configuration from the raw settings values. Out-of-range
    /// values are normalized by [`GridConfig`].
    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new(
            self.grid.width,
            self.grid.height,
            self.grid.depth,
            Vec3::from(self.grid.cell_size),
        )
    }

    /// Push these settings onto an existing tilemap. Occupied cells are
    /// untouched; bounds changes apply to new edits only.
    pub fn apply_to(&self, grid: &mut Tilemap3d) {
        grid.config
            .set_dimensions(self.grid.width, self.grid.height, self.grid.depth);
        grid.config.set_cell_size(Vec3::from(self.grid.cell_size));
        grid.use_prototype_rotation = self.placement.use_prototype_rotation;
        grid.place_rotation = Vec3::from(self.placement.place_rotation);
    }
}

/// Hot-reload state tracking
#[derive(Resource, Default)]
pub struct SettingsReloadState {
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_error: Option<String>,
}

/// Fired after the settings file changed on disk
#[derive(Event, Debug, Clone)]
pub struct SettingsReloadEvent {
    pub path: PathBuf,
    /// `None` when the new file failed to parse (previous settings stay).
    pub settings: Option<TilemapSettings>,
    pub error: Option<String>,
}

/// Watcher handle shared across systems
#[derive(Resource)]
struct WatcherResource {
    _watcher: RecommendedWatcher,
    receiver: Arc<Mutex<Receiver<notify::Result<Event>>>>,
}

fn setup_settings_watcher(mut commands: Commands, mut state: ResMut<SettingsReloadState>) {
    let settings_path = PathBuf::from(SETTINGS_FILE);

    if !settings_path.exists() {
        warn!("Settings file not found: {:?}", settings_path);
        state.enabled = false;
        return;
    }

    let (tx, rx): (
        Sender<notify::Result<Event>>,
        Receiver<notify::Result<Event>>,
    ) = channel();

    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(err) => {
            error!("Failed to create settings watcher: {err}");
            state.enabled = false;
            return;
        }
    };

    let watch_dir = settings_path.parent().unwrap_or(Path::new("."));
    if let Err(err) = watcher.watch(watch_dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch settings directory: {err}");
        state.enabled = false;
        return;
    }

    state.enabled = true;
    state.watched_file = Some(settings_path.clone());

    commands.insert_resource(WatcherResource {
        _watcher: watcher,
        receiver: Arc::new(Mutex::new(rx)),
    });

    info!("Settings hot-reload enabled for {:?}", settings_path);
}

fn process_settings_changes(
    watcher: Option<Res<WatcherResource>>,
    mut state: ResMut<SettingsReloadState>,
    mut events: EventWriter<SettingsReloadEvent>,
) {
    let Some(watcher) = watcher else {
        return;
    };
    let Ok(receiver) = watcher.receiver.lock() else {
        return;
    };

    while let Ok(result) = receiver.try_recv() {
        match result {
            Ok(event) => {
                if !is_settings_modify_event(&event, &state.watched_file) {
                    continue;
                }
                let path = state.watched_file.clone().unwrap_or_default();
                match TilemapSettings::load(&path) {
                    Ok(settings) => {
                        state.reload_count += 1;
                        state.last_reload_success = true;
                        state.last_error = None;
                        info!(
                            "Settings reloaded successfully (count: {})",
                            state.reload_count
                        );
                        events.send(SettingsReloadEvent {
                            path,
                            settings: Some(settings),
                            error: None,
                        });
                    }
                    Err(err) => {
                        state.last_reload_success = false;
                        state.last_error = Some(err.to_string());
                        error!("Settings reload failed: {err}");
                        events.send(SettingsReloadEvent {
                            path,
                            settings: None,
                            error: Some(err.to_string()),
                        });
                    }
                }
            }
            Err(err) => {
                warn!("Settings watcher error: {err}");
            }
        }
    }
}

fn apply_reloaded_settings(
    mut events: EventReader<SettingsReloadEvent>,
    mut grids: Query<&mut Tilemap3d>,
) {
    for event in events.read() {
        let Some(settings) = &event.settings else {
            continue;
        };
        for mut grid in &mut grids {
            settings.apply_to(&mut grid);
        }
    }
}

/// True when `event` is a modification (or recreation) of the watched file.
fn is_settings_modify_event(event: &Event, watched_file: &Option<PathBuf>) -> bool {
    let Some(watched) = watched_file else {
        return false;
    };
    let Some(file_name) = watched.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| {
        p.file_name() == Some(file_name)
            && (event.kind.is_modify() || matches!(event.kind, notify::EventKind::Create(_)))
    })
}
