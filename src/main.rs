use bevy::prelude::*;

use tilemap3d::camera::{CameraFollowPlugin, FollowCamera};
use tilemap3d::grid::Tilemap3d;
use tilemap3d::locomotion::{CharacterMotor, LocomotionPlugin, MoveInput};
use tilemap3d::logging::LoggingPlugin;
use tilemap3d::overlay::{GridOverlay, OverlayPlugin};
use tilemap3d::painter::PainterPlugin;
use tilemap3d::palette::{TilePalette, TilePrototype};
use tilemap3d::settings::{SettingsPlugin, TilemapSettings, SETTINGS_FILE};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Tilemap3D Sandbox".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(LoggingPlugin)
        .add_plugins(PainterPlugin)
        .add_plugins(OverlayPlugin)
        .add_plugins(CameraFollowPlugin)
        .add_plugins(LocomotionPlugin)
        .add_plugins(SettingsPlugin)
        .add_systems(Startup, setup)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let settings = TilemapSettings::load_or_default(SETTINGS_FILE);

    // Tilemap
    let mut grid = Tilemap3d::default();
    settings.apply_to(&mut grid);
    grid.palette = settings
        .palette_path
        .as_deref()
        .and_then(|path| match TilePalette::load(path) {
            Ok(palette) => {
                info!("Loaded palette '{}' ({} prototypes)", palette.name, palette.len());
                Some(palette)
            }
            Err(err) => {
                warn!("Could not load palette: {err}");
                None
            }
        });
    grid.fallback_prototype = Some(TilePrototype::new("block"));
    commands.spawn((
        Name::new("Tilemap"),
        grid,
        GridOverlay,
        Transform::default(),
        Visibility::default(),
    ));

    // Player
    let player = commands
        .spawn((
            Name::new("Player"),
            CharacterMotor::default(),
            MoveInput::default(),
            Transform::from_xyz(5.0, 0.0, 5.0),
            Mesh3d(meshes.add(Capsule3d::new(0.35, 1.0))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.9, 0.6, 0.2),
                ..default()
            })),
        ))
        .id();

    // Camera
    commands.spawn((
        Name::new("Follow Camera"),
        Camera3d::default(),
        FollowCamera::targeting(player),
        Transform::from_xyz(5.0, 4.0, 12.0).looking_at(Vec3::new(5.0, 0.0, 5.0), Vec3::Y),
    ));

    // Light
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.5, 0.5, 0.0)),
    ));

    info!("Tilemap3D sandbox ready - Tab toggles paint mode");
}
