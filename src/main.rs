use std::path::PathBuf;

use bevy::{
    log::{Level, LogPlugin},
    prelude::*,
};
use bevy_atmosphere::prelude::*;
use bevy_fly_camera::{FlyCamera, FlyCameraPlugin};
use cell_terrain::{config::TerrainSettings, TerrainPlugin, TerrainViewer};

fn main() {
    let mut settings = TerrainSettings::default();
    let mut verbose = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verbose" => verbose = true,
            "--bounds" => settings.show_cell_bounds = true,
            "--ground" => settings.lock_to_ground = true,
            path => settings.setup_path = PathBuf::from(path),
        }
    }

    let filter = if verbose {
        "wgpu=error,cell_terrain=debug"
    } else {
        "wgpu=error,cell_terrain=info"
    };

    App::new()
        .add_plugins(DefaultPlugins.set(LogPlugin {
            level: Level::INFO,
            filter: filter.into(),
        }))
        .add_plugin(AtmospherePlugin)
        .add_plugin(FlyCameraPlugin)
        .add_plugin(TerrainPlugin { settings })
        .add_startup_system(add_camera)
        .add_startup_system(add_lights)
        .run();
}

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(128., 60., 300.),
            ..default()
        },
        FlyCamera::default(),
        AtmosphereCamera::default(),
        TerrainViewer,
    ));
}

fn add_lights(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::ORANGE_RED,
        brightness: 0.02,
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 10000.,
            shadows_enabled: false,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_rotation_x(-0.25 * std::f32::consts::PI)),
        ..default()
    });
}
