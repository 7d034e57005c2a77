use bevy::{
    log::{error, info},
    prelude::*,
    render::view::{NoFrustumCulling, VisibilitySystems},
    transform::TransformSystem,
};

use crate::{config::TerrainSettings, frustum::Frustum, render::DrawList, terrain::Terrain};

/// Builds the terrain at startup and culls its cells against the
/// [`TerrainViewer`] camera every frame.
#[derive(Default)]
pub struct TerrainPlugin {
    pub settings: TerrainSettings,
}

/// Marks the camera that drives culling and ground following.
#[derive(Component, Default)]
pub struct TerrainViewer;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainPart {
    Cell,
    Bounds,
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .add_startup_system(spawn_terrain)
            .add_system(toggle_terrain_debug)
            .add_system(
                follow_ground
                    .in_base_set(CoreSet::PostUpdate)
                    .before(TransformSystem::TransformPropagate),
            )
            .add_system(
                cull_terrain_cells
                    .in_base_set(CoreSet::PostUpdate)
                    .after(TransformSystem::TransformPropagate)
                    .before(VisibilitySystems::VisibilityPropagate),
            )
            .add_system(
                log_frame_stats
                    .in_base_set(CoreSet::PostUpdate)
                    .after(cull_terrain_cells),
            );
    }
}

fn spawn_terrain(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<TerrainSettings>,
) {
    let terrain = match Terrain::build(&mut *meshes, &settings.setup_path) {
        Ok(terrain) => terrain,
        Err(err) => {
            error!(
                "terrain from {} is unusable: {}",
                settings.setup_path.display(),
                err
            );
            return;
        }
    };

    let ground = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.9,
        ..default()
    });
    let outline = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });

    for (id, cell) in terrain.cells().iter().enumerate() {
        commands.spawn((
            PbrBundle {
                mesh: cell.mesh().clone(),
                material: ground.clone(),
                ..default()
            },
            NoFrustumCulling,
            TerrainPart::Cell,
            Name::new(format!("terrain cell {id}")),
        ));
        commands.spawn((
            PbrBundle {
                mesh: cell.lines().clone(),
                material: outline.clone(),
                visibility: Visibility::Hidden,
                ..default()
            },
            NoFrustumCulling,
            TerrainPart::Bounds,
            Name::new(format!("terrain cell {id} bounds")),
        ));
    }

    commands.insert_resource(terrain);
}

fn toggle_terrain_debug(keys: Res<Input<KeyCode>>, mut settings: ResMut<TerrainSettings>) {
    if keys.just_pressed(KeyCode::B) {
        settings.show_cell_bounds = !settings.show_cell_bounds;
        info!("cell bounds: {}", settings.show_cell_bounds);
    }
    if keys.just_pressed(KeyCode::G) {
        settings.lock_to_ground = !settings.lock_to_ground;
        info!("ground lock: {}", settings.lock_to_ground);
    }
}

fn follow_ground(
    terrain: Option<Res<Terrain>>,
    settings: Res<TerrainSettings>,
    mut viewers: Query<&mut Transform, With<TerrainViewer>>,
) {
    let Some(terrain) = terrain else { return };
    if !settings.lock_to_ground {
        return;
    }

    for mut transform in &mut viewers {
        let position = transform.translation;
        if let Some(height) = terrain.height_at(position.x, position.z) {
            transform.translation.y = height + settings.eye_height;
        }
    }
}

fn cull_terrain_cells(
    terrain: Option<ResMut<Terrain>>,
    settings: Res<TerrainSettings>,
    mut draws: Local<DrawList>,
    viewers: Query<(&Camera, &Projection, &GlobalTransform), With<TerrainViewer>>,
    mut parts: Query<(&Handle<Mesh>, &TerrainPart, &mut Visibility)>,
) {
    let Some(mut terrain) = terrain else { return };
    let Some((projection, transform)) = viewers
        .iter()
        .find(|(camera, ..)| camera.is_active)
        .map(|(_, projection, transform)| (projection, transform))
    else {
        return;
    };
    let Projection::Perspective(perspective) = projection else {
        return;
    };

    let mut frustum = Frustum::new(settings.screen_depth);
    frustum.derive(
        Mat4::perspective_rh(
            perspective.fov,
            perspective.aspect_ratio,
            perspective.near,
            perspective.far,
        ),
        transform.compute_matrix().inverse(),
    );

    draws.clear();
    terrain.begin_frame();
    for cell_id in 0..terrain.cell_count() {
        if terrain.render_cell(&mut *draws, cell_id, &frustum) && settings.show_cell_bounds {
            terrain.render_cell_lines(&mut *draws, cell_id);
        }
    }

    for (mesh, part, mut visibility) in &mut parts {
        let drawn = match part {
            TerrainPart::Cell => draws.draws_triangles(mesh),
            TerrainPart::Bounds => draws.draws_lines(mesh),
        };
        let target = if drawn {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *visibility != target {
            *visibility = target;
        }
    }
}

fn log_frame_stats(
    time: Res<Time>,
    mut elapsed: Local<f32>,
    terrain: Option<Res<Terrain>>,
    settings: Res<TerrainSettings>,
) {
    let (Some(terrain), Some(period)) = (terrain, settings.log_frame_stats) else {
        return;
    };

    *elapsed += time.delta_seconds();
    if *elapsed < period {
        return;
    }
    *elapsed = 0.;

    let stats = terrain.stats();
    info!(
        "terrain cells: {} total, {} drawn, {} culled; {} triangles",
        terrain.cell_count(),
        stats.cells_drawn,
        stats.cells_culled,
        stats.triangles
    );
}
