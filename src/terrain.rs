use std::path::Path;

use bevy::{
    log::{debug, info, warn},
    prelude::*,
};

use crate::{
    cell::{TerrainCell, CELL_QUADS},
    config::TerrainSetup,
    error::{Result, TerrainError},
    frustum::Frustum,
    meshing::{calculate_terrain_vectors, heightmap_to_grid_mesh},
    render::{DrawContext, RenderDevice},
    HeightMap,
};

const PARALLEL_EPSILON: f32 = 1e-4;
const EDGE_TOLERANCE: f32 = 1e-3;

/// Counters reset by [`Terrain::begin_frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub cells_drawn: usize,
    pub cells_culled: usize,
    pub triangles: usize,
}

/// A terrain split into a square grid of cells.
///
/// There is no partially built terrain: construction either returns a
/// complete value or an error, and all intermediate grids are dropped
/// before it returns.
#[derive(Resource)]
pub struct Terrain {
    cells_per_side: usize,
    cells: Vec<TerrainCell>,
    stats: FrameStats,
}

impl Terrain {
    /// Loads the setup file and the files it names, then builds and uploads
    /// the cells.
    pub fn build<D: RenderDevice + ?Sized>(
        device: &mut D,
        setup_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let setup = TerrainSetup::load(setup_path)?;
        check_size(setup.width, setup.height)?;

        debug!("loading height map {}", setup.height_map.display());
        let mut height_map = HeightMap::load_raw(&setup.height_map, setup.width, setup.height)?;

        debug!("loading color map {}", setup.color_map.display());
        height_map.load_color_map(&setup.color_map)?;

        Self::from_height_map(device, height_map, setup.height_scale)
    }

    /// Builds from raw elevations, dividing them by `height_scale`.
    pub fn from_height_map<D: RenderDevice + ?Sized>(
        device: &mut D,
        mut height_map: HeightMap,
        height_scale: f32,
    ) -> Result<Self> {
        let (width, height) = (height_map.width(), height_map.height());
        check_size(width, height)?;

        height_map.set_coordinates(height_scale);
        height_map.calculate_normals();

        let mut model = heightmap_to_grid_mesh(&height_map)?;
        drop(height_map);

        calculate_terrain_vectors(&mut model.vertices);

        let cells_per_side = (width - 1) / CELL_QUADS;
        let mut cells = Vec::with_capacity(cells_per_side * cells_per_side);
        for cell_z in 0..cells_per_side {
            for cell_x in 0..cells_per_side {
                cells.push(TerrainCell::new(device, &model, cell_x, cell_z)?);
            }
        }

        info!(
            "built {}x{} terrain: {} cells, {} vertices",
            width,
            height,
            cells.len(),
            model.vertices.len()
        );

        Ok(Self {
            cells_per_side,
            cells,
            stats: FrameStats::default(),
        })
    }

    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn begin_frame(&mut self) {
        self.stats = FrameStats::default();
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Triangles submitted since the last [`Terrain::begin_frame`].
    pub fn render_count(&self) -> usize {
        self.stats.triangles
    }

    pub fn cells_drawn(&self) -> usize {
        self.stats.cells_drawn
    }

    pub fn cells_culled(&self) -> usize {
        self.stats.cells_culled
    }

    pub fn cell_index_count(&self, cell_id: usize) -> Option<usize> {
        self.cells.get(cell_id).map(TerrainCell::index_count)
    }

    pub fn cell_lines_index_count(&self, cell_id: usize) -> Option<usize> {
        self.cells.get(cell_id).map(TerrainCell::line_index_count)
    }

    /// Draws the cell if its bounds intersect `frustum`, returning whether it
    /// was drawn.
    pub fn render_cell<C: DrawContext + ?Sized>(
        &mut self,
        context: &mut C,
        cell_id: usize,
        frustum: &Frustum,
    ) -> bool {
        let Some(cell) = self.cells.get(cell_id) else {
            warn!("render_cell: no cell {} in a {}-cell terrain", cell_id, self.cells.len());
            return false;
        };

        let bounds = cell.bounds();
        if !frustum.check_box(bounds.min, bounds.max) {
            self.stats.cells_culled += 1;
            return false;
        }

        cell.render(context);
        self.stats.triangles += cell.vertex_count() / 3;
        self.stats.cells_drawn += 1;

        true
    }

    /// Draws the cell's bounding box wireframe.
    pub fn render_cell_lines<C: DrawContext + ?Sized>(&self, context: &mut C, cell_id: usize) {
        match self.cells.get(cell_id) {
            Some(cell) => cell.render_lines(context),
            None => warn!("render_cell_lines: no cell {}", cell_id),
        }
    }

    /// Ground elevation under `(x, z)`, or `None` off the terrain.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let cell = self
            .cells
            .iter()
            .find(|cell| cell.bounds().contains_xz(x, z))?;

        cell.triangles()
            .find_map(|triangle| check_height_of_triangle(x, z, triangle))
    }
}

pub(crate) fn check_size(width: usize, height: usize) -> Result<()> {
    if width != height || width < 2 || (width - 1) % CELL_QUADS != 0 {
        return Err(TerrainError::UnsupportedSize {
            width,
            height,
            quads: CELL_QUADS,
        });
    }

    Ok(())
}

/// Casts a ray straight down through `(x, 0, z)` and returns the height where
/// it crosses the triangle, if it does.
pub fn check_height_of_triangle(x: f32, z: f32, [v0, v1, v2]: [Vec3; 3]) -> Option<f32> {
    let start = Vec3::new(x, 0., z);
    let direction = Vec3::NEG_Y;

    let normal = (v1 - v0).cross(v2 - v0);
    let normal = normal / normal.length();

    let d = -normal.dot(v0);

    let denominator = normal.dot(direction);
    if denominator.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = -(normal.dot(start) + d) / denominator;
    let q = start + direction * t;

    for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
        let edge_normal = (b - a).cross(normal);
        if edge_normal.dot(q - a) > EDGE_TOLERANCE {
            return None;
        }
    }

    Some(q.y)
}
