use bevy::prelude::*;

use super::{TerrainMeshData, TerrainVertex};
use crate::{
    cell::CELL_QUADS,
    error::{Result, TerrainError},
    HeightMap,
};

const DETAIL_STEP: f32 = 1. / CELL_QUADS as f32;

/// Expands the grid into two triangles per quad: upper-left, upper-right,
/// bottom-left, then bottom-left, upper-right, bottom-right.
///
/// Tangents and binormals are left zeroed; see
/// [`calculate_terrain_vectors`](super::calculate_terrain_vectors).
pub fn heightmap_to_grid_mesh(terrain: &HeightMap) -> Result<TerrainMeshData> {
    let quads_wide = terrain.width() - 1;
    let quads_deep = terrain.height() - 1;
    let count = quads_wide * quads_deep * 6;

    let mut vertices = Vec::new();
    vertices
        .try_reserve_exact(count)
        .map_err(|_| TerrainError::Allocation { count })?;

    for j in 0..quads_deep {
        let tv2_top = (j % CELL_QUADS) as f32 * DETAIL_STEP;
        let tv2_bottom = tv2_top + DETAIL_STEP;

        for i in 0..quads_wide {
            let tu2_left = (i % CELL_QUADS) as f32 * DETAIL_STEP;
            let tu2_right = tu2_left + DETAIL_STEP;

            let vertex = |column: usize, row: usize, uv: Vec2, detail_uv: Vec2| {
                let sample = terrain.sample(column, row);
                TerrainVertex {
                    position: sample.position,
                    uv,
                    detail_uv,
                    normal: sample.normal,
                    color: sample.color,
                    ..default()
                }
            };

            let upper_left = vertex(i, j, Vec2::new(0., 0.), Vec2::new(tu2_left, tv2_top));
            let upper_right = vertex(i + 1, j, Vec2::new(1., 0.), Vec2::new(tu2_right, tv2_top));
            let bottom_left = vertex(i, j + 1, Vec2::new(0., 1.), Vec2::new(tu2_left, tv2_bottom));
            let bottom_right =
                vertex(i + 1, j + 1, Vec2::new(1., 1.), Vec2::new(tu2_right, tv2_bottom));

            vertices.extend([upper_left, upper_right, bottom_left]);
            vertices.extend([bottom_left, upper_right, bottom_right]);
        }
    }

    Ok(TerrainMeshData {
        vertices,
        quads_wide,
        quads_deep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn mesh(width: usize, height: usize) -> TerrainMeshData {
        let mut map = HeightMap::from_elevations(&Array2::from_shape_fn(
            (height, width),
            |(j, i)| (i + 2 * j) as f32,
        ));
        map.set_coordinates(1.);
        map.calculate_normals();
        heightmap_to_grid_mesh(&map).unwrap()
    }

    #[test]
    fn six_vertices_per_quad() {
        let mesh = mesh(5, 4);

        assert_eq!(mesh.vertices.len(), 4 * 3 * 6);
        assert_eq!(mesh.quads_wide, 4);
        assert_eq!(mesh.quads_deep, 3);
    }

    #[test]
    fn quad_layout_matches_corner_order() {
        let mesh = mesh(5, 4);
        let quad = mesh.quad(1, 2).unwrap();

        // Row 2 sits at z = 3 - 2.
        let upper_left = Vec3::new(1., 5., 1.);
        let upper_right = Vec3::new(2., 6., 1.);
        let bottom_left = Vec3::new(1., 7., 0.);
        let bottom_right = Vec3::new(2., 8., 0.);

        let positions: Vec<_> = quad.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            [upper_left, upper_right, bottom_left, bottom_left, upper_right, bottom_right]
        );

        let uvs: Vec<_> = quad.iter().map(|v| v.uv).collect();
        assert_eq!(
            uvs,
            [
                Vec2::new(0., 0.),
                Vec2::new(1., 0.),
                Vec2::new(0., 1.),
                Vec2::new(0., 1.),
                Vec2::new(1., 0.),
                Vec2::new(1., 1.)
            ]
        );
    }

    #[test]
    fn detail_uv_wraps_every_cell() {
        let mesh = mesh(66, 2);

        let first = mesh.quad(0, 0).unwrap()[0].detail_uv;
        let last_in_cell = mesh.quad(31, 0).unwrap()[5].detail_uv;
        let next_cell = mesh.quad(32, 0).unwrap()[0].detail_uv;
        let past_grid = mesh.quad(64, 0).unwrap()[1].detail_uv;

        assert_eq!(first, Vec2::ZERO);
        assert_eq!(last_in_cell, Vec2::new(1., DETAIL_STEP));
        assert_eq!(next_cell, Vec2::ZERO);
        assert_eq!(past_grid, Vec2::new(DETAIL_STEP, 0.));
    }

    #[test]
    fn quad_out_of_range_is_none() {
        let mesh = mesh(3, 3);

        assert!(mesh.quad(2, 0).is_none());
        assert!(mesh.quad(0, 2).is_none());
    }
}
