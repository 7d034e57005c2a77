use bevy::{prelude::*, render::render_resource::PrimitiveTopology};

use crate::{
    error::{Result, TerrainError},
    meshing::{triangle_list_mesh, TerrainMeshData, TerrainVertex},
    render::{DrawContext, RenderDevice},
};

/// Quads along each side of a cell; a cell is 33x33 vertices.
pub const CELL_QUADS: usize = 32;

pub const CELL_VERTICES: usize = CELL_QUADS * CELL_QUADS * 6;

const BOUNDS_COLOR: Vec4 = Vec4::new(1., 0.5, 0., 1.);

/// Exact extent of a cell's vertices. `x` is width, `y` height and `z` depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl CellBounds {
    fn from_vertices(vertices: &[TerrainVertex]) -> Self {
        vertices.iter().fold(
            Self {
                min: Vec3::splat(f32::MAX),
                max: Vec3::splat(f32::MIN),
            },
            |bounds, v| Self {
                min: bounds.min.min(v.position),
                max: bounds.max.max(v.position),
            },
        )
    }

    /// Half-open on both horizontal axes.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x < self.max.x && z >= self.min.z && z < self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.
    }

    /// The twelve box edges as line-list endpoints.
    pub fn edges(&self) -> [Vec3; 24] {
        let (min, max) = (self.min, self.max);

        let (a, b) = (Vec3::new(min.x, min.y, min.z), Vec3::new(max.x, min.y, min.z));
        let (c, d) = (Vec3::new(max.x, min.y, max.z), Vec3::new(min.x, min.y, max.z));
        let (e, f) = (Vec3::new(min.x, max.y, min.z), Vec3::new(max.x, max.y, min.z));
        let (g, h) = (Vec3::new(max.x, max.y, max.z), Vec3::new(min.x, max.y, max.z));

        [
            a, b, b, c, c, d, d, a, // bottom
            e, f, f, g, g, h, h, e, // top
            a, e, b, f, c, g, d, h, // sides
        ]
    }
}

/// A 32x32 quad block of the terrain, the unit of culling and drawing.
pub struct TerrainCell {
    vertices: Vec<TerrainVertex>,
    bounds: CellBounds,
    mesh: Handle<Mesh>,
    lines: Handle<Mesh>,
    line_index_count: usize,
}

impl TerrainCell {
    /// Copies the quads of cell `(cell_x, cell_z)` out of `model` and uploads
    /// them. Vertices on a shared edge are duplicated, not stitched.
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        model: &TerrainMeshData,
        cell_x: usize,
        cell_z: usize,
    ) -> Result<Self> {
        let mut vertices = Vec::new();
        vertices
            .try_reserve_exact(CELL_VERTICES)
            .map_err(|_| TerrainError::Allocation {
                count: CELL_VERTICES,
            })?;

        for j in cell_z * CELL_QUADS..(cell_z + 1) * CELL_QUADS {
            for i in cell_x * CELL_QUADS..(cell_x + 1) * CELL_QUADS {
                let quad = model.quad(i, j).ok_or(TerrainError::CellOutOfBounds {
                    cell_x,
                    cell_z,
                })?;
                vertices.extend_from_slice(quad);
            }
        }

        let bounds = CellBounds::from_vertices(&vertices);
        let edges = bounds.edges();

        let mesh = device.create_buffer(triangle_list_mesh(&vertices));
        let lines = device.create_buffer(bounds_line_mesh(&edges));

        Ok(Self {
            vertices,
            bounds,
            mesh,
            lines,
            line_index_count: edges.len(),
        })
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    pub fn bounds(&self) -> &CellBounds {
        &self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn line_index_count(&self) -> usize {
        self.line_index_count
    }

    pub fn mesh(&self) -> &Handle<Mesh> {
        &self.mesh
    }

    pub fn lines(&self) -> &Handle<Mesh> {
        &self.lines
    }

    /// Triangle corners in storage order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|t| [t[0].position, t[1].position, t[2].position])
    }

    pub fn render<C: DrawContext + ?Sized>(&self, context: &mut C) {
        context.draw_triangle_list(&self.mesh, self.index_count());
    }

    pub fn render_lines<C: DrawContext + ?Sized>(&self, context: &mut C) {
        context.draw_line_list(&self.lines, self.line_index_count);
    }
}

fn bounds_line_mesh(edges: &[Vec3]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::LineList);

    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        edges.iter().map(|p| p.to_array()).collect::<Vec<_>>(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0., 1., 0.]; edges.len()]);
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_COLOR,
        vec![BOUNDS_COLOR.to_array(); edges.len()],
    );

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        meshing::{calculate_terrain_vectors, heightmap_to_grid_mesh},
        render::{testing::MemoryDevice, DrawList},
        HeightMap,
    };
    use ndarray::Array2;

    fn model(size: usize) -> TerrainMeshData {
        let mut map = HeightMap::from_elevations(&Array2::from_shape_fn((size, size), |(j, i)| {
            ((i * 13 + j * 7) % 11) as f32
        }));
        map.set_coordinates(2.);
        map.calculate_normals();
        let mut model = heightmap_to_grid_mesh(&map).unwrap();
        calculate_terrain_vectors(&mut model.vertices);
        model
    }

    #[test]
    fn cell_takes_its_block_of_quads() {
        let model = model(65);
        let mut device = MemoryDevice::default();

        let cell = TerrainCell::new(&mut device, &model, 1, 0).unwrap();

        assert_eq!(cell.vertex_count(), CELL_VERTICES);
        assert_eq!(cell.index_count(), CELL_VERTICES);
        assert_eq!(&cell.vertices()[..6], model.quad(32, 0).unwrap());
        assert_eq!(
            &cell.vertices()[CELL_VERTICES - 6..],
            model.quad(63, 31).unwrap()
        );
        assert_eq!(device.meshes.len(), 2);
    }

    #[test]
    fn bounds_are_exact() {
        let model = model(65);
        let mut device = MemoryDevice::default();

        let cell = TerrainCell::new(&mut device, &model, 0, 1).unwrap();
        let bounds = cell.bounds();

        // Cell row 1 holds grid rows 32..=64, i.e. z in 0..=32.
        assert_eq!(bounds.min.x, 0.);
        assert_eq!(bounds.max.x, 32.);
        assert_eq!(bounds.min.z, 0.);
        assert_eq!(bounds.max.z, 32.);

        let lowest = cell.vertices().iter().map(|v| v.position.y).fold(f32::MAX, f32::min);
        let highest = cell.vertices().iter().map(|v| v.position.y).fold(f32::MIN, f32::max);
        assert_eq!(bounds.min.y, lowest);
        assert_eq!(bounds.max.y, highest);
    }

    #[test]
    fn cell_past_the_mesh_fails() {
        let model = model(33);
        let mut device = MemoryDevice::default();

        let err = TerrainCell::new(&mut device, &model, 1, 0).err().unwrap();

        assert!(matches!(
            err,
            TerrainError::CellOutOfBounds {
                cell_x: 1,
                cell_z: 0
            }
        ));
        assert!(device.meshes.is_empty());
    }

    #[test]
    fn uploads_sequential_indices_and_a_wireframe() {
        let model = model(33);
        let mut device = MemoryDevice::default();

        let cell = TerrainCell::new(&mut device, &model, 0, 0).unwrap();

        let (_, triangles) = &device.meshes[0];
        assert_eq!(triangles.primitive_topology(), PrimitiveTopology::TriangleList);
        assert_eq!(triangles.count_vertices(), CELL_VERTICES);
        assert_eq!(triangles.indices().map(|i| i.len()), Some(CELL_VERTICES));

        let (_, lines) = &device.meshes[1];
        assert_eq!(lines.primitive_topology(), PrimitiveTopology::LineList);
        assert_eq!(lines.count_vertices(), 24);
        assert_eq!(cell.line_index_count(), 24);
    }

    #[test]
    fn render_submits_the_cell_buffers() {
        let model = model(33);
        let mut device = MemoryDevice::default();
        let cell = TerrainCell::new(&mut device, &model, 0, 0).unwrap();
        let mut draws = DrawList::default();

        cell.render(&mut draws);
        cell.render_lines(&mut draws);

        assert_eq!(draws.triangles, vec![(cell.mesh().clone_weak(), CELL_VERTICES)]);
        assert!(draws.draws_lines(cell.lines()));
    }

    #[test]
    fn contains_is_half_open() {
        let bounds = CellBounds {
            min: Vec3::new(0., -1., 32.),
            max: Vec3::new(32., 1., 64.),
        };

        assert!(bounds.contains_xz(0., 32.));
        assert!(bounds.contains_xz(31.99, 63.99));
        assert!(!bounds.contains_xz(32., 40.));
        assert!(!bounds.contains_xz(10., 64.));
        assert_eq!(bounds.center(), Vec3::new(16., 0., 48.));
    }
}
