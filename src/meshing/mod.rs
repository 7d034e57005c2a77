mod grid;
mod tangent;

pub use grid::heightmap_to_grid_mesh;
pub use tangent::{calculate_terrain_vectors, tangent_binormal};

use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, MeshVertexAttribute},
        render_resource::{PrimitiveTopology, VertexFormat},
    },
};

/// Second texture coordinate set, tiled once per cell.
pub const ATTRIBUTE_DETAIL_UV: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_DetailUv", 988_540_917, VertexFormat::Float32x2);

pub const ATTRIBUTE_BINORMAL: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_Binormal", 988_540_918, VertexFormat::Float32x3);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub detail_uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub color: Vec3,
}

impl TerrainVertex {
    /// Tangent with bevy's handedness sign in `w`.
    pub fn tangent_with_handedness(&self) -> Vec4 {
        let w = if self.normal.cross(self.tangent).dot(self.binormal) < 0. {
            -1.
        } else {
            1.
        };
        self.tangent.extend(w)
    }
}

/// Fully expanded triangle list, six vertices per grid quad in row-major quad
/// order.
pub struct TerrainMeshData {
    pub vertices: Vec<TerrainVertex>,
    /// Quads per row.
    pub quads_wide: usize,
    /// Quad rows.
    pub quads_deep: usize,
}

impl TerrainMeshData {
    /// The six vertices of quad `(i, j)`.
    pub fn quad(&self, i: usize, j: usize) -> Option<&[TerrainVertex]> {
        if i >= self.quads_wide || j >= self.quads_deep {
            return None;
        }

        let start = (j * self.quads_wide + i) * 6;
        self.vertices.get(start..start + 6)
    }
}

/// Builds a sequentially indexed triangle list mesh from expanded vertices.
pub fn triangle_list_mesh(vertices: &[TerrainVertex]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);

    mesh.insert_attribute(
        Mesh::ATTRIBUTE_POSITION,
        vertices.iter().map(|v| v.position.to_array()).collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        vertices.iter().map(|v| v.normal.to_array()).collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_UV_0,
        vertices.iter().map(|v| v.uv.to_array()).collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_TANGENT,
        vertices
            .iter()
            .map(|v| v.tangent_with_handedness().to_array())
            .collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        Mesh::ATTRIBUTE_COLOR,
        vertices
            .iter()
            .map(|v| v.color.extend(1.).to_array())
            .collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        ATTRIBUTE_DETAIL_UV,
        vertices.iter().map(|v| v.detail_uv.to_array()).collect::<Vec<_>>(),
    );
    mesh.insert_attribute(
        ATTRIBUTE_BINORMAL,
        vertices.iter().map(|v| v.binormal.to_array()).collect::<Vec<_>>(),
    );

    mesh.set_indices(Some(Indices::U32((0..vertices.len() as u32).collect())));

    mesh
}
