use bevy::prelude::*;

use super::TerrainVertex;

/// Gives every triangle a flat tangent/binormal basis shared by its three
/// vertices.
pub fn calculate_terrain_vectors(vertices: &mut [TerrainVertex]) {
    for face in vertices.chunks_exact_mut(3) {
        let (tangent, binormal) = tangent_binormal(&face[0], &face[1], &face[2]);

        for vertex in face {
            vertex.tangent = tangent;
            vertex.binormal = binormal;
        }
    }
}

/// Solves the texture-space system for one triangle.
///
/// A zero texture-space determinant is not guarded; the result is then
/// non-finite.
pub fn tangent_binormal(
    v1: &TerrainVertex,
    v2: &TerrainVertex,
    v3: &TerrainVertex,
) -> (Vec3, Vec3) {
    let edge1 = v2.position - v1.position;
    let edge2 = v3.position - v1.position;

    let du = Vec2::new(v2.uv.x - v1.uv.x, v3.uv.x - v1.uv.x);
    let dv = Vec2::new(v2.uv.y - v1.uv.y, v3.uv.y - v1.uv.y);

    let den = 1. / (du.x * dv.y - du.y * dv.x);

    let tangent = (dv.y * edge1 - dv.x * edge2) * den;
    let binormal = (du.x * edge2 - du.y * edge1) * den;

    (tangent / tangent.length(), binormal / binormal.length())
}
