//! View frustum planes and containment tests.

use bevy::prelude::{Mat4, Vec3, Vec4};

/// Six planes `(a, b, c, d)` with unit `(a, b, c)`, oriented so that points
/// inside the frustum have a positive signed distance.
///
/// Box tests use one boundary convention: a corner at signed distance `>= 0`
/// keeps the box for that plane, and a plane rejects the box only when all
/// eight corners fall strictly behind it.
#[derive(Debug, PartialEq)]
pub struct Frustum {
    screen_depth: f32,
    planes: [Vec4; 6],
}

impl Frustum {
    /// An empty frustum with its draw distance set. Every test fails until
    /// [`Frustum::derive`] is called.
    pub fn new(screen_depth: f32) -> Self {
        Self {
            screen_depth,
            planes: [Vec4::new(0., 0., 0., -1.); 6],
        }
    }

    pub fn from_planes(planes: [Vec4; 6]) -> Self {
        Self {
            screen_depth: f32::INFINITY,
            planes: planes.map(normalize_plane),
        }
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Rebuilds all six planes from a right-handed, depth `[0, 1]` perspective
    /// projection and a view matrix.
    ///
    /// The projection's far plane is replaced by the configured screen depth
    /// before the planes are extracted.
    pub fn derive(&mut self, projection: Mat4, view: Mat4) {
        let mut projection = projection;

        let z_minimum = projection.w_axis.z / projection.z_axis.z;
        let r = self.screen_depth / (z_minimum - self.screen_depth);
        projection.z_axis.z = r;
        projection.w_axis.z = r * z_minimum;

        let matrix = projection * view;
        let (row0, row1, row2, row3) = (matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3));

        self.planes = [
            // near
            row2,
            // far
            row3 - row2,
            // left
            row3 + row0,
            // right
            row3 - row0,
            // top
            row3 - row1,
            // bottom
            row3 + row1,
        ]
        .map(normalize_plane);
    }

    pub fn check_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| signed_distance(*plane, point) > 0.)
    }

    pub fn check_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| signed_distance(*plane, center) > -radius)
    }

    /// Axis-aligned cube or box given by its center and half extents.
    pub fn check_cube(&self, center: Vec3, half_extents: Vec3) -> bool {
        self.check_box(center - half_extents, center + half_extents)
    }

    /// Axis-aligned box given by its corners.
    pub fn check_box(&self, min: Vec3, max: Vec3) -> bool {
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ];

        self.planes.iter().all(|plane| {
            corners
                .iter()
                .any(|corner| signed_distance(*plane, *corner) >= 0.)
        })
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    plane / plane.truncate().length()
}

fn signed_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.dot(point.extend(1.))
}
