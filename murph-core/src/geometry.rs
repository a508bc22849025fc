//! Triangle-mesh geometry consumed by collision detection.
//!
//! The physics core does not care where a mesh comes from; it only needs
//! body-local vertices and consistently wound triangles. [`Geometry`] is that
//! seam, [`TriangleMesh`] the stock implementation with a few primitive
//! builders.
//!
//! Winding is counter-clockwise seen from outside, so
//! `(b - a) × (c - a)` points out of the solid.

use std::f64::consts::PI;
use std::fmt;

use crate::error::{PhysicsError, Result};
use crate::math::{Vec3, WorldMatrix};
use crate::types::constants;

/// Three world- or body-space corners.
pub type Triangle = [Vec3; 3];

/// Unit normal of a triangle following its winding.
pub fn triangle_normal(triangle: &Triangle) -> Vec3 {
    (triangle[1] - triangle[0])
        .cross(&(triangle[2] - triangle[0]))
        .normalized()
}

/// Möller–Trumbore ray/triangle test, two-sided.
///
/// `direction` must be unit length so the returned parameter is a distance.
/// Rays (nearly) parallel to the triangle plane report no hit, as do hits
/// behind or at the origin.
pub fn ray_triangle_intersection(origin: Vec3, direction: Vec3, triangle: &Triangle) -> Option<f64> {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < constants::EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - triangle[0];
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_det * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(&q);
    (t > constants::EPSILON).then_some(t)
}

/// One-sided ray/triangle test with a tolerance on the edges.
///
/// Only triangles facing the ray count. The ray is cut with the triangle's
/// plane and the hit accepted if it lies within `tolerance` of every edge,
/// which catches rays that graze past the rim of a face they are about to
/// meet.
pub fn ray_triangle_intersection_within(
    origin: Vec3,
    direction: Vec3,
    triangle: &Triangle,
    tolerance: f64,
) -> Option<f64> {
    let normal = triangle_normal(triangle);
    let facing = direction.dot(&normal);
    if facing.is_nan() || facing >= -constants::EPSILON {
        return None;
    }
    let t = (triangle[0] - origin).dot(&normal) / facing;
    if t <= constants::EPSILON {
        return None;
    }

    let hit = origin + direction * t;
    for k in 0..3 {
        let start = triangle[k];
        let inward = normal.cross(&(triangle[(k + 1) % 3] - start)).normalized();
        if (hit - start).dot(&inward) < -tolerance {
            return None;
        }
    }
    Some(t)
}

// =============================================================================
// Geometry provider
// =============================================================================

/// Source of a body's collision mesh, expressed in body-local coordinates
/// centred on the centre of mass.
pub trait Geometry: fmt::Debug + Send + Sync {
    fn vertices(&self) -> &[Vec3];

    fn indices(&self) -> &[[usize; 3]];

    /// Vertices placed in the world by `world`.
    fn world_vertices(&self, world: &WorldMatrix) -> Vec<Vec3> {
        self.vertices()
            .iter()
            .map(|v| world.transform_point(*v))
            .collect()
    }

    /// Triangles placed in the world by `world`.
    fn world_triangles(&self, world: &WorldMatrix) -> Vec<Triangle> {
        let vertices = self.world_vertices(world);
        self.indices()
            .iter()
            .map(|[a, b, c]| [vertices[*a], vertices[*b], vertices[*c]])
            .collect()
    }

    /// Checks the mesh can be simulated: at least one vertex and every
    /// triangle index in range.
    fn validate(&self) -> Result<()> {
        let vertex_count = self.vertices().len();
        if vertex_count == 0 {
            return Err(PhysicsError::EmptyGeometry);
        }
        for (triangle, corners) in self.indices().iter().enumerate() {
            if let Some(&vertex) = corners.iter().find(|&&i| i >= vertex_count) {
                return Err(PhysicsError::InvalidTriangle {
                    triangle,
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    indices: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Wraps caller-provided data after validating it.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<[usize; 3]>) -> Result<Self> {
        let mesh = Self { vertices, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Axis-aligned box with the given edge lengths.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let corners = [
            (-1.0, -1.0, -1.0),
            (1.0, -1.0, -1.0),
            (1.0, 1.0, -1.0),
            (-1.0, 1.0, -1.0),
            (-1.0, -1.0, 1.0),
            (1.0, -1.0, 1.0),
            (1.0, 1.0, 1.0),
            (-1.0, 1.0, 1.0),
        ];
        let vertices = corners
            .iter()
            .map(|&(x, y, z)| Vec3::new(x, y, z).component_mul(&h))
            .collect();
        let indices = vec![
            [0, 2, 1],
            [0, 3, 2], // -z
            [4, 5, 6],
            [4, 6, 7], // +z
            [0, 1, 5],
            [0, 5, 4], // -y
            [3, 7, 6],
            [3, 6, 2], // +y
            [0, 4, 7],
            [0, 7, 3], // -x
            [1, 2, 6],
            [1, 6, 5], // +x
        ];
        Self { vertices, indices }
    }

    /// Latitude/longitude sphere with a single vertex at each pole.
    ///
    /// `rings` counts latitude bands (clamped to at least 2), `segments`
    /// longitude slices (at least 3).
    pub fn uv_sphere(radius: f64, rings: usize, segments: usize) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let mut vertices = Vec::with_capacity(2 + (rings - 1) * segments);
        vertices.push(Vec3::new(0.0, radius, 0.0));
        for i in 1..rings {
            let theta = PI * i as f64 / rings as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            for j in 0..segments {
                let phi = 2.0 * PI * j as f64 / segments as f64;
                let (sin_p, cos_p) = phi.sin_cos();
                vertices.push(Vec3::new(
                    radius * sin_t * cos_p,
                    radius * cos_t,
                    radius * sin_t * sin_p,
                ));
            }
        }
        let bottom = vertices.len();
        vertices.push(Vec3::new(0.0, -radius, 0.0));

        let ring = |i: usize, j: usize| 1 + (i - 1) * segments + j % segments;
        let mut indices = Vec::with_capacity(2 * rings * segments);
        for j in 0..segments {
            indices.push([0, ring(1, j + 1), ring(1, j)]);
        }
        for i in 1..rings - 1 {
            for j in 0..segments {
                let (a, b) = (ring(i, j), ring(i, j + 1));
                let (c, d) = (ring(i + 1, j), ring(i + 1, j + 1));
                indices.push([a, b, c]);
                indices.push([b, d, c]);
            }
        }
        for j in 0..segments {
            indices.push([ring(rings - 1, j), ring(rings - 1, j + 1), bottom]);
        }
        Self { vertices, indices }
    }

    /// Regular octahedron with its vertices on the axes at distance `radius`.
    pub fn octahedron(radius: f64) -> Self {
        let vertices = vec![
            Vec3::new(radius, 0.0, 0.0),
            Vec3::new(-radius, 0.0, 0.0),
            Vec3::new(0.0, radius, 0.0),
            Vec3::new(0.0, -radius, 0.0),
            Vec3::new(0.0, 0.0, radius),
            Vec3::new(0.0, 0.0, -radius),
        ];
        let mut indices = Vec::with_capacity(8);
        for (x, sx) in [(0, 1.0), (1, -1.0)] {
            for (y, sy) in [(2, 1.0), (3, -1.0)] {
                for (z, sz) in [(4, 1.0), (5, -1.0)] {
                    if sx * sy * sz > 0.0 {
                        indices.push([x, y, z]);
                    } else {
                        indices.push([x, z, y]);
                    }
                }
            }
        }
        Self { vertices, indices }
    }
}

impl Geometry for TriangleMesh {
    fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    fn indices(&self) -> &[[usize; 3]] {
        &self.indices
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    fn assert_outward(mesh: &TriangleMesh) {
        for triangle in mesh.world_triangles(&WorldMatrix::IDENTITY) {
            let centroid = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
            let normal = triangle_normal(&triangle);
            assert!(
                normal.dot(&centroid) > 0.0,
                "Triangle {:?} should face outward, normal {:?}",
                triangle,
                normal
            );
        }
    }

    #[test]
    fn test_cuboid_winding_is_outward() {
        let mesh = TriangleMesh::cuboid(Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.indices().len(), 12);
        assert_outward(&mesh);
    }

    #[test]
    fn test_sphere_winding_is_outward() {
        let mesh = TriangleMesh::uv_sphere(0.5, 8, 12);
        assert_eq!(mesh.vertices().len(), 2 + 7 * 12);
        assert_eq!(mesh.indices().len(), 2 * 12 + 2 * 6 * 12);
        assert!(mesh.validate().is_ok());
        assert_outward(&mesh);
    }

    #[test]
    fn test_octahedron_winding_is_outward() {
        let mesh = TriangleMesh::octahedron(1.0);
        assert_eq!(mesh.indices().len(), 8);
        assert_outward(&mesh);
    }

    #[test]
    fn test_new_rejects_bad_meshes() {
        assert!(matches!(
            TriangleMesh::new(vec![], vec![]),
            Err(PhysicsError::EmptyGeometry)
        ));
        let out_of_range = TriangleMesh::new(vec![Vec3::ZERO; 3], vec![[0, 1, 3]]);
        assert!(matches!(
            out_of_range,
            Err(PhysicsError::InvalidTriangle { vertex: 3, .. })
        ));
    }

    #[test]
    fn test_world_vertices_follow_transform() {
        let mesh = TriangleMesh::cuboid(Vec3::splat(2.0));
        let world = WorldMatrix::new(
            Quat::IDENTITY.to_rotation_matrix(),
            Vec3::new(5.0, 0.0, 0.0),
        );
        let vertices = mesh.world_vertices(&world);
        assert!(vertices.iter().all(|v| (4.0..=6.0).contains(&v.x)));
    }

    #[test]
    fn test_ray_hits_triangle_at_distance() {
        let triangle = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let hit = ray_triangle_intersection(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            &triangle,
        );
        assert!(
            (hit.expect("ray should hit") - 2.0).abs() < 1e-12,
            "Expected distance 2, got {:?}",
            hit
        );
    }

    #[test]
    fn test_ray_misses_parallel_behind_and_outside() {
        let triangle = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let down = Vec3::new(0.0, -1.0, 0.0);
        // parallel to the plane
        assert!(
            ray_triangle_intersection(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), &triangle)
                .is_none()
        );
        // triangle behind the origin
        assert!(ray_triangle_intersection(Vec3::new(0.0, -1.0, 0.0), down, &triangle).is_none());
        // outside the triangle
        assert!(ray_triangle_intersection(Vec3::new(3.0, 1.0, 0.0), down, &triangle).is_none());
    }

    #[test]
    fn test_grazing_ray_hits_within_tolerance_only_from_the_front() {
        // winding makes this triangle face -y
        let triangle = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let up = Vec3::new(0.0, 1.0, 0.0);
        let below = Vec3::new(0.0, -2.0, -1.005);

        assert!(ray_triangle_intersection(below, up, &triangle).is_none());
        let hit = ray_triangle_intersection_within(below, up, &triangle, 0.01);
        assert!((hit.expect("5 mm off the edge") - 2.0).abs() < 1e-12);
        assert!(ray_triangle_intersection_within(below, up, &triangle, 0.001).is_none());

        // back face
        let above = Vec3::new(0.0, 2.0, 0.0);
        assert!(ray_triangle_intersection_within(above, -up, &triangle, 0.01).is_none());
    }
}
