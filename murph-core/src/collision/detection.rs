//! Narrow phase: vertex-to-face penetration between two meshes.
//!
//! For a candidate pair the test only looks inside the overlap of their
//! boxes. Every vertex of one body found there is checked against every
//! triangle of the other body found there:
//!
//! ```text
//!        centre
//!          ●
//!           \        ray from the centre through the vertex
//!            \
//!   ──────────╳──────  face of the other body, hit at distance d
//!              \
//!               ○    vertex, |centre → vertex| = L
//!
//!   penetration = L - d     (> 0: vertex is past the face)
//! ```
//!
//! A ray that misses every face is cast again, accepting front faces within
//! `epsilon` of their edges, so equal faces meeting rim to rim still report
//! a near contact.
//!
//! The test runs both ways and concatenates the results. All normals are
//! oriented from A toward B, the direction in which B is pushed away from A.

use crate::aabb::Aabb;
use crate::body::RigidBody;
use crate::geometry::{
    ray_triangle_intersection, ray_triangle_intersection_within, triangle_normal, Triangle,
};
use crate::math::Vec3;

/// Contact set between bodies A and B. All vectors have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct PenetrationReport {
    /// Deepest penetration over every vertex ray that hit a face, reported
    /// or not. `-inf` when no ray hit anything.
    pub max_penetration: f64,
    /// Contact points on (or inside) A, world space.
    pub points_a: Vec<Vec3>,
    /// Contact points on (or inside) B, world space.
    pub points_b: Vec<Vec3>,
    /// Unit contact normals, from A toward B.
    pub normals: Vec<Vec3>,
    pub penetration_depths: Vec<f64>,
}

impl PenetrationReport {
    pub fn empty() -> Self {
        Self {
            max_penetration: f64::NEG_INFINITY,
            points_a: Vec::new(),
            points_b: Vec::new(),
            normals: Vec::new(),
            penetration_depths: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.penetration_depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.penetration_depths.is_empty()
    }

    /// Index of the deepest reported contact.
    pub fn deepest(&self) -> Option<usize> {
        self.penetration_depths
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    pub(crate) fn push(&mut self, point_a: Vec3, point_b: Vec3, normal: Vec3, depth: f64) {
        self.points_a.push(point_a);
        self.points_b.push(point_b);
        self.normals.push(normal);
        self.penetration_depths.push(depth);
    }
}

/// Full two-way penetration test of `a` against `b` at their tentative
/// transforms, restricted to `overlap`.
///
/// Pure: neither body is modified.
pub fn test_interpenetration(
    a: &RigidBody,
    b: &RigidBody,
    overlap: &Aabb,
    epsilon: f64,
) -> PenetrationReport {
    let a_into_b = vertex_to_face(a, b, overlap, epsilon);
    let b_into_a = vertex_to_face(b, a, overlap, epsilon);

    let mut report = PenetrationReport::empty();
    report.max_penetration = a_into_b.max_penetration.max(b_into_a.max_penetration);

    // B's outward face normals point toward A; flip them
    for i in 0..a_into_b.len() {
        report.push(
            a_into_b.points_a[i],
            a_into_b.points_b[i],
            -a_into_b.normals[i],
            a_into_b.penetration_depths[i],
        );
    }
    // A's outward face normals already point toward B; swap the point roles
    for i in 0..b_into_a.len() {
        report.push(
            b_into_a.points_b[i],
            b_into_a.points_a[i],
            b_into_a.normals[i],
            b_into_a.penetration_depths[i],
        );
    }
    report
}

/// One-way test: vertices of `vertex_body` against faces of `face_body`.
///
/// In the returned report `points_a` are vertices of `vertex_body`,
/// `points_b` the ray hits on `face_body` and `normals` the outward normals
/// of the hit faces.
pub fn vertex_to_face(
    vertex_body: &RigidBody,
    face_body: &RigidBody,
    overlap: &Aabb,
    epsilon: f64,
) -> PenetrationReport {
    let mut report = PenetrationReport::empty();

    let vertices = unique_vertices_inside(vertex_body, overlap);
    if vertices.is_empty() {
        return report;
    }
    let triangles = triangles_touching(face_body, overlap);
    if triangles.is_empty() {
        return report;
    }

    let origin = vertex_body.next().position;
    for vertex in vertices {
        let to_vertex = vertex - origin;
        let length = to_vertex.magnitude();
        if length < epsilon {
            continue;
        }
        let direction = to_vertex / length;

        let deepest = deepest_hit(&triangles, length, |t| {
            ray_triangle_intersection(origin, direction, t)
        })
        .or_else(|| {
            // equal faces meeting edge to edge: the ray slips past the rim
            deepest_hit(&triangles, length, |t| {
                ray_triangle_intersection_within(origin, direction, t, epsilon)
            })
        });

        if let Some((penetration, distance, triangle)) = deepest {
            report.max_penetration = report.max_penetration.max(penetration);
            if penetration > -epsilon {
                let hit = origin + direction * distance;
                report.push(vertex, hit, triangle_normal(triangle), penetration);
            }
        }
    }
    report
}

/// Deepest hit of one vertex ray as `(penetration, distance, triangle)`.
fn deepest_hit<'t>(
    triangles: &'t [Triangle],
    length: f64,
    cast: impl Fn(&Triangle) -> Option<f64>,
) -> Option<(f64, f64, &'t Triangle)> {
    let mut deepest: Option<(f64, f64, &Triangle)> = None;
    for triangle in triangles {
        let Some(distance) = cast(triangle) else {
            continue;
        };
        let penetration = length - distance;
        if deepest.map_or(true, |(best, _, _)| penetration > best) {
            deepest = Some((penetration, distance, triangle));
        }
    }
    deepest
}

/// World-space vertices of `body` (tentative transform) inside `region`,
/// exact duplicates removed.
fn unique_vertices_inside(body: &RigidBody, region: &Aabb) -> Vec<Vec3> {
    let mut out: Vec<Vec3> = Vec::new();
    for vertex in body.geometry().world_vertices(body.next_world_matrix()) {
        if region.contains_point(&vertex) && !out.contains(&vertex) {
            out.push(vertex);
        }
    }
    out
}

/// World-space triangles of `body` (tentative transform) whose box meets `region`.
fn triangles_touching(body: &RigidBody, region: &Aabb) -> Vec<Triangle> {
    body.geometry()
        .world_triangles(body.next_world_matrix())
        .into_iter()
        .filter(|t| Aabb::from_triangle(t).intersects(region))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::types::Material;

    const EPS: f64 = 0.01;

    fn ground() -> RigidBody {
        let mut body =
            factory::cuboid(Vec3::new(20.0, 1.0, 20.0), 0.0, Material::default()).expect("ground");
        body.set_initial_position(Vec3::new(0.0, -0.5, 0.0));
        body
    }

    fn cube_at(position: Vec3) -> RigidBody {
        let mut body = factory::cuboid(Vec3::splat(1.0), 1.0, Material::default()).expect("cube");
        body.set_initial_position(position);
        body
    }

    fn overlap(a: &RigidBody, b: &RigidBody) -> Aabb {
        a.next()
            .aabb
            .intersection_overlap(&b.next().aabb)
            .expect("boxes overlap")
    }

    #[test]
    fn test_sunken_cube_reports_four_corners() {
        // bottom face 0.05 below the ground surface
        let cube = cube_at(Vec3::new(0.3, 0.45, -0.2));
        let floor = ground();
        let report = test_interpenetration(&cube, &floor, &overlap(&cube, &floor), EPS);

        assert_eq!(report.len(), 4, "Expected the four bottom corners");
        // along the corner diagonal the depth is sqrt(3) times the vertical one
        let expected = 0.05 * 3f64.sqrt();
        assert!(
            (report.max_penetration - expected).abs() < 1e-9,
            "Expected {}, got {}",
            expected,
            report.max_penetration
        );
        for normal in &report.normals {
            assert!((normal.y + 1.0).abs() < 1e-12, "Normal should point from A into B");
        }
        for point in &report.points_b {
            assert!(point.y.abs() < 1e-9, "Hit points lie on the ground surface");
        }
    }

    #[test]
    fn test_hovering_cube_is_reported_as_near_contact() {
        // 2 mm above the ground: inside the padded boxes, within -epsilon
        let cube = cube_at(Vec3::new(0.3, 0.502, -0.2));
        let floor = ground();
        let report = test_interpenetration(&cube, &floor, &overlap(&cube, &floor), EPS);

        assert_eq!(report.len(), 4);
        assert!(report.max_penetration < 0.0);
        assert!(report.max_penetration > -EPS);
    }

    #[test]
    fn test_swapped_order_flips_normals() {
        let cube = cube_at(Vec3::new(0.3, 0.45, -0.2));
        let floor = ground();
        let region = overlap(&cube, &floor);
        let forward = test_interpenetration(&cube, &floor, &region, EPS);
        let backward = test_interpenetration(&floor, &cube, &region, EPS);

        assert_eq!(forward.len(), backward.len());
        assert!((forward.max_penetration - backward.max_penetration).abs() < 1e-12);
        for normal in &backward.normals {
            assert!((normal.y - 1.0).abs() < 1e-12);
        }
        // points on A of one are points on B of the other
        for point in &backward.points_b {
            assert!(forward.points_a.contains(point));
        }
    }

    #[test]
    fn test_small_cube_on_large_cube_uses_top_face() {
        let mut small =
            factory::cuboid(Vec3::splat(0.5), 1.0, Material::default()).expect("small cube");
        small.set_initial_position(Vec3::new(0.1, 0.74, 0.05));
        let big = cube_at(Vec3::ZERO);

        // small is B here: its bottom corners reach into A's top face
        let report = test_interpenetration(&big, &small, &overlap(&big, &small), EPS);
        assert_eq!(report.len(), 4);
        for normal in &report.normals {
            assert!((normal.y - 1.0).abs() < 1e-12, "A is below B, normal points up");
        }
        for point in &report.points_a {
            assert!((point.y - 0.5).abs() < 1e-9, "Points on A lie on its top face");
        }
    }

    #[test]
    fn test_aligned_equal_cubes_report_near_contact_across_a_gap() {
        // every corner ray passes just outside the facing square
        let lower = cube_at(Vec3::new(0.3, 0.5, -0.2));
        let upper = cube_at(Vec3::new(0.3, 1.502, -0.2));
        let report = test_interpenetration(&lower, &upper, &overlap(&lower, &upper), EPS);

        assert_eq!(report.len(), 8, "Four corners each way");
        let expected = -0.002 * 3f64.sqrt();
        assert!(
            (report.max_penetration - expected).abs() < 1e-9,
            "Expected {}, got {}",
            expected,
            report.max_penetration
        );
        for normal in &report.normals {
            assert!((normal.y - 1.0).abs() < 1e-12, "Got {:?}", normal);
        }
    }

    #[test]
    fn test_aligned_equal_cubes_report_overlap() {
        let lower = cube_at(Vec3::new(0.3, 0.5, -0.2));
        let upper = cube_at(Vec3::new(0.3, 1.49, -0.2));
        let report = test_interpenetration(&lower, &upper, &overlap(&lower, &upper), EPS);

        assert_eq!(report.len(), 8);
        assert!((report.max_penetration - 0.01 * 3f64.sqrt()).abs() < 1e-9);
        for normal in &report.normals {
            assert!((normal.y - 1.0).abs() < 1e-12, "Got {:?}", normal);
        }
    }

    #[test]
    fn test_distant_vertices_are_not_reported() {
        let cube = cube_at(Vec3::new(0.3, 0.6, -0.2));
        let floor = ground();
        // padded boxes do not touch at 10 cm
        assert!(cube.next().aabb.intersection_overlap(&floor.next().aabb).is_none());

        let region = Aabb::new(Vec3::new(-1.0, -0.1, -1.0), Vec3::new(1.0, 0.2, 1.0));
        let report = test_interpenetration(&cube, &floor, &region, EPS);
        assert!(report.is_empty());
    }

    #[test]
    fn test_deepest_picks_largest_depth() {
        let mut report = PenetrationReport::empty();
        report.push(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, -0.004);
        report.push(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 0.02);
        report.push(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 0.01);
        assert_eq!(report.deepest(), Some(1));
        assert_eq!(PenetrationReport::empty().deepest(), None);
    }
}
