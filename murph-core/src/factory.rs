//! Ready-made bodies for common shapes.
//!
//! Each constructor pairs a [`TriangleMesh`] with the matching solid inertia
//! tensor. Pass `mass = 0.0` for static scenery.

use std::sync::Arc;

use crate::body::RigidBody;
use crate::error::Result;
use crate::geometry::TriangleMesh;
use crate::math::{Mat3, Vec3};
use crate::types::Material;

/// Latitude bands of [`sphere`] meshes.
pub const SPHERE_RINGS: usize = 8;

/// Longitude slices of [`sphere`] meshes.
pub const SPHERE_SEGMENTS: usize = 16;

/// Inertia of a solid box with edge lengths `size`.
pub fn cuboid_inertia(mass: f64, size: Vec3) -> Mat3 {
    let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
    Mat3::diagonal(Vec3::new(
        mass * (y2 + z2) / 12.0,
        mass * (x2 + z2) / 12.0,
        mass * (x2 + y2) / 12.0,
    ))
}

/// Inertia of a solid sphere: `2/5 m r²` about every axis.
pub fn sphere_inertia(mass: f64, radius: f64) -> Mat3 {
    Mat3::diagonal(Vec3::splat(0.4 * mass * radius * radius))
}

/// Inertia of a solid regular octahedron whose vertices sit at `radius`.
pub fn octahedron_inertia(mass: f64, radius: f64) -> Mat3 {
    Mat3::diagonal(Vec3::splat(0.2 * mass * radius * radius))
}

pub fn cuboid(size: Vec3, mass: f64, material: Material) -> Result<RigidBody> {
    RigidBody::new(
        Arc::new(TriangleMesh::cuboid(size)),
        mass,
        cuboid_inertia(mass, size),
        material,
    )
}

pub fn sphere(radius: f64, mass: f64, material: Material) -> Result<RigidBody> {
    RigidBody::new(
        Arc::new(TriangleMesh::uv_sphere(radius, SPHERE_RINGS, SPHERE_SEGMENTS)),
        mass,
        sphere_inertia(mass, radius),
        material,
    )
}

pub fn octahedron(radius: f64, mass: f64, material: Material) -> Result<RigidBody> {
    RigidBody::new(
        Arc::new(TriangleMesh::octahedron(radius)),
        mass,
        octahedron_inertia(mass, radius),
        material,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube_inertia() {
        let inertia = cuboid_inertia(6.0, Vec3::splat(1.0));
        assert!(inertia.max_abs_diff(&Mat3::IDENTITY) < 1e-12);
    }

    #[test]
    fn test_slab_inertia_is_anisotropic() {
        let inertia = cuboid_inertia(12.0, Vec3::new(2.0, 1.0, 1.0));
        assert!((inertia.m[0][0] - 2.0).abs() < 1e-12);
        assert!((inertia.m[1][1] - 5.0).abs() < 1e-12);
        assert!((inertia.m[2][2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_factories_build_bodies() {
        let ground = cuboid(Vec3::new(20.0, 1.0, 20.0), 0.0, Material::default()).expect("ground");
        assert!(ground.is_static());

        let ball = sphere(0.5, 1.0, Material::rubber()).expect("ball");
        assert!(!ball.is_static());
        let aabb = ball.current().aabb;
        assert!((aabb.max.y - (0.5 + 0.01)).abs() < 1e-12);

        let gem = octahedron(1.0, 2.0, Material::steel()).expect("gem");
        assert_eq!(gem.geometry().indices().len(), 8);
    }
}
