//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::geometry::{Geometry, Triangle};
use crate::math::{Vec3, WorldMatrix};

/// Axis-aligned bounding box, `min <= max` component-wise.
///
/// The default box is the degenerate box at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    #[must_use]
    pub fn from_triangle(triangle: &Triangle) -> Self {
        Self::new(
            triangle[0].min(&triangle[1]).min(&triangle[2]),
            triangle[0].max(&triangle[1]).max(&triangle[2]),
        )
    }

    #[must_use]
    pub fn from_edge(a: Vec3, b: Vec3) -> Self {
        Self::new(a.min(&b), a.max(&b))
    }

    /// Box of a mesh placed in the world by `world`.
    ///
    /// # Errors
    ///
    /// `EmptyGeometry` when the mesh has no vertices.
    pub fn from_geometry(geometry: &dyn Geometry, world: &WorldMatrix) -> Result<Self> {
        Self::from_points(&geometry.world_vertices(world)).ok_or(PhysicsError::EmptyGeometry)
    }

    /// Grows the box by `margin` on every side.
    #[must_use]
    pub fn padded(&self, margin: f64) -> Self {
        let pad = Vec3::splat(margin);
        Self::new(self.min - pad, self.max + pad)
    }

    /// Per-axis interval test; touching boxes intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Common region of two boxes, or `None` when they do not intersect.
    #[must_use]
    pub fn intersection_overlap(&self, other: &Self) -> Option<Self> {
        self.intersects(other)
            .then(|| Self::new(self.min.max(&other.min), self.max.min(&other.max)))
    }

    #[must_use]
    pub fn contains_point(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True when `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

// =============================================================================
// Tests
// =============================================================================
