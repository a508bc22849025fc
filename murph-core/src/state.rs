//! Snapshot of a rigid body's physical state.

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::math::{Mat3, Quat, Vec3, WorldMatrix};

/// Full kinematic state of a body at one instant.
///
/// A body keeps two of these, the committed `current` and the tentative
/// `next`. Being `Copy`, copying one into the other never aliases.
///
/// `rotation_matrix`, `inverse_inertia_tensor`, `world_matrix` and `aabb` are
/// derived from `position` and `rotation` and refreshed by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub is_resting: bool,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub momentum: Vec3,
    pub angular_momentum: Vec3,
    pub rotation_matrix: Mat3,
    /// World-space inverse inertia tensor `R I0^-1 R^T`.
    pub inverse_inertia_tensor: Mat3,
    pub world_matrix: WorldMatrix,
    pub aabb: Aabb,
}

impl RigidBodyState {
    /// Motionless state at `position` with identity orientation.
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            is_resting: false,
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            momentum: Vec3::ZERO,
            angular_momentum: Vec3::ZERO,
            rotation_matrix: Mat3::IDENTITY,
            inverse_inertia_tensor: Mat3::ZERO,
            world_matrix: WorldMatrix::new(Mat3::IDENTITY, position),
            aabb: Aabb::default(),
        }
    }

    /// Overwrites every field of `self` with `other`.
    pub fn copy_from(&mut self, other: &Self) {
        *self = *other;
    }

    /// Velocity of a point at body-local offset `r`: `v + ω × r`.
    pub fn velocity_at_point(&self, r: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(&r)
    }
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_does_not_alias() {
        let mut current = RigidBodyState::at_rest(Vec3::new(0.0, 1.0, 0.0));
        let mut next = RigidBodyState::default();
        next.copy_from(&current);
        current.position.y = 5.0;
        current.aabb.max.x = 3.0;
        assert_eq!(next.position.y, 1.0);
        assert_eq!(next.aabb.max.x, 0.0);
    }

    #[test]
    fn test_velocity_at_point_includes_spin() {
        let mut state = RigidBodyState::default();
        state.velocity = Vec3::new(1.0, 0.0, 0.0);
        state.angular_velocity = Vec3::new(0.0, 0.0, 2.0);
        // ω × r = (0,0,2) × (1,0,0) = (0,2,0)
        let v = state.velocity_at_point(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(v, Vec3::new(1.0, 2.0, 0.0));
    }
}
