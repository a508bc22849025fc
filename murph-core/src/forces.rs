//! Force fields acting on every body of the engine.
//!
//! Each step the engine asks every registered field for the force it exerts
//! on every body and queues the result on that body:
//!
//! - **Uniform directional**: constant acceleration, e.g. gravity (`F = m·a`)
//! - **Point attractor**: pull toward a point, `F = m·k / d²`
//! - **Uniform point**: pull toward a point independent of mass, `F = k / d²`
//!
//! ```text
//!   uniform            point attractor
//!   ↓ ↓ ↓ ↓             ↘  ↓  ↙
//!   ↓ ↓ ↓ ↓             →  ●  ←
//!   ↓ ↓ ↓ ↓             ↗  ↑  ↖
//! ```
//!
//! Fields are pure functions of body state; they must not mutate anything.

use std::fmt;

use crate::body::RigidBody;
use crate::math::Vec3;
use crate::types::{constants, Force};

/// A source of continuous force.
pub trait ForceField: fmt::Debug + Send + Sync {
    /// Force exerted on `body` during the coming step.
    fn compute_force(&self, body: &RigidBody) -> Force;
}

/// Same acceleration everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDirectionalField {
    /// Acceleration in m/s²
    pub acceleration: Vec3,
}

impl UniformDirectionalField {
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }

    /// Standard gravity along -Y.
    pub fn gravity() -> Self {
        Self::new(Vec3::new(0.0, -constants::GRAVITY, 0.0))
    }
}

impl ForceField for UniformDirectionalField {
    fn compute_force(&self, body: &RigidBody) -> Force {
        Force::at_center(self.acceleration * body.mass())
    }
}

/// Inverse-square pull toward `center`, scaled by the body's mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAttractorField {
    pub center: Vec3,
    pub strength: f64,
}

impl PointAttractorField {
    pub fn new(center: Vec3, strength: f64) -> Self {
        Self { center, strength }
    }
}

impl ForceField for PointAttractorField {
    fn compute_force(&self, body: &RigidBody) -> Force {
        inverse_square_pull(self.center, body.position_copy(), self.strength * body.mass())
    }
}

/// Inverse-square pull toward `center`, identical for every body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformPointField {
    pub center: Vec3,
    pub strength: f64,
}

impl UniformPointField {
    pub fn new(center: Vec3, strength: f64) -> Self {
        Self { center, strength }
    }
}

impl ForceField for UniformPointField {
    fn compute_force(&self, body: &RigidBody) -> Force {
        inverse_square_pull(self.center, body.position_copy(), self.strength)
    }
}

/// Force of magnitude `numerator / d²` from `position` toward `center`.
///
/// Zero at the centre itself, where the direction is undefined.
fn inverse_square_pull(center: Vec3, position: Vec3, numerator: f64) -> Force {
    let offset = center - position;
    let distance_sq = offset.magnitude_squared();
    if distance_sq < constants::EPSILON {
        return Force::default();
    }
    Force::at_center(offset.normalized() * (numerator / distance_sq))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::types::Material;

    fn ball_at(position: Vec3, mass: f64) -> RigidBody {
        let mut body = factory::sphere(0.5, mass, Material::default()).expect("valid ball");
        body.set_initial_position(position);
        body
    }

    #[test]
    fn test_gravity_scales_with_mass() {
        let field = UniformDirectionalField::gravity();
        let force = field.compute_force(&ball_at(Vec3::ZERO, 3.0));
        assert!(
            (force.vector.y + 3.0 * 9.81).abs() < 1e-12,
            "Gravity should be m*g, got {}",
            force.vector.y
        );
        assert_eq!(force.point, Vec3::ZERO);
    }

    #[test]
    fn test_gravity_on_static_body_is_zero() {
        let field = UniformDirectionalField::gravity();
        let force = field.compute_force(&ball_at(Vec3::ZERO, 0.0));
        assert_eq!(force.vector, Vec3::ZERO);
    }

    #[test]
    fn test_attractor_follows_inverse_square() {
        let field = PointAttractorField::new(Vec3::ZERO, 10.0);
        let near = field.compute_force(&ball_at(Vec3::new(2.0, 0.0, 0.0), 1.0));
        let far = field.compute_force(&ball_at(Vec3::new(4.0, 0.0, 0.0), 1.0));

        // pulls toward the centre
        assert!(near.vector.x < 0.0);
        assert!((near.vector.x + 2.5).abs() < 1e-12);
        assert!((near.vector.x / far.vector.x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_point_ignores_mass() {
        let field = UniformPointField::new(Vec3::new(0.0, 5.0, 0.0), 4.0);
        let light = field.compute_force(&ball_at(Vec3::ZERO, 1.0));
        let heavy = field.compute_force(&ball_at(Vec3::ZERO, 50.0));
        assert_eq!(light.vector, heavy.vector);
        assert!((light.vector.y - 4.0 / 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_field_at_center_is_zero() {
        let field = PointAttractorField::new(Vec3::new(1.0, 1.0, 1.0), 100.0);
        let force = field.compute_force(&ball_at(Vec3::new(1.0, 1.0, 1.0), 1.0));
        assert_eq!(force.vector, Vec3::ZERO);
    }
}
