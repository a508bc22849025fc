//! Shared value types: handles, forces, impulses and surface materials.
//!
//! All units are SI:
//! - Position: meters (m)
//! - Velocity: meters per second (m/s)
//! - Angular velocity: radians per second (rad/s)
//! - Mass: kilograms (kg)
//! - Force: Newtons (N), impulse: Newton-seconds (N·s)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PhysicsError, Result};
use crate::math::Vec3;

// =============================================================================
// Handles
// =============================================================================

/// Engine-assigned identity of a rigid body.
///
/// Ids are never reused within one engine, so a stale id simply fails to
/// resolve after its body was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Engine-assigned identity of a force field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct FieldId(pub u64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field#{}", self.0)
    }
}

// =============================================================================
// Force / Impulse
// =============================================================================

/// Continuous force, integrated over the step duration.
///
/// `point` is the application point relative to the body's centre of mass,
/// in world orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Force {
    pub vector: Vec3,
    pub point: Vec3,
}

impl Force {
    pub const fn new(vector: Vec3, point: Vec3) -> Self {
        Self { vector, point }
    }

    /// Force through the centre of mass (no torque).
    pub const fn at_center(vector: Vec3) -> Self {
        Self::new(vector, Vec3::ZERO)
    }
}

/// Instantaneous change of momentum, applied whole at the next integration.
///
/// `point` is body-local: the offset from the centre of mass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Impulse {
    pub force: Vec3,
    pub point: Vec3,
}

impl Impulse {
    pub const ZERO: Impulse = Impulse {
        force: Vec3::ZERO,
        point: Vec3::ZERO,
    };

    pub const fn new(force: Vec3, point: Vec3) -> Self {
        Self { force, point }
    }

    pub fn is_zero(&self) -> bool {
        self.force == Vec3::ZERO
    }
}

// =============================================================================
// Material
// =============================================================================

/// Surface response of a body.
///
/// The effective restitution of a contact is the product of both bodies'
/// restitution; the effective friction is the larger of the two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Coefficient of restitution, 0 (fully inelastic) to 1 (fully elastic)
    pub restitution: f64,

    /// Friction coefficient (>= 0)
    pub friction: f64,
}

impl Material {
    pub const fn new(restitution: f64, friction: f64) -> Self {
        Self {
            restitution,
            friction,
        }
    }

    /// Perfectly elastic and frictionless.
    pub const fn elastic() -> Self {
        Self::new(1.0, 0.0)
    }

    pub const fn rubber() -> Self {
        Self::new(0.8, 0.9)
    }

    pub const fn steel() -> Self {
        Self::new(0.6, 0.4)
    }

    pub const fn ice() -> Self {
        Self::new(0.3, 0.02)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidMaterial {
                reason: format!("restitution {} outside [0, 1]", self.restitution),
            });
        }
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(PhysicsError::InvalidMaterial {
                reason: format!("friction {} must be finite and non-negative", self.friction),
            });
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(0.5, 0.3)
    }
}

/// Physical constants
pub mod constants {
    /// Standard gravity (m/s²)
    pub const GRAVITY: f64 = 9.81;

    /// Threshold below which a length or speed counts as zero
    pub const EPSILON: f64 = 1e-10;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for material in [
            Material::default(),
            Material::elastic(),
            Material::rubber(),
            Material::steel(),
            Material::ice(),
        ] {
            assert!(material.validate().is_ok(), "{:?} should be valid", material);
        }
    }

    #[test]
    fn test_material_rejects_out_of_range() {
        assert!(Material::new(1.2, 0.1).validate().is_err());
        assert!(Material::new(-0.1, 0.1).validate().is_err());
        assert!(Material::new(0.5, -1.0).validate().is_err());
        assert!(Material::new(f64::NAN, 0.1).validate().is_err());
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(BodyId(7).to_string(), "body#7");
        assert_eq!(FieldId(2).to_string(), "field#2");
    }

    #[test]
    fn test_zero_impulse() {
        assert!(Impulse::ZERO.is_zero());
        assert!(!Impulse::new(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO).is_zero());
    }
}
