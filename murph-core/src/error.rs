//! Error types for the physics core.

use thiserror::Error;

use crate::types::{BodyId, FieldId};

/// Errors raised by the physics core.
///
/// Geometry, mass and lookup errors are precondition failures: the caller
/// handed the engine something it cannot simulate, and retrying will not help.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Geometry has no vertex data.
    #[error("geometry has no vertex data")]
    EmptyGeometry,

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {vertex}, geometry has {vertex_count} vertices")]
    InvalidTriangle {
        /// Triangle index.
        triangle: usize,
        /// Offending vertex index.
        vertex: usize,
        /// Number of vertices in the geometry.
        vertex_count: usize,
    },

    /// Mass must be finite and non-negative (zero means static).
    #[error("invalid mass: {0}")]
    InvalidMass(f64),

    /// A dynamic body needs an invertible inertia tensor.
    #[error("inertia tensor of a dynamic body is singular")]
    SingularInertia,

    /// Restitution or friction out of range.
    #[error("invalid material: {reason}")]
    InvalidMaterial {
        /// What was wrong.
        reason: String,
    },

    /// Engine configuration rejected.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// No body with this id is registered.
    #[error("body not found: {0}")]
    BodyNotFound(BodyId),

    /// No force field with this id is registered.
    #[error("force field not found: {0}")]
    FieldNotFound(FieldId),

    /// Named material file does not exist.
    #[error("material not found: {0}")]
    MaterialNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for physics operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PhysicsError::BodyNotFound(BodyId(3)).to_string(),
            "body not found: body#3"
        );
        let err = PhysicsError::InvalidTriangle {
            triangle: 1,
            vertex: 9,
            vertex_count: 4,
        };
        assert!(err.to_string().contains("vertex 9"));
    }
}
