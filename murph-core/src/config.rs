//! Engine tunables.
//!
//! Configuration can be built in code or read from YAML:
//!
//! ```yaml
//! epsilon: 0.01
//! max_bisection_depth: 10
//! spatial_hash_cell_size: 4.0
//! ```
//!
//! Missing keys take their default value.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PhysicsError, Result};

/// Configuration shared by the engine and its bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Contact tolerance in meters: touching window of the time-of-impact
    /// search, AABB padding and the relative-speed floor of the solver.
    pub epsilon: f64,

    /// Recursion budget of the time-of-impact bisection.
    pub max_bisection_depth: u32,

    /// Edge length of a broad-phase grid cell. Should be at least the
    /// diameter of the largest dynamic body.
    pub spatial_hash_cell_size: f64,

    /// Linear speed (m/s) under which a body may be considered resting.
    pub resting_linear_threshold: f64,

    /// Angular speed (rad/s) under which a body may be considered resting.
    pub resting_angular_threshold: f64,

    /// Upper bound on the variance of the velocity histories of a resting body.
    pub resting_variance_threshold: f64,

    /// Samples kept in each velocity history.
    pub history_capacity: usize,

    /// A history sample is taken every `history_sample_interval` commits.
    pub history_sample_interval: u64,

    /// Approach speed (m/s) below which a contact is treated as perfectly
    /// inelastic, whatever the materials say.
    pub bounce_threshold: f64,

    /// Gauss-Seidel sweeps over the contact points of a step.
    pub solver_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            max_bisection_depth: 10,
            spatial_hash_cell_size: 4.0,
            resting_linear_threshold: 0.05,
            resting_angular_threshold: 0.05,
            resting_variance_threshold: 1e-4,
            history_capacity: 100,
            history_sample_interval: 5,
            bounce_threshold: 0.5,
            solver_iterations: 10,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&contents)?;
        debug!(path = %path.as_ref().display(), ?config, "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("epsilon", self.epsilon),
            ("spatial_hash_cell_size", self.spatial_hash_cell_size),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("resting_linear_threshold", self.resting_linear_threshold),
            ("resting_angular_threshold", self.resting_angular_threshold),
            ("resting_variance_threshold", self.resting_variance_threshold),
            ("bounce_threshold", self.bounce_threshold),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }

        if self.history_capacity == 0 {
            return Err(invalid("history_capacity must be at least 1".to_string()));
        }
        if self.history_sample_interval == 0 {
            return Err(invalid("history_sample_interval must be at least 1".to_string()));
        }
        if self.solver_iterations == 0 {
            return Err(invalid("solver_iterations must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> PhysicsError {
    PhysicsError::InvalidConfig { reason }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("epsilon: 0.005\nmax_bisection_depth: 6\n")
            .expect("valid config");
        assert_eq!(config.epsilon, 0.005);
        assert_eq!(config.max_bisection_depth, 6);
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = EngineConfig {
            spatial_hash_cell_size: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(PhysicsError::InvalidConfig { .. })
        ));
        assert!(EngineConfig::from_yaml_str("history_capacity: 0").is_err());
        assert!(EngineConfig::from_yaml_str("epsilon: -1.0").is_err());
        assert!(EngineConfig::from_yaml_str("history_sample_interval: 0").is_err());
        assert!(EngineConfig::from_yaml_str("solver_iterations: 0").is_err());
        assert!(EngineConfig::from_yaml_str("bounce_threshold: -0.1").is_err());
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let result = EngineConfig::from_yaml_str("epsilon: [not, a, number]");
        assert!(matches!(result, Err(PhysicsError::Yaml(_))));
    }

    #[test]
    fn test_load_shipped_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/engine.yaml");
        let config = EngineConfig::load(path).expect("shipped config loads");
        assert!(config.validate().is_ok());
    }
}
