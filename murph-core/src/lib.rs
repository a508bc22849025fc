//! # Murph Core
//!
//! A discrete-time rigid-body physics engine for triangle meshes.
//!
//! ## Architecture
//!
//! - `math`: Vector, quaternion and 3×3 matrix kernel
//! - `types`: Handles, forces, impulses and materials
//! - `geometry`: Mesh seam and primitive meshes
//! - `aabb`: Axis-aligned bounding boxes
//! - `state` / `body`: Double-buffered rigid bodies and resting detection
//! - `integrator`: Semi-implicit Euler for linear and rotational motion
//! - `forces`: Force fields (gravity, point attractors)
//! - `broad_phase`: Spatial hash over tentative positions
//! - `collision`: Vertex-to-face narrow phase and impulse response
//! - `engine`: Step orchestration and bisection time-of-impact search
//! - `config` / `materials`: YAML-backed tunables and surface presets
//!
//! ## Example
//!
//! ```
//! use murph_core::{factory, Engine, Material, UniformDirectionalField, Vec3};
//!
//! let mut engine = Engine::new();
//! engine.add_force_field(Box::new(UniformDirectionalField::gravity()));
//!
//! let mut ground = factory::cuboid(Vec3::new(20.0, 1.0, 20.0), 0.0, Material::steel()).unwrap();
//! ground.set_initial_position(Vec3::new(0.0, -0.5, 0.0));
//! engine.add_body(ground);
//!
//! let mut ball = factory::sphere(0.5, 1.0, Material::rubber()).unwrap();
//! ball.set_initial_position(Vec3::new(0.3, 3.0, -0.2));
//! let id = engine.add_body(ball);
//!
//! for _ in 0..60 {
//!     engine.update(1.0 / 60.0);
//! }
//! assert!(engine.body(id).unwrap().position_copy().y < 3.0);
//! ```

pub mod aabb;
pub mod body;
pub mod broad_phase;
pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod forces;
pub mod geometry;
pub mod history;
pub mod integrator;
pub mod materials;
pub mod math;
pub mod state;
pub mod types;

pub use aabb::Aabb;
pub use body::{NeighborMotion, RigidBody};
pub use config::EngineConfig;
pub use engine::{Contact, Engine};
pub use error::{PhysicsError, Result};
pub use forces::{ForceField, PointAttractorField, UniformDirectionalField, UniformPointField};
pub use geometry::{Geometry, TriangleMesh};
pub use materials::MaterialLoader;
pub use math::{Mat3, Quat, Vec3};
pub use types::{BodyId, FieldId, Force, Impulse, Material};
