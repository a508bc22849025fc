//! Narrow phase and contact response.
//!
//! - **Detection**: vertex-to-face penetration between two meshes, both ways
//! - **Resolution**: collision and friction impulses, the per-contact manifold
//!   solver, positional repel split
//!
//! The time-of-impact search that ties them together lives in the engine:
//!
//! ```text
//!   t=0                      t=dt
//!    ●───────────┬─────────────●      overlap at dt: bisect back
//!                ●──────●             overlap at dt/2: bisect back
//!                ●──●                 within epsilon: resolve here
//! ══════════════════════════════════
//! ```

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
