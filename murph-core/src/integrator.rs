//! Time integration of rigid-body state.
//!
//! One step of length `dt` from a committed state:
//!
//! ```text
//! 1. p += Σ impulse            L += Σ r × impulse
//! 2. p += Σ F·dt               L += Σ (r × F)·dt      (skipped while resting)
//! 3. v  = p / m                ω  = I⁻¹ · L
//! 4. q += ½·(ω_old, 0)·q·dt    then normalize
//! 5. x += v_old·dt
//! 6. I⁻¹ = R · I0⁻¹ · Rᵀ
//! ```
//!
//! Orientation and position advance with the velocities of the committed
//! state; the freshly derived velocities take effect on the following step.

use crate::math::{Mat3, Quat, Vec3};
use crate::state::RigidBodyState;
use crate::types::{Force, Impulse};

/// Semi-implicit Euler integrator for rigid bodies.
pub struct SemiImplicitEuler;

impl SemiImplicitEuler {
    /// Folds pending impulses and, when `integrate_forces` is set, pending
    /// continuous forces into the momenta of `state`.
    ///
    /// # Returns
    /// `true` if at least one non-zero impulse was folded in.
    pub fn accumulate(
        state: &mut RigidBodyState,
        impulses: &[Impulse],
        forces: &[Force],
        dt: f64,
        integrate_forces: bool,
    ) -> bool {
        let mut kicked = false;
        for impulse in impulses {
            state.momentum += impulse.force;
            state.angular_momentum += impulse.point.cross(&impulse.force);
            kicked |= !impulse.is_zero();
        }

        if integrate_forces {
            for force in forces {
                state.momentum += force.vector * dt;
                state.angular_momentum += force.point.cross(&force.vector) * dt;
            }
        }
        kicked
    }

    /// Advances an orientation by `q̇ = ½ ω q` over `dt`.
    pub fn integrate_rotation(rotation: Quat, angular_velocity: Vec3, dt: f64) -> Quat {
        let spin = Quat::pure(angular_velocity) * rotation;
        (rotation + spin * (0.5 * dt)).normalized()
    }

    pub fn integrate_position(position: Vec3, velocity: Vec3, dt: f64) -> Vec3 {
        position + velocity * dt
    }

    /// Body-space inverse inertia rotated into the world.
    pub fn world_inverse_inertia(rotation_matrix: &Mat3, inverse_inertia0: &Mat3) -> Mat3 {
        *rotation_matrix * *inverse_inertia0 * rotation_matrix.transpose()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_impulse_folds_momentum_and_torque() {
        let mut state = RigidBodyState::default();
        let impulse = Impulse::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let kicked = SemiImplicitEuler::accumulate(&mut state, &[impulse], &[], 0.1, true);

        assert!(kicked);
        assert_eq!(state.momentum, Vec3::new(0.0, 2.0, 0.0));
        // (1,0,0) × (0,2,0) = (0,0,2)
        assert_eq!(state.angular_momentum, Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_forces_scale_with_dt_and_can_be_skipped() {
        let gravity = Force::at_center(Vec3::new(0.0, -9.81, 0.0));

        let mut awake = RigidBodyState::default();
        SemiImplicitEuler::accumulate(&mut awake, &[], &[gravity], 0.5, true);
        assert!((awake.momentum.y + 4.905).abs() < 1e-12);

        let mut resting = RigidBodyState::default();
        let kicked = SemiImplicitEuler::accumulate(&mut resting, &[], &[gravity], 0.5, false);
        assert!(!kicked);
        assert_eq!(resting.momentum, Vec3::ZERO);
    }

    #[test]
    fn test_zero_impulse_does_not_count_as_kick() {
        let mut state = RigidBodyState::default();
        assert!(!SemiImplicitEuler::accumulate(
            &mut state,
            &[Impulse::ZERO],
            &[],
            0.1,
            true
        ));
    }

    #[test]
    fn test_constant_spin_rotates_by_omega_t() {
        let omega = Vec3::new(0.0, PI, 0.0); // half a turn per second
        let mut q = Quat::IDENTITY;
        let dt = 1e-4;
        for _ in 0..5000 {
            q = SemiImplicitEuler::integrate_rotation(q, omega, dt);
        }
        assert!((q.magnitude() - 1.0).abs() < 1e-12, "Quaternion should stay unit");

        // after 0.5 s the body has turned a quarter turn about +Y
        let x = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(
            (x.z + 1.0).abs() < 1e-3,
            "Expected +X to map near -Z, got {:?}",
            x
        );
    }

    #[test]
    fn test_world_inverse_inertia_of_rotated_box() {
        let inv0 = Mat3::diagonal(Vec3::new(1.0, 2.0, 3.0));
        let r = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), PI / 2.0).to_rotation_matrix();
        let world = SemiImplicitEuler::world_inverse_inertia(&r, &inv0);
        // a quarter turn about Z swaps the X and Y principal axes
        let expected = Mat3::diagonal(Vec3::new(2.0, 1.0, 3.0));
        assert!(world.max_abs_diff(&expected) < 1e-12, "got {:?}", world);
    }

    #[test]
    fn test_position_uses_given_velocity() {
        let p = SemiImplicitEuler::integrate_position(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 1.0);
        assert!((p.x - 10.0).abs() < 1e-10);
    }
}
