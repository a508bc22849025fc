//! Contact response: collision and friction impulses, positional repel.
//!
//! Conventions for a contact between A and B:
//!
//! - `normal` is unit length and points from A toward B
//! - `ra`, `rb` are contact offsets from each centre of mass
//! - relative velocity is `v_B(rb) - v_A(ra)`, so approaching bodies have a
//!   negative normal component
//!
//! ```text
//!          A                     B
//!        ┌───┐  -j·n      +j·n ┌───┐
//!        │ ● │◄──── ra ╳ rb ──►│ ● │
//!        └───┘        normal → └───┘
//! ```
//!
//! The single-point functions return impulses without applying them.
//! [`ContactManifold`] solves every point of a contact together, applying
//! each impulse to the tentative states as it goes. Velocities are always
//! read from the tentative states.

use crate::body::RigidBody;
use crate::collision::PenetrationReport;
use crate::math::Vec3;
use crate::types::Impulse;

/// Normal impulse pair `(on A, on B)` for one contact point.
///
/// Zero when the bodies separate along the normal or approach slower than
/// `epsilon`. The coefficient of restitution is the product of both bodies'.
pub fn compute_collision_impulse(
    a: &RigidBody,
    b: &RigidBody,
    ra: Vec3,
    rb: Vec3,
    normal: Vec3,
    epsilon: f64,
) -> (Impulse, Impulse) {
    let relative = b.next_velocity_at_point(rb) - a.next_velocity_at_point(ra);
    let rv = normal.dot(&relative);
    if rv > 0.0 || rv.abs() < epsilon {
        return (Impulse::ZERO, Impulse::ZERO);
    }

    let restitution = a.restitution() * b.restitution();
    let denominator = effective_inverse_mass(a, ra, normal) + effective_inverse_mass(b, rb, normal);
    if denominator <= 0.0 {
        return (Impulse::ZERO, Impulse::ZERO);
    }
    let j = -(1.0 + restitution) * rv / denominator;
    impulse_pair(normal, j, ra, rb)
}

/// `(on A, on B)` for an impulse of magnitude `j` along `direction`.
fn impulse_pair(direction: Vec3, j: f64, ra: Vec3, rb: Vec3) -> (Impulse, Impulse) {
    (
        Impulse::new(direction * -j, ra),
        Impulse::new(direction * j, rb),
    )
}

/// Normal component of `v_B(rb) - v_A(ra)` in the tentative states.
fn normal_speed(a: &RigidBody, b: &RigidBody, ra: Vec3, rb: Vec3, normal: Vec3) -> f64 {
    normal.dot(&(b.next_velocity_at_point(rb) - a.next_velocity_at_point(ra)))
}

/// Tangential impulse pair `(on A, on B)` opposing sliding at the contact.
///
/// Uses the larger of the two friction coefficients. The magnitude is not
/// clamped by the normal impulse.
pub fn compute_friction_impulse(
    a: &RigidBody,
    b: &RigidBody,
    ra: Vec3,
    rb: Vec3,
    normal: Vec3,
    epsilon: f64,
) -> (Impulse, Impulse) {
    let relative = b.next_velocity_at_point(rb) - a.next_velocity_at_point(ra);
    if normal.dot(&relative) > 0.0 {
        return (Impulse::ZERO, Impulse::ZERO);
    }

    let sliding = relative.reject_from(&normal);
    if sliding.magnitude() < epsilon {
        return (Impulse::ZERO, Impulse::ZERO);
    }
    let tangent = sliding.normalized();

    let friction = a.friction().max(b.friction());
    let denominator =
        effective_inverse_mass(a, ra, tangent) + effective_inverse_mass(b, rb, tangent);
    if friction == 0.0 || denominator <= 0.0 {
        return (Impulse::ZERO, Impulse::ZERO);
    }
    let j = -friction * relative.dot(&tangent) / denominator;
    impulse_pair(tangent, j, ra, rb)
}

// =============================================================================
// Manifold solver
// =============================================================================

/// One point of a [`ContactManifold`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldPoint {
    pub ra: Vec3,
    pub rb: Vec3,
    /// Unit normal from A toward B.
    pub normal: Vec3,
    /// Normal separation speed the solver drives this point to.
    pub target_speed: f64,
    /// Normal impulse applied so far, never negative.
    pub accumulated: f64,
}

/// Every contact point between two bodies, solved together.
///
/// Points are visited one after the other and each impulse is applied to the
/// tentative states at once (projected Gauss-Seidel), so points sharing a
/// face split the load instead of each answering the full approach speed.
/// The accumulated impulse of a point may shrink between sweeps but never
/// turns into a pull. For a lone point approaching faster than the bounce
/// threshold the first sweep applies exactly [`compute_collision_impulse`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactManifold {
    points: Vec<ManifoldPoint>,
}

impl ContactManifold {
    /// Points of `report` accepted by `keep(depth)`, with offsets taken from
    /// the tentative positions of `a` and `b`. Targets start at zero.
    pub fn from_report(
        report: &PenetrationReport,
        a: &RigidBody,
        b: &RigidBody,
        keep: impl Fn(f64) -> bool,
    ) -> Self {
        let points = (0..report.len())
            .filter(|&k| keep(report.penetration_depths[k]))
            .map(|k| ManifoldPoint {
                ra: report.points_a[k] - a.next().position,
                rb: report.points_b[k] - b.next().position,
                normal: report.normals[k],
                target_speed: 0.0,
                accumulated: 0.0,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sets each point to bounce back at `e` times its current approach
    /// speed, where `e` is the product of both restitutions. Approaches
    /// slower than `bounce_threshold` get a target of zero.
    pub fn prepare_restitution(&mut self, a: &RigidBody, b: &RigidBody, bounce_threshold: f64) {
        let restitution = a.restitution() * b.restitution();
        for point in &mut self.points {
            let rv = normal_speed(a, b, point.ra, point.rb, point.normal);
            point.target_speed = if rv < -bounce_threshold {
                -restitution * rv
            } else {
                0.0
            };
        }
    }

    /// One Gauss-Seidel sweep of normal impulses over every point.
    pub fn solve_normal(&mut self, a: &mut RigidBody, b: &mut RigidBody) {
        for point in &mut self.points {
            let denominator = effective_inverse_mass(a, point.ra, point.normal)
                + effective_inverse_mass(b, point.rb, point.normal);
            if denominator <= 0.0 {
                continue;
            }
            let rv = normal_speed(a, b, point.ra, point.rb, point.normal);
            let total = (point.accumulated + (point.target_speed - rv) / denominator).max(0.0);
            let j = total - point.accumulated;
            point.accumulated = total;
            if j == 0.0 {
                continue;
            }
            let (on_a, on_b) = impulse_pair(point.normal, j, point.ra, point.rb);
            a.apply_contact_impulse(on_a);
            b.apply_contact_impulse(on_b);
        }
    }

    /// Friction at every point, each seeing the sliding left by the
    /// previous ones.
    pub fn apply_friction(&self, a: &mut RigidBody, b: &mut RigidBody, epsilon: f64) {
        for point in &self.points {
            let (on_a, on_b) =
                compute_friction_impulse(a, b, point.ra, point.rb, point.normal, epsilon);
            a.apply_contact_impulse(on_a);
            b.apply_contact_impulse(on_b);
        }
    }

    /// Total normal impulse applied so far.
    pub fn total_impulse(&self) -> f64 {
        self.points.iter().map(|p| p.accumulated).sum()
    }
}

/// `1/m + d · ((I⁻¹ (r × d)) × r)`, zero for static bodies.
fn effective_inverse_mass(body: &RigidBody, r: Vec3, direction: Vec3) -> f64 {
    if body.is_static() {
        return 0.0;
    }
    let angular = (body.next().inverse_inertia_tensor * r.cross(&direction)).cross(&r);
    body.inverse_mass() + direction.dot(&angular)
}

/// Splits a separation distance between A and B.
///
/// Each body moves in proportion to the other's mass; a body facing a static
/// one takes the whole distance and a static body never moves.
///
/// # Returns
/// `(distance for A, distance for B)`, both non-negative.
pub fn repel_distances(a: &RigidBody, b: &RigidBody, distance: f64) -> (f64, f64) {
    let share_a = if b.is_static() {
        1.0
    } else {
        b.mass() / (a.mass() + b.mass())
    };
    let distance_a = if a.is_static() { 0.0 } else { share_a * distance };
    let distance_b = if b.is_static() {
        0.0
    } else {
        distance - distance_a
    };
    (distance_a, distance_b)
}

// =============================================================================
// Tests
// =============================================================================
