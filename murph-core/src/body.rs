//! Rigid bodies: double-buffered state, integration and resting detection.
//!
//! A body owns a committed `current` state and a tentative `next` state.
//! [`RigidBody::compute_next_step`] always restarts from `current`, so the
//! engine may re-integrate the same body to different times while it
//! searches for an impact; [`RigidBody::apply_next_step`] commits.

use std::sync::Arc;

use tracing::trace;

use crate::aabb::Aabb;
use crate::config::EngineConfig;
use crate::error::{PhysicsError, Result};
use crate::geometry::Geometry;
use crate::history::VectorHistory;
use crate::integrator::SemiImplicitEuler;
use crate::math::{Mat3, Quat, Vec3, WorldMatrix};
use crate::state::RigidBodyState;
use crate::types::{BodyId, Force, Impulse, Material};

/// Motion of a contacting neighbour, as seen by resting detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborMotion {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub is_resting: bool,
    pub is_static: bool,
}

impl NeighborMotion {
    /// Committed motion of `body`.
    pub fn of(body: &RigidBody) -> Self {
        Self {
            velocity: body.current.velocity,
            angular_velocity: body.current.angular_velocity,
            is_resting: body.is_resting(),
            is_static: body.is_static(),
        }
    }
}

/// A simulated rigid body. A mass of zero makes the body static.
#[derive(Debug, Clone)]
pub struct RigidBody {
    id: BodyId,
    geometry: Arc<dyn Geometry>,
    mass: f64,
    inverse_mass: f64,
    material: Material,
    inertia_tensor0: Mat3,
    inverse_inertia_tensor0: Mat3,
    current: RigidBodyState,
    next: RigidBodyState,
    impulses: Vec<Impulse>,
    forces: Vec<Force>,
    contacting_bodies: Vec<BodyId>,
    velocity_history: VectorHistory,
    angular_velocity_history: VectorHistory,
    commits: u64,
    config: EngineConfig,
}

impl RigidBody {
    /// Creates a body at the origin, at rest, with identity orientation.
    ///
    /// # Arguments
    /// * `geometry` - Collision mesh, body-local and centred on the centre of mass
    /// * `mass` - Mass in kg, `0.0` for a static body
    /// * `inertia_tensor` - Body-space inertia tensor (ignored for static bodies)
    /// * `material` - Restitution and friction
    ///
    /// # Errors
    /// Rejects empty or malformed geometry, negative or non-finite mass,
    /// out-of-range materials and singular inertia on a dynamic body.
    pub fn new(
        geometry: Arc<dyn Geometry>,
        mass: f64,
        inertia_tensor: Mat3,
        material: Material,
    ) -> Result<Self> {
        geometry.validate()?;
        material.validate()?;
        if !mass.is_finite() || mass < 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }

        let is_static = mass == 0.0;
        let (inverse_mass, inertia_tensor0, inverse_inertia_tensor0) = if is_static {
            (0.0, Mat3::ZERO, Mat3::ZERO)
        } else {
            let inverse = inertia_tensor
                .inverse()
                .ok_or(PhysicsError::SingularInertia)?;
            (1.0 / mass, inertia_tensor, inverse)
        };

        let config = EngineConfig::default();
        let mut body = Self {
            id: BodyId::default(),
            geometry,
            mass,
            inverse_mass,
            material,
            inertia_tensor0,
            inverse_inertia_tensor0,
            current: RigidBodyState::at_rest(Vec3::ZERO),
            next: RigidBodyState::at_rest(Vec3::ZERO),
            impulses: Vec::new(),
            forces: Vec::new(),
            contacting_bodies: Vec::new(),
            velocity_history: VectorHistory::new(config.history_capacity),
            angular_velocity_history: VectorHistory::new(config.history_capacity),
            commits: 0,
            config,
        };
        body.current.is_resting = is_static;
        body.refresh_current();
        Ok(body)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Engine-assigned id; `BodyId(0)` until the body is added to an engine.
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: BodyId) {
        self.id = id;
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// `1 / mass`, zero for static bodies.
    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn restitution(&self) -> f64 {
        self.material.restitution
    }

    pub fn friction(&self) -> f64 {
        self.material.friction
    }

    pub fn geometry(&self) -> &dyn Geometry {
        self.geometry.as_ref()
    }

    pub fn inverse_inertia_tensor0(&self) -> &Mat3 {
        &self.inverse_inertia_tensor0
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// Static bodies always rest.
    pub fn is_resting(&self) -> bool {
        self.is_static() || self.current.is_resting
    }

    /// Committed state.
    pub fn current(&self) -> &RigidBodyState {
        &self.current
    }

    /// Tentative state of the step in progress.
    pub fn next(&self) -> &RigidBodyState {
        &self.next
    }

    pub fn position_ref(&self) -> &Vec3 {
        &self.current.position
    }

    pub fn position_copy(&self) -> Vec3 {
        self.current.position
    }

    pub fn next_world_matrix(&self) -> &WorldMatrix {
        &self.next.world_matrix
    }

    /// Velocity of the committed state at body-local offset `r`.
    pub fn velocity_at_point(&self, r: Vec3) -> Vec3 {
        self.current.velocity_at_point(r)
    }

    /// Velocity of the tentative state at body-local offset `r`.
    pub fn next_velocity_at_point(&self, r: Vec3) -> Vec3 {
        self.next.velocity_at_point(r)
    }

    /// Neighbours whose boxes touched this body's box in the last broad phase.
    pub fn contacting_bodies(&self) -> &[BodyId] {
        &self.contacting_bodies
    }

    pub(crate) fn set_contacting_bodies(&mut self, bodies: Vec<BodyId>) {
        self.contacting_bodies = bodies;
    }

    pub fn pending_impulses(&self) -> &[Impulse] {
        &self.impulses
    }

    pub fn pending_forces(&self) -> &[Force] {
        &self.forces
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Adopts the engine's tunables (AABB padding, history window, resting
    /// thresholds). `config` must already be validated.
    pub(crate) fn configure(&mut self, config: &EngineConfig) {
        self.config = config.clone();
        self.velocity_history.set_capacity(config.history_capacity);
        self.angular_velocity_history
            .set_capacity(config.history_capacity);
        self.refresh_current();
    }

    pub fn set_initial_position(&mut self, position: Vec3) {
        self.current.position = position;
        self.refresh_current();
    }

    pub fn set_initial_orientation(&mut self, rotation: Quat) {
        self.current.rotation = rotation.normalized();
        self.refresh_current();
        self.current.angular_velocity =
            self.current.inverse_inertia_tensor * self.current.angular_momentum;
        self.next.copy_from(&self.current);
    }

    /// Sets the committed linear velocity. No effect on static bodies.
    pub fn set_initial_velocity(&mut self, velocity: Vec3) {
        if self.is_static() {
            return;
        }
        self.current.velocity = velocity;
        self.current.momentum = velocity * self.mass;
        self.next.copy_from(&self.current);
    }

    /// Sets the committed angular velocity. No effect on static bodies.
    pub fn set_initial_angular_velocity(&mut self, angular_velocity: Vec3) {
        if self.is_static() {
            return;
        }
        let r = self.current.rotation_matrix;
        let world_inertia = r * self.inertia_tensor0 * r.transpose();
        self.current.angular_velocity = angular_velocity;
        self.current.angular_momentum = world_inertia * angular_velocity;
        self.next.copy_from(&self.current);
    }

    // -------------------------------------------------------------------------
    // Accumulators
    // -------------------------------------------------------------------------

    /// Queues an impulse, applied whole at the next integration.
    pub fn apply_impulse(&mut self, impulse: Impulse) {
        self.impulses.push(impulse);
    }

    /// Queues `impulse` and folds it into the tentative state at once.
    ///
    /// Contact points solved in sequence see the velocities left by the
    /// earlier ones. A later
    /// [`Self::compute_next_step`] folds the queued impulse again from
    /// `current`, so the two paths agree. No effect on static bodies.
    pub fn apply_contact_impulse(&mut self, impulse: Impulse) {
        if self.is_static() || impulse.is_zero() {
            return;
        }
        self.next.momentum += impulse.force;
        self.next.angular_momentum += impulse.point.cross(&impulse.force);
        self.next.velocity = self.next.momentum * self.inverse_mass;
        self.next.angular_velocity = self.current.inverse_inertia_tensor * self.next.angular_momentum;
        self.next.is_resting = false;
        self.impulses.push(impulse);
    }

    /// Queues a continuous force for the step in progress.
    pub fn apply_force(&mut self, force: Force) {
        self.forces.push(force);
    }

    // -------------------------------------------------------------------------
    // Integration
    // -------------------------------------------------------------------------

    /// Recomputes `next` as `current` advanced by `dt`.
    ///
    /// Static bodies copy `current` unchanged. Resting bodies take impulses
    /// but ignore continuous forces; a non-zero impulse wakes them. The
    /// resting predicate itself only runs at commit.
    pub fn compute_next_step(&mut self, dt: f64) {
        self.next.copy_from(&self.current);
        if self.is_static() {
            return;
        }

        let kicked = SemiImplicitEuler::accumulate(
            &mut self.next,
            &self.impulses,
            &self.forces,
            dt,
            !self.current.is_resting,
        );
        self.next.velocity = self.next.momentum * self.inverse_mass;
        self.next.angular_velocity = self.current.inverse_inertia_tensor * self.next.angular_momentum;
        if kicked {
            self.next.is_resting = false;
        }

        self.next.rotation = SemiImplicitEuler::integrate_rotation(
            self.current.rotation,
            self.current.angular_velocity,
            dt,
        );
        self.next.position =
            SemiImplicitEuler::integrate_position(self.current.position, self.current.velocity, dt);
        self.refresh_next();
    }

    /// Commits `next` as the new `current`, samples the velocity histories,
    /// re-evaluates the resting state and clears the accumulators.
    ///
    /// `neighbors` describes the bodies listed in [`Self::contacting_bodies`].
    pub fn apply_next_step(&mut self, neighbors: &[NeighborMotion]) {
        self.current.copy_from(&self.next);
        self.impulses.clear();
        self.forces.clear();
        if self.is_static() {
            self.current.is_resting = true;
            self.next.copy_from(&self.current);
            return;
        }

        self.commits += 1;
        if self.commits % self.config.history_sample_interval == 0 {
            self.velocity_history.push(self.current.velocity);
            self.angular_velocity_history
                .push(self.current.angular_velocity);
        }

        let was_resting = self.current.is_resting;
        let resting = self.satisfies_resting(neighbors);
        if resting && !was_resting {
            // settle: drop the residual drift so the body stays put
            self.current.momentum = Vec3::ZERO;
            self.current.angular_momentum = Vec3::ZERO;
            self.current.velocity = Vec3::ZERO;
            self.current.angular_velocity = Vec3::ZERO;
        }
        if resting != was_resting {
            trace!(body = %self.id, resting, "resting state changed");
        }
        self.current.is_resting = resting;
        self.next.copy_from(&self.current);
    }

    /// Commits `next` part way through a step, at the instant of an impact.
    ///
    /// Clears the accumulators like [`Self::apply_next_step`] but neither
    /// samples the histories nor re-evaluates resting; the step's final
    /// commit does both.
    pub fn apply_partial_step(&mut self) {
        self.current.copy_from(&self.next);
        self.impulses.clear();
        self.forces.clear();
    }

    /// Moves the tentative state by `offset` without touching velocities.
    pub fn translate_next(&mut self, offset: Vec3) {
        if self.is_static() {
            return;
        }
        self.next.position += offset;
        self.refresh_next();
    }

    /// Resting predicate evaluated on the committed state.
    fn satisfies_resting(&self, neighbors: &[NeighborMotion]) -> bool {
        if self.is_static() {
            return true;
        }
        if self.contacting_bodies.is_empty() {
            return false;
        }
        if !self.velocity_history.is_full() || !self.angular_velocity_history.is_full() {
            return false;
        }

        let config = &self.config;
        if self.velocity_history.variance() >= config.resting_variance_threshold
            || self.angular_velocity_history.variance() >= config.resting_variance_threshold
        {
            return false;
        }
        if self.current.velocity.magnitude() >= config.resting_linear_threshold
            || self.current.angular_velocity.magnitude() >= config.resting_angular_threshold
        {
            return false;
        }

        neighbors
            .iter()
            .filter(|n| !n.is_resting && !n.is_static)
            .all(|n| {
                (self.current.velocity - n.velocity).magnitude() < config.resting_linear_threshold
                    && (self.current.angular_velocity - n.angular_velocity).magnitude()
                        < config.resting_angular_threshold
            })
    }

    fn refresh_current(&mut self) {
        Self::refresh_derived(
            &mut self.current,
            self.geometry.as_ref(),
            &self.inverse_inertia_tensor0,
            self.config.epsilon,
        );
        self.next.copy_from(&self.current);
    }

    fn refresh_next(&mut self) {
        Self::refresh_derived(
            &mut self.next,
            self.geometry.as_ref(),
            &self.inverse_inertia_tensor0,
            self.config.epsilon,
        );
    }

    /// Rebuilds the quantities derived from position and orientation.
    fn refresh_derived(
        state: &mut RigidBodyState,
        geometry: &dyn Geometry,
        inverse_inertia_tensor0: &Mat3,
        padding: f64,
    ) {
        state.rotation_matrix = state.rotation.to_rotation_matrix();
        state.inverse_inertia_tensor =
            SemiImplicitEuler::world_inverse_inertia(&state.rotation_matrix, inverse_inertia_tensor0);
        state.world_matrix = WorldMatrix::new(state.rotation_matrix, state.position);
        // geometry was validated non-empty in `new`
        state.aabb = Aabb::from_points(&geometry.world_vertices(&state.world_matrix))
            .unwrap_or_default()
            .padded(padding);
    }
}

// =============================================================================
// Tests
// =============================================================================
