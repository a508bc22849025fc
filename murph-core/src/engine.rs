//! Simulation engine: owns the bodies and force fields and advances them.
//!
//! One call to [`Engine::update`] runs a whole step:
//!
//! ```text
//! fields ─► compute_next_step(dt) ─► broad phase ─► bisection per contact ─► relax ─► commit
//!  F on       tentative states         grid over       time of impact,         shared   next →
//!  bodies                              next states     impulses, repel         sweeps   current
//! ```
//!
//! Contacts are resolved one after the other in discovery order. Resolving a
//! contact changes the tentative states seen by later contacts sharing a
//! body, so results depend on body insertion order; the order is
//! deterministic.

use hashbrown::HashSet;
use tracing::{debug, trace, warn};

use crate::aabb::Aabb;
use crate::body::{NeighborMotion, RigidBody};
use crate::broad_phase::SpatialHashGrid;
use crate::collision::{
    repel_distances, test_interpenetration, ContactManifold, PenetrationReport,
};
use crate::config::EngineConfig;
use crate::error::{PhysicsError, Result};
use crate::forces::ForceField;
use crate::types::{BodyId, FieldId};

/// Candidate pair from the broad phase, by index into [`Engine::bodies`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: usize,
    pub b: usize,
    /// Intersection of the two tentative boxes at the broad phase. The
    /// narrow phase recomputes it as the bodies move.
    pub overlap: Aabb,
}

/// Rigid-body world.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    bodies: Vec<RigidBody>,
    fields: Vec<(FieldId, Box<dyn ForceField>)>,
    grid: SpatialHashGrid,
    contacts: Vec<Contact>,
    paused: bool,
    nb_contacts: usize,
    next_body_id: u64,
    next_field_id: u64,
    bisection_calls: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// # Errors
    /// Returns [`PhysicsError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            grid: SpatialHashGrid::new(config.spatial_hash_cell_size),
            config,
            bodies: Vec::new(),
            fields: Vec::new(),
            contacts: Vec::new(),
            paused: false,
            nb_contacts: 0,
            next_body_id: 1,
            next_field_id: 1,
            bisection_calls: 0,
        }
    }

    // -------------------------------------------------------------------------
    // Bodies and fields
    // -------------------------------------------------------------------------

    /// Takes ownership of `body` and returns its handle.
    ///
    /// The body adopts the engine configuration.
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        body.set_id(id);
        body.configure(&self.config);
        debug!(%id, mass = body.mass(), position = ?body.position_copy(), "added body");
        self.bodies.push(body);
        id
    }

    /// Removes a body and hands it back. Other bodies keep their order.
    ///
    /// # Errors
    /// Returns [`PhysicsError::BodyNotFound`] for an unknown id.
    pub fn remove_body(&mut self, id: BodyId) -> Result<RigidBody> {
        let index = self.index_of(id).ok_or(PhysicsError::BodyNotFound(id))?;
        debug!(%id, "removed body");
        Ok(self.bodies.remove(index))
    }

    /// Removes every body whose committed position lies outside `bounds`.
    pub fn remove_bodies_outside(&mut self, bounds: &Aabb) -> Vec<RigidBody> {
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.bodies)
            .into_iter()
            .partition(|body| bounds.contains_point(body.position_ref()));
        self.bodies = kept;
        for body in &removed {
            debug!(id = %body.id(), position = ?body.position_copy(), "body left the world");
        }
        removed
    }

    pub fn add_force_field(&mut self, field: Box<dyn ForceField>) -> FieldId {
        let id = FieldId(self.next_field_id);
        self.next_field_id += 1;
        debug!(%id, ?field, "added force field");
        self.fields.push((id, field));
        id
    }

    /// # Errors
    /// Returns [`PhysicsError::FieldNotFound`] for an unknown id.
    pub fn remove_force_field(&mut self, id: FieldId) -> Result<Box<dyn ForceField>> {
        let index = self
            .fields
            .iter()
            .position(|(field_id, _)| *field_id == id)
            .ok_or(PhysicsError::FieldNotFound(id))?;
        debug!(%id, "removed force field");
        Ok(self.fields.remove(index).1)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&RigidBody> {
        self.bodies.iter().find(|body| body.id() == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.bodies.iter_mut().find(|body| body.id() == id)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Broad-phase pairs found by the last step.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn nb_contacts(&self) -> usize {
        self.nb_contacts
    }

    /// Calls into the time-of-impact search during the last step, recursive
    /// ones included.
    pub fn bisection_calls(&self) -> usize {
        self.bisection_calls
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        debug!(paused, "pause state changed");
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|body| body.id() == id)
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advances the world by `dt` seconds. No-op while paused.
    ///
    /// A non-positive or non-finite `dt` is ignored with a warning.
    pub fn update(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            warn!(dt, "ignoring step with invalid time delta");
            return;
        }

        for (_, field) in &self.fields {
            for body in self.bodies.iter_mut() {
                let force = field.compute_force(body);
                body.apply_force(force);
            }
        }

        for body in self.bodies.iter_mut() {
            body.compute_next_step(dt);
        }

        self.find_contacts();
        trace!(bodies = self.bodies.len(), contacts = self.nb_contacts, "broad phase done");

        self.bisection_calls = 0;
        let contacts = std::mem::take(&mut self.contacts);
        for contact in &contacts {
            self.resolve_contact_bisection(contact, 0.0, dt, dt, 0);
        }
        self.relax_contacts(&contacts);
        self.contacts = contacts;

        for index in 0..self.bodies.len() {
            self.commit_body(index);
        }
    }

    /// Rebuilds the grid over tentative states and collects every pair of
    /// bodies whose tentative boxes overlap, each pair once.
    fn find_contacts(&mut self) {
        self.grid.rebuild(&self.bodies);
        self.contacts.clear();

        let mut touching: Vec<Vec<BodyId>> = vec![Vec::new(); self.bodies.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();

        for (i, body) in self.bodies.iter().enumerate() {
            if body.is_static() {
                continue;
            }
            for j in self.grid.neighbors(body) {
                if j == i {
                    continue;
                }
                let other = &self.bodies[j];
                let Some(overlap) = body.next().aabb.intersection_overlap(&other.next().aabb)
                else {
                    continue;
                };
                if !seen.insert((i.min(j), i.max(j))) {
                    continue;
                }
                touching[i].push(other.id());
                touching[j].push(body.id());
                self.contacts.push(Contact { a: i, b: j, overlap });
            }
        }

        for (body, ids) in self.bodies.iter_mut().zip(touching) {
            body.set_contacting_bodies(ids);
        }
        self.nb_contacts = self.contacts.len();
    }

    /// Searches `[tmin, tmax]` for the instant the pair of `contact` touches
    /// and resolves it there.
    ///
    /// The tentative states of both bodies must already be integrated to
    /// `tmax`. Recursion depth is bounded by `max_bisection_depth`; once it is
    /// exceeded the contact is resolved where it stands and repelled apart.
    fn resolve_contact_bisection(
        &mut self,
        contact: &Contact,
        tmin: f64,
        tmax: f64,
        initial: f64,
        depth: u32,
    ) {
        self.bisection_calls += 1;
        let (a, b) = (contact.a, contact.b);
        if self.pair_is_settled(a, b) {
            return;
        }

        let epsilon = self.config.epsilon;
        let report = self.narrow_phase(a, b);
        let max = report.max_penetration;
        let exhausted = depth > self.config.max_bisection_depth;
        trace!(a, b, tmin, tmax, depth, penetration = max, "bisection step");

        if (max > -epsilon && max <= 0.0) || exhausted {
            self.resolve_contact_at(a, b, &report, tmax, initial, exhausted);
        } else if max > 0.0 {
            let tmid = (tmin + tmax) / 2.0;
            self.integrate_pair(a, b, tmid);
            self.resolve_contact_bisection(contact, tmin, tmid, initial, depth + 1);
        } else if max < 0.0 && tmax - tmin < initial {
            let half = (tmax - tmin) / 2.0;
            self.integrate_pair(a, b, tmax + half);
            self.resolve_contact_bisection(contact, tmax, tmax + half, initial, depth + 1);
        }
    }

    /// Answers the contact between bodies `a` and `b` at `time` into a step
    /// of length `step`, then integrates both to the end of the step.
    ///
    /// Only points within `epsilon` of the surface take part, unless the
    /// search ran `exhausted`: the pair then still interpenetrates, every
    /// reported point is answered and the bodies are repelled first.
    fn resolve_contact_at(
        &mut self,
        a: usize,
        b: usize,
        report: &PenetrationReport,
        time: f64,
        step: f64,
        exhausted: bool,
    ) {
        let epsilon = self.config.epsilon;
        let mut manifold = ContactManifold::from_report(
            report,
            &self.bodies[a],
            &self.bodies[b],
            |depth| exhausted || depth.abs() <= epsilon,
        );
        if exhausted {
            debug!(
                a = %self.bodies[a].id(),
                b = %self.bodies[b].id(),
                penetration = report.max_penetration,
                "bisection budget exhausted, repelling"
            );
            self.repel(a, b);
        }

        let (body_a, body_b) = pair_mut(&mut self.bodies, a, b);
        // the trajectory up to the impact is final
        body_a.apply_partial_step();
        body_b.apply_partial_step();

        manifold.prepare_restitution(body_a, body_b, self.config.bounce_threshold);
        manifold.apply_friction(body_a, body_b, epsilon);
        for _ in 0..self.config.solver_iterations {
            manifold.solve_normal(body_a, body_b);
        }
        trace!(
            a = %body_a.id(),
            b = %body_b.id(),
            time,
            points = manifold.len(),
            impulse = manifold.total_impulse(),
            "contact resolved"
        );

        body_a.compute_next_step(step - time);
        body_b.compute_next_step(step - time);
        self.repel(a, b);
    }

    /// Final sweeps over every pair still touching at the end of the step.
    ///
    /// Contacts are resolved one pair at a time, so the impulse that stops
    /// the top of a stack can push the body below it back into the ground.
    /// These sweeps share the load across pairs. They aim at zero separation
    /// speed and never pull, so a bounce resolved earlier is left alone.
    fn relax_contacts(&mut self, contacts: &[Contact]) {
        let mut manifolds = Vec::new();
        for contact in contacts {
            let (a, b) = (contact.a, contact.b);
            if self.pair_is_settled(a, b) {
                continue;
            }
            let report = self.narrow_phase(a, b);
            let manifold =
                ContactManifold::from_report(&report, &self.bodies[a], &self.bodies[b], |_| true);
            if !manifold.is_empty() {
                manifolds.push((a, b, manifold));
            }
        }

        for _ in 0..self.config.solver_iterations {
            for (a, b, manifold) in manifolds.iter_mut() {
                let (body_a, body_b) = pair_mut(&mut self.bodies, *a, *b);
                manifold.solve_normal(body_a, body_b);
            }
        }
        trace!(pairs = manifolds.len(), "contacts relaxed");
    }

    /// Pairs the solver leaves alone: both static, or both resting.
    fn pair_is_settled(&self, a: usize, b: usize) -> bool {
        let (body_a, body_b) = (&self.bodies[a], &self.bodies[b]);
        (body_a.is_static() && body_b.is_static()) || (body_a.is_resting() && body_b.is_resting())
    }

    /// Penetration test of bodies `a` and `b` over the overlap of their
    /// tentative boxes as they are now. Empty when the boxes are apart.
    fn narrow_phase(&self, a: usize, b: usize) -> PenetrationReport {
        let (body_a, body_b) = (&self.bodies[a], &self.bodies[b]);
        match body_a.next().aabb.intersection_overlap(&body_b.next().aabb) {
            Some(overlap) => test_interpenetration(body_a, body_b, &overlap, self.config.epsilon),
            None => PenetrationReport::empty(),
        }
    }

    fn integrate_pair(&mut self, a: usize, b: usize, dt: f64) {
        self.bodies[a].compute_next_step(dt);
        self.bodies[b].compute_next_step(dt);
    }

    /// Pushes bodies `a` and `b` apart along the normal of their deepest
    /// contact if the tentative states still interpenetrate.
    fn repel(&mut self, a: usize, b: usize) {
        let report = self.narrow_phase(a, b);
        if report.max_penetration <= 0.0 {
            return;
        }
        let Some(deepest) = report.deepest() else {
            return;
        };
        let normal = report.normals[deepest];

        let (body_a, body_b) = pair_mut(&mut self.bodies, a, b);
        let (distance_a, distance_b) = repel_distances(body_a, body_b, report.max_penetration);
        body_a.translate_next(-normal * distance_a);
        body_b.translate_next(normal * distance_b);
        debug!(
            a = %body_a.id(),
            b = %body_b.id(),
            distance_a,
            distance_b,
            "repelled"
        );
    }

    /// Commits the tentative state of body `index`.
    fn commit_body(&mut self, index: usize) {
        let neighbors = self.neighbor_motions(index);
        self.bodies[index].apply_next_step(&neighbors);
    }

    /// Motion of the contacting bodies of body `index` that still exist.
    fn neighbor_motions(&self, index: usize) -> Vec<NeighborMotion> {
        self.bodies[index]
            .contacting_bodies()
            .iter()
            .filter_map(|id| self.body(*id))
            .map(NeighborMotion::of)
            .collect()
    }
}

/// Two distinct bodies borrowed mutably at once.
fn pair_mut(bodies: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(a, b);
    if a < b {
        let (head, tail) = bodies.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

// =============================================================================
// Tests
// =============================================================================
