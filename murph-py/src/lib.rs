//! Python bindings for the murph-core rigid-body engine.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from murph_physics import Simulation
//!
//! sim = Simulation()
//! sim.add_gravity()
//! sim.add_cuboid(20.0, 1.0, 20.0, 0.0, 0.0, -0.5, 0.0)
//! ball = sim.add_sphere(0.5, 1.0, 0.3, 5.0, -0.2, restitution=0.7)
//!
//! for _ in range(240):
//!     sim.step(1.0 / 240.0)
//!     pos = sim.body_position(ball)
//!     print(f"Ball at ({pos.x}, {pos.y}, {pos.z})")
//! ```

use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use murph_core::{
    factory, BodyId, Engine, EngineConfig, FieldId, Impulse, Material, PhysicsError,
    PointAttractorField, RigidBody, UniformDirectionalField, Vec3 as CoreVec3,
};

/// 3D vector for positions, velocities, etc.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec3 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub z: f64,
}

#[pymethods]
impl Vec3 {
    #[new]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn __repr__(&self) -> String {
        format!("Vec3({:.4}, {:.4}, {:.4})", self.x, self.y, self.z)
    }

    fn magnitude(&self) -> f64 {
        CoreVec3::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl From<CoreVec3> for Vec3 {
    fn from(v: CoreVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3> for CoreVec3 {
    fn from(v: Vec3) -> Self {
        CoreVec3::new(v.x, v.y, v.z)
    }
}

/// Lookups become `KeyError`, I/O `IOError`, everything else `ValueError`.
fn to_py_err(err: PhysicsError) -> PyErr {
    match err {
        PhysicsError::BodyNotFound(_)
        | PhysicsError::FieldNotFound(_)
        | PhysicsError::MaterialNotFound(_) => PyKeyError::new_err(err.to_string()),
        PhysicsError::Io(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Main simulation class.
///
/// Owns an engine; bodies and force fields are referred to by integer ids.
#[pyclass]
pub struct Simulation {
    engine: Engine,
    time: f64,
}

impl Simulation {
    fn body(&self, id: u64) -> PyResult<&RigidBody> {
        self.engine
            .body(BodyId(id))
            .ok_or_else(|| to_py_err(PhysicsError::BodyNotFound(BodyId(id))))
    }

    fn add_at(&mut self, body: PyResult<RigidBody>, x: f64, y: f64, z: f64) -> PyResult<u64> {
        let mut body = body?;
        body.set_initial_position(CoreVec3::new(x, y, z));
        Ok(self.engine.add_body(body).0)
    }
}

#[pymethods]
impl Simulation {
    /// Create a simulation, optionally reading tunables from a YAML file.
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<&str>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => EngineConfig::load(path).map_err(to_py_err)?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            engine: Engine::with_config(config).map_err(to_py_err)?,
            time: 0.0,
        })
    }

    /// Simulated time in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.time
    }

    #[getter]
    fn paused(&self) -> bool {
        self.engine.paused()
    }

    /// Broad-phase contacts of the last step.
    #[getter]
    fn nb_contacts(&self) -> usize {
        self.engine.nb_contacts()
    }

    /// Time-of-impact search entries during the last step.
    #[getter]
    fn bisection_calls(&self) -> usize {
        self.engine.bisection_calls()
    }

    /// Add a box of edge lengths (sx, sy, sz) centred at (x, y, z).
    ///
    /// A mass of 0 makes it static. Returns the body id.
    #[pyo3(signature = (sx, sy, sz, mass, x, y, z, restitution=0.5, friction=0.3))]
    #[allow(clippy::too_many_arguments)]
    fn add_cuboid(
        &mut self,
        sx: f64,
        sy: f64,
        sz: f64,
        mass: f64,
        x: f64,
        y: f64,
        z: f64,
        restitution: f64,
        friction: f64,
    ) -> PyResult<u64> {
        let body = factory::cuboid(
            CoreVec3::new(sx, sy, sz),
            mass,
            Material::new(restitution, friction),
        )
        .map_err(to_py_err);
        self.add_at(body, x, y, z)
    }

    /// Add a sphere centred at (x, y, z). Returns the body id.
    #[pyo3(signature = (radius, mass, x, y, z, restitution=0.5, friction=0.3))]
    #[allow(clippy::too_many_arguments)]
    fn add_sphere(
        &mut self,
        radius: f64,
        mass: f64,
        x: f64,
        y: f64,
        z: f64,
        restitution: f64,
        friction: f64,
    ) -> PyResult<u64> {
        let body = factory::sphere(radius, mass, Material::new(restitution, friction))
            .map_err(to_py_err);
        self.add_at(body, x, y, z)
    }

    /// Add uniform gravity of strength g along -Y. Returns the field id.
    #[pyo3(signature = (g=9.81))]
    fn add_gravity(&mut self, g: f64) -> u64 {
        let field = UniformDirectionalField::new(CoreVec3::new(0.0, -g, 0.0));
        self.engine.add_force_field(Box::new(field)).0
    }

    /// Add an inverse-square attractor at (x, y, z). Returns the field id.
    fn add_attractor(&mut self, x: f64, y: f64, z: f64, strength: f64) -> u64 {
        let field = PointAttractorField::new(CoreVec3::new(x, y, z), strength);
        self.engine.add_force_field(Box::new(field)).0
    }

    fn remove_body(&mut self, id: u64) -> PyResult<()> {
        self.engine
            .remove_body(BodyId(id))
            .map(|_| ())
            .map_err(to_py_err)
    }

    fn remove_field(&mut self, id: u64) -> PyResult<()> {
        self.engine
            .remove_force_field(FieldId(id))
            .map(|_| ())
            .map_err(to_py_err)
    }

    /// Queue an impulse (N·s) on a body, applied at offset (rx, ry, rz)
    /// from its centre.
    #[pyo3(signature = (id, fx, fy, fz, rx=0.0, ry=0.0, rz=0.0))]
    #[allow(clippy::too_many_arguments)]
    fn apply_impulse(
        &mut self,
        id: u64,
        fx: f64,
        fy: f64,
        fz: f64,
        rx: f64,
        ry: f64,
        rz: f64,
    ) -> PyResult<()> {
        let body = self
            .engine
            .body_mut(BodyId(id))
            .ok_or_else(|| to_py_err(PhysicsError::BodyNotFound(BodyId(id))))?;
        body.apply_impulse(Impulse::new(
            CoreVec3::new(fx, fy, fz),
            CoreVec3::new(rx, ry, rz),
        ));
        Ok(())
    }

    fn toggle_pause(&mut self) {
        self.engine.toggle_pause();
    }

    /// Advance simulation by dt seconds.
    fn step(&mut self, dt: f64) {
        if self.engine.paused() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.engine.update(dt);
        self.time += dt;
    }

    /// Run multiple steps at once (more efficient).
    fn step_n(&mut self, dt: f64, steps: usize) {
        for _ in 0..steps {
            self.step(dt);
        }
    }

    fn body_position(&self, id: u64) -> PyResult<Vec3> {
        Ok(self.body(id)?.position_copy().into())
    }

    fn body_velocity(&self, id: u64) -> PyResult<Vec3> {
        Ok(self.body(id)?.current().velocity.into())
    }

    fn body_is_resting(&self, id: u64) -> PyResult<bool> {
        Ok(self.body(id)?.is_resting())
    }

    /// Get current state as dict for easy inspection.
    fn state_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("time", self.time)?;
        dict.set_item("paused", self.engine.paused())?;
        dict.set_item("nb_contacts", self.engine.nb_contacts())?;

        let bodies = PyList::empty(py);
        for body in self.engine.bodies() {
            let state = body.current();
            let entry = PyDict::new(py);
            entry.set_item("id", body.id().0)?;
            entry.set_item("position", Vec3::from(state.position).to_tuple())?;
            entry.set_item("velocity", Vec3::from(state.velocity).to_tuple())?;
            entry.set_item(
                "angular_velocity",
                Vec3::from(state.angular_velocity).to_tuple(),
            )?;
            entry.set_item("resting", body.is_resting())?;
            entry.set_item("static", body.is_static())?;
            bodies.append(entry)?;
        }
        dict.set_item("bodies", bodies)?;
        Ok(dict)
    }
}

/// Python module definition.
#[pymodule]
fn murph_physics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec3>()?;
    m.add_class::<Simulation>()?;
    Ok(())
}
