use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::ShowerConfig;
use crate::core::{Direction, EnergySpec, Particle, PrimaryOptions, Shower};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Rows of `f(particle)` as an (N, 3) float64 array.
fn rows<'py>(
    py: Python<'py>,
    particles: &[Particle],
    f: impl Fn(&Particle) -> [f64; 3],
) -> Py<PyArray2<f64>> {
    let mut arr = Array2::<f64>::zeros((particles.len(), 3));
    for (i, p) in particles.iter().enumerate() {
        for (k, v) in f(p).into_iter().enumerate() {
            arr[[i, k]] = v;
        }
    }
    arr.into_pyarray(py).to_owned().into()
}

/// Python-facing air-shower generator.
///
/// API:
/// - __new__(seed=None, floor=0.0, max_iterations=1000, config=None)
/// - generate(energy=None, min_energy=100.0, height=500000.0, isotropic=False)
///   -> (positions, momenta), each an np.ndarray of shape (N, 3)
#[pyclass]
pub struct ShowerEngine {
    shower: Shower,
    last_iterations: usize,
    last_capped: bool,
}

#[pymethods]
impl ShowerEngine {
    /// Create a generator with its own random stream.
    ///
    /// Parameters
    /// - seed: RNG seed (int) for reproducibility; None for nondeterministic
    /// - floor: ground height (m); muons below it are reported
    /// - max_iterations: cap on propagate/interact passes per shower
    /// - config: optional path to a YAML configuration; `seed`, `floor` and
    ///   `max_iterations` override what it sets
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (seed=None, floor=0.0, max_iterations=1000, config=None))]
    fn new(
        seed: Option<u64>,
        floor: f64,
        max_iterations: usize,
        config: Option<String>,
    ) -> PyResult<Self> {
        let mut cfg = match config {
            Some(path) => ShowerConfig::from_yaml_file(path).map_err(py_err)?,
            None => ShowerConfig::default(),
        };
        cfg.seed = seed.or(cfg.seed);
        cfg.floor = floor;
        cfg.max_iterations = max_iterations;
        let shower = Shower::new(cfg).map_err(py_err)?;
        Ok(Self {
            shower,
            last_iterations: 0,
            last_capped: false,
        })
    }

    /// Run one shower and return the ground-level muons (releases the GIL
    /// while the shower runs).
    ///
    /// Parameters
    /// - energy: fixed kinetic energy (MeV); None draws from the E^-2.7 spectrum
    /// - min_energy: spectrum floor (MeV) when `energy` is None
    /// - height: starting height (m)
    /// - isotropic: isotropic downward arrival instead of straight down
    ///
    /// Returns: (positions [m], momenta [MeV/c]) as (N, 3) float64 arrays.
    #[pyo3(signature = (energy=None, min_energy=100.0, height=500000.0, isotropic=false))]
    fn generate(
        &mut self,
        py: Python<'_>,
        energy: Option<f64>,
        min_energy: f64,
        height: f64,
        isotropic: bool,
    ) -> PyResult<(Py<PyArray2<f64>>, Py<PyArray2<f64>>)> {
        let options = PrimaryOptions {
            height,
            energy: match energy {
                Some(ke) => EnergySpec::Fixed(ke),
                None => EnergySpec::PowerLaw {
                    minimum: min_energy,
                },
            },
            direction: if isotropic {
                Direction::Isotropic
            } else {
                Direction::Down
            },
            ..PrimaryOptions::default()
        };
        let shower = &mut self.shower;
        let outcome = py.detach(|| shower.run(&options)).map_err(py_err)?;
        self.last_iterations = outcome.iterations;
        self.last_capped = outcome.capped;

        let muons = outcome.muons();
        let positions = rows(py, muons, |p| p.position.into());
        let momenta = rows(py, muons, |p| p.momentum.into());
        Ok((positions, momenta))
    }

    /// Iterations used by the most recent shower.
    #[getter]
    fn last_iterations(&self) -> usize {
        self.last_iterations
    }

    /// Whether the most recent shower hit the iteration cap.
    #[getter]
    fn last_capped(&self) -> bool {
        self.last_capped
    }
}

/// The airshower Python module entry point.
#[pymodule]
fn airshower(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ShowerEngine>()?;
    Ok(())
}
