use thiserror::Error;

use crate::core::Species;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for particle construction, sampling and shower evaluation.
///
/// Construction errors abort the call that triggered them. Interactions with
/// no defined rule are not errors: they surface as
/// [`Reaction::Unhandled`](crate::core::Reaction::Unhandled).
#[derive(Debug, Error)]
pub enum Error {
    /// A species name did not match any entry of the species table.
    #[error("unknown particle type: {0:?}")]
    UnknownParticleType(String),

    /// A requested energy (or kinetic energy / momentum magnitude) is below what
    /// the species' rest mass allows.
    #[error("insufficient energy for {species}: requested {requested} MeV, rest mass {mass} MeV")]
    InsufficientEnergy {
        species: Species,
        requested: f64,
        mass: f64,
    },

    /// A scalar kinematic quantity was given without a direction.
    #[error("{0} given without an accompanying angle pair")]
    MissingAngle(&'static str),

    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A rejection-sampling loop exceeded its retry cap.
    #[error("{what} did not converge after {attempts} attempts")]
    RetryLimit { what: &'static str, attempts: usize },

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O errors (config files).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}
