//! Monte Carlo simulation of hadron-initiated air showers.
//!
//! A primary (by default a proton) enters an exponential atmosphere, collides
//! with air nuclei and decays until no propagating particle is left inside
//! the tracked band. The muons that reach the floor are the result.
//!
//! ```no_run
//! use airshower::config::ShowerConfig;
//! use airshower::core::{PrimaryOptions, Shower};
//!
//! # fn main() -> airshower::error::Result<()> {
//! let mut shower = Shower::new(ShowerConfig { seed: Some(1), ..Default::default() })?;
//! let outcome = shower.run(&PrimaryOptions::default())?;
//! println!("{} muons reached the ground", outcome.muons().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod summary;

#[cfg(feature = "python")]
mod python;
