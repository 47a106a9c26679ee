use airshower::config::ShowerConfig;
use airshower::core::{Direction, EnergySpec, PrimaryOptions, Shower};
use airshower::summary::{lateral_radii, muon_count, scale_value, MUON_COUNT_CUT};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use std::path::PathBuf;

/// Run one air shower and print the muons that reach the ground.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration; may also carry a `primary:` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed (overrides the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fixed primary kinetic energy in MeV
    #[arg(short, long, conflicts_with = "min_energy")]
    energy: Option<f64>,

    /// Lower edge of the primary spectrum in MeV
    #[arg(long)]
    min_energy: Option<f64>,

    /// Isotropic downward arrival instead of straight down
    #[arg(long)]
    isotropic: bool,

    /// Ground height in metres
    #[arg(long)]
    floor: Option<f64>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print one JSON object per muon instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrimarySection {
    primary: PrimaryOptions,
}

/// Read the config file, if any, and apply the flag overrides.
fn load(args: &Args) -> Result<(ShowerConfig, PrimaryOptions)> {
    let (mut config, mut primary) = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config = ShowerConfig::from_yaml_str(&text)?;
            let section: PrimarySection = serde_yaml::from_str(&text)?;
            (config, section.primary)
        }
        None => (ShowerConfig::default(), PrimaryOptions::default()),
    };

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(floor) = args.floor {
        config.floor = floor;
    }
    if let Some(cap) = args.max_iterations {
        config.max_iterations = cap;
    }
    if let Some(ke) = args.energy {
        primary.energy = EnergySpec::Fixed(ke);
    } else if let Some(minimum) = args.min_energy {
        primary.energy = EnergySpec::PowerLaw { minimum };
    }
    if args.isotropic {
        primary.direction = Direction::Isotropic;
    }
    Ok((config, primary))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let (config, options) = load(&args)?;

    let mut shower = Shower::new(config)?;
    let primary = shower.generate_primary(&options)?;
    let (energy, prefix) = scale_value(primary.kinetic_energy(), 1e6);
    log::info!(
        "primary {} with {energy:.2} {prefix}eV at zenith {:.3} rad",
        primary.species,
        primary.zenith()
    );

    let outcome = shower.generate_shower(primary)?;
    let radii = lateral_radii(outcome.muons(), None);
    let max_radius = radii.iter().copied().fold(0.0, f64::max);
    log::info!(
        "{} muons at ground ({} above {MUON_COUNT_CUT} MeV), widest at {max_radius:.1} m; {} iterations{}",
        outcome.muons().len(),
        muon_count(outcome.muons(), MUON_COUNT_CUT),
        outcome.iterations,
        if outcome.capped { " (capped)" } else { "" },
    );
    if outcome.unhandled > 0 {
        log::warn!("{} interactions had no rule", outcome.unhandled);
    }

    if args.json {
        for muon in outcome.muons() {
            println!("{}", serde_json::to_string(muon)?);
        }
    } else {
        println!(
            "{:>8} {:>6} {:>12} {:>12} {:>12} {:>12}",
            "id", "type", "x [m]", "y [m]", "KE [MeV]", "zenith"
        );
        for muon in outcome.muons() {
            println!(
                "{:>8} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>12.4}",
                muon.id,
                muon.species.name(),
                muon.position.x,
                muon.position.y,
                muon.kinetic_energy(),
                muon.zenith()
            );
        }
    }
    Ok(())
}
