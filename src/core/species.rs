use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Charged pion rest mass (MeV).
pub const PION_CHARGED_MASS: f64 = 139.57018;
/// Neutral pion rest mass (MeV).
pub const PION_NEUTRAL_MASS: f64 = 134.9766;
/// Muon rest mass (MeV).
pub const MUON_MASS: f64 = 105.658369;
/// Electron rest mass (MeV).
pub const ELECTRON_MASS: f64 = 0.5109989;
/// Proton rest mass (MeV).
pub const PROTON_MASS: f64 = 938.27203;
/// Neutron rest mass (MeV).
pub const NEUTRON_MASS: f64 = 939.56536;

/// Static per-species properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesRecord {
    /// Canonical name.
    pub name: &'static str,
    /// Rest mass (MeV).
    pub mass: f64,
    /// Charge (elementary charge units).
    pub charge: i32,
    /// Mean proper lifetime (s); `None` for stable species.
    pub lifetime: Option<f64>,
}

const fn record(name: &'static str, mass: f64, charge: i32, lifetime: Option<f64>) -> SpeciesRecord {
    SpeciesRecord {
        name,
        mass,
        charge,
        lifetime,
    }
}

/// Closed set of particle species tracked by the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// p+
    Proton,
    /// n0, treated as stable.
    Neutron,
    /// π+
    PionPlus,
    /// π−
    PionMinus,
    /// π0; not propagated, no decay rule.
    PionZero,
    /// μ+
    MuonPlus,
    /// μ−
    MuonMinus,
    /// e−
    Electron,
    /// e+
    Positron,
    /// νe
    ElectronNeutrino,
    /// ν̄e
    ElectronAntineutrino,
    /// νμ
    MuonNeutrino,
    /// ν̄μ
    MuonAntineutrino,
    /// Air target, 78% by number.
    Nitrogen14,
    /// Air target, 21% by number.
    Oxygen16,
    /// Air target, 1% by number.
    Argon40,
    /// Residual of N-14 after emitting a π+.
    Carbon14,
    /// Residual of N-14 after emitting a π−.
    Oxygen14,
    /// Residual of O-16 after emitting a π+.
    Nitrogen16,
    /// Residual of O-16 after emitting a π−; proton emitter.
    Fluorine16,
    /// Daughter of F-16.
    Oxygen15,
    /// Stable daughter of O-15.
    Nitrogen15,
    /// Residual of Ar-40 after emitting a π+.
    Chlorine40,
    /// Residual of Ar-40 after emitting a π−.
    Potassium40,
    /// Stable daughter of K-40.
    Calcium40,
}

impl Species {
    /// Every species, in table order.
    pub const ALL: [Species; 25] = [
        Species::Proton,
        Species::Neutron,
        Species::PionPlus,
        Species::PionMinus,
        Species::PionZero,
        Species::MuonPlus,
        Species::MuonMinus,
        Species::Electron,
        Species::Positron,
        Species::ElectronNeutrino,
        Species::ElectronAntineutrino,
        Species::MuonNeutrino,
        Species::MuonAntineutrino,
        Species::Nitrogen14,
        Species::Oxygen16,
        Species::Argon40,
        Species::Carbon14,
        Species::Oxygen14,
        Species::Nitrogen16,
        Species::Fluorine16,
        Species::Oxygen15,
        Species::Nitrogen15,
        Species::Chlorine40,
        Species::Potassium40,
        Species::Calcium40,
    ];

    /// Static properties of this species.
    pub const fn record(self) -> SpeciesRecord {
        use Species::*;
        match self {
            Proton => record("p+", PROTON_MASS, 1, None),
            Neutron => record("n0", NEUTRON_MASS, 0, None),
            PionPlus => record("pi+", PION_CHARGED_MASS, 1, Some(2.6033e-8)),
            PionMinus => record("pi-", PION_CHARGED_MASS, -1, Some(2.6033e-8)),
            PionZero => record("pi0", PION_NEUTRAL_MASS, 0, Some(8.52e-17)),
            MuonPlus => record("mu+", MUON_MASS, 1, Some(2.1969811e-6)),
            MuonMinus => record("mu-", MUON_MASS, -1, Some(2.1969811e-6)),
            Electron => record("e-", ELECTRON_MASS, -1, None),
            Positron => record("e+", ELECTRON_MASS, 1, None),
            ElectronNeutrino => record("nuE", 0.0, 0, None),
            ElectronAntineutrino => record("nuEBar", 0.0, 0, None),
            MuonNeutrino => record("nuMu", 0.0, 0, None),
            MuonAntineutrino => record("nuMuBar", 0.0, 0, None),
            Nitrogen14 => record("N-14", 13043.781, 7, None),
            Oxygen16 => record("O-16", 14899.169, 8, None),
            Argon40 => record("Ar-40", 37224.724, 18, None),
            Carbon14 => record("C-14", 13043.937, 6, Some(2.6088e11)),
            Oxygen14 => record("O-14", 13048.925, 8, Some(101.88)),
            Nitrogen16 => record("N-16", 14909.590, 7, Some(10.286)),
            Fluorine16 => record("F-16", 14914.586, 9, Some(1.6e-20)),
            Oxygen15 => record("O-15", 13975.267, 8, Some(176.36)),
            Nitrogen15 => record("N-15", 13972.513, 7, None),
            Chlorine40 => record("Cl-40", 37232.201, 17, Some(116.86)),
            Potassium40 => record("K-40", 37226.229, 19, Some(5.6819e16)),
            Calcium40 => record("Ca-40", 37224.918, 20, None),
        }
    }

    /// Canonical name, as printed and as accepted by `FromStr`.
    #[inline]
    pub const fn name(self) -> &'static str {
        self.record().name
    }

    /// Rest mass (MeV).
    #[inline]
    pub const fn mass(self) -> f64 {
        self.record().mass
    }

    /// Charge (e).
    #[inline]
    pub const fn charge(self) -> i32 {
        self.record().charge
    }

    /// Mean proper lifetime (s), `None` when stable.
    #[inline]
    pub const fn lifetime(self) -> Option<f64> {
        self.record().lifetime
    }

    /// Species still subject to propagation: nucleons, charged pions and muons.
    pub const fn is_propagating(self) -> bool {
        matches!(
            self,
            Species::Proton
                | Species::Neutron
                | Species::PionPlus
                | Species::PionMinus
                | Species::MuonPlus
                | Species::MuonMinus
        )
    }

    /// Species that can undergo a hadron-nucleus collision.
    pub const fn is_hadronic(self) -> bool {
        matches!(
            self,
            Species::Proton | Species::Neutron | Species::PionPlus | Species::PionMinus
        )
    }

    /// μ+ or μ−.
    pub const fn is_muon(self) -> bool {
        matches!(self, Species::MuonPlus | Species::MuonMinus)
    }

    /// Air targets, their residuals and the decay daughters.
    pub const fn is_nucleus(self) -> bool {
        matches!(
            self,
            Species::Nitrogen14
                | Species::Oxygen16
                | Species::Argon40
                | Species::Carbon14
                | Species::Oxygen14
                | Species::Nitrogen16
                | Species::Fluorine16
                | Species::Oxygen15
                | Species::Nitrogen15
                | Species::Chlorine40
                | Species::Potassium40
                | Species::Calcium40
        )
    }

    /// Charged pion of the given sign (`charge > 0` → π+), π0 for zero.
    pub const fn pion_with_charge(charge: i32) -> Species {
        if charge > 0 {
            Species::PionPlus
        } else if charge < 0 {
            Species::PionMinus
        } else {
            Species::PionZero
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = Error;

    /// Accepts canonical names (`"pi+"`, `"nuMuBar"`, `"N-14"`) and the usual
    /// long-form aliases (`"proton"`, `"positron"`, `"nitrogen"`, `"oxygen-16"`).
    fn from_str(s: &str) -> Result<Self> {
        if let Some(sp) = Species::ALL.iter().copied().find(|sp| sp.name() == s) {
            return Ok(sp);
        }
        let species = match s.trim().to_ascii_lowercase().as_str() {
            "proton" | "p" => Species::Proton,
            "neutron" | "n" => Species::Neutron,
            "pion+" | "pi_plus" | "positive pion" => Species::PionPlus,
            "pion-" | "pi_minus" | "negative pion" => Species::PionMinus,
            "pion0" | "pi_zero" | "neutral pion" => Species::PionZero,
            "muon+" | "mu_plus" | "antimuon" => Species::MuonPlus,
            "muon-" | "mu_minus" | "muon" => Species::MuonMinus,
            "electron" | "e" => Species::Electron,
            "positron" => Species::Positron,
            "electron neutrino" | "nue" => Species::ElectronNeutrino,
            "electron antineutrino" | "nuebar" => Species::ElectronAntineutrino,
            "muon neutrino" | "numu" => Species::MuonNeutrino,
            "muon antineutrino" | "numubar" => Species::MuonAntineutrino,
            "nitrogen" | "nitrogen-14" | "n14" | "n-14" => Species::Nitrogen14,
            "oxygen" | "oxygen-16" | "o16" | "o-16" => Species::Oxygen16,
            "argon" | "argon-40" | "ar40" | "ar-40" => Species::Argon40,
            "carbon-14" | "c14" | "c-14" => Species::Carbon14,
            "oxygen-14" | "o14" | "o-14" => Species::Oxygen14,
            "nitrogen-16" | "n16" | "n-16" => Species::Nitrogen16,
            "fluorine-16" | "f16" | "f-16" => Species::Fluorine16,
            "oxygen-15" | "o15" | "o-15" => Species::Oxygen15,
            "nitrogen-15" | "n15" | "n-15" => Species::Nitrogen15,
            "chlorine-40" | "cl40" | "cl-40" => Species::Chlorine40,
            "potassium-40" | "k40" | "k-40" => Species::Potassium40,
            "calcium-40" | "ca40" | "ca-40" => Species::Calcium40,
            _ => return Err(Error::UnknownParticleType(s.to_string())),
        };
        Ok(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() -> Result<()> {
        for sp in Species::ALL {
            assert_eq!(sp.name().parse::<Species>()?, sp);
        }
        Ok(())
    }

    #[test]
    fn aliases_resolve() -> Result<()> {
        assert_eq!("proton".parse::<Species>()?, Species::Proton);
        assert_eq!("Nitrogen".parse::<Species>()?, Species::Nitrogen14);
        assert_eq!("positron".parse::<Species>()?, Species::Positron);
        assert_eq!("potassium-40".parse::<Species>()?, Species::Potassium40);
        Ok(())
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "unobtainium".parse::<Species>().unwrap_err();
        assert!(matches!(err, Error::UnknownParticleType(ref s) if s == "unobtainium"));
    }

    #[test]
    fn classification() {
        assert!(Species::Proton.is_propagating() && Species::Proton.is_hadronic());
        assert!(Species::MuonMinus.is_propagating() && !Species::MuonMinus.is_hadronic());
        assert!(!Species::PionZero.is_propagating());
        assert!(Species::Chlorine40.is_nucleus() && !Species::Chlorine40.is_propagating());
        assert!(!Species::Electron.is_propagating());
    }

    #[test]
    fn capture_isotopes_balance_charge() {
        // p + N-14 -> p + pi+ + C-14 etc.
        let n = Species::Nitrogen14.charge();
        assert_eq!(n, Species::Carbon14.charge() + 1);
        assert_eq!(n, Species::Oxygen14.charge() - 1);
        let o = Species::Oxygen16.charge();
        assert_eq!(o, Species::Nitrogen16.charge() + 1);
        assert_eq!(o, Species::Fluorine16.charge() - 1);
        let ar = Species::Argon40.charge();
        assert_eq!(ar, Species::Chlorine40.charge() + 1);
        assert_eq!(ar, Species::Potassium40.charge() - 1);
    }
}
