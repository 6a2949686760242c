//! Simulation Parameters
//!
//! Parameter set for a single simulation call, the symbolic options it
//! carries, and the validator that maps them to the numeric codes expected
//! by the native kernels.
//!
//! # Characteristic Frequency Ranges
//!
//! | Species | CF range |
//! |---------|----------|
//! | Cat | 125 Hz – 40 kHz |
//! | Human (Shera, Glasberg & Moore) | 125 Hz – 20 kHz |
//!
//! # Example
//!
//! ```rust
//! use an_model_core::params::{FiberType, SimulationParameters, Species};
//!
//! let params = SimulationParameters {
//!     cf_hz: 39_000.0,
//!     species: Species::Cat,
//!     fiber_type: FiberType::LowSpont,
//!     ..Default::default()
//! };
//!
//! let validated = params.validate().unwrap();
//! assert_eq!(validated.species_code, 1);
//! assert!((validated.spont - 0.1).abs() < 1e-12);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

// ============================================================================
// Constants
// ============================================================================

/// Lowest CF accepted for any species (Hz)
pub const MIN_CF_HZ: f64 = 125.0;
/// Highest CF accepted for cat (Hz)
pub const MAX_CF_CAT_HZ: f64 = 40_000.0;
/// Highest CF accepted for either human variant (Hz)
pub const MAX_CF_HUMAN_HZ: f64 = 20_000.0;
/// Sample rate below which the kernels lose time resolution (Hz)
pub const RECOMMENDED_SAMPLE_RATE_HZ: f64 = 100_000.0;

// ============================================================================
// Species
// ============================================================================

/// Species whose cochlear tuning the model uses
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Cat
    #[serde(rename = "cat")]
    Cat,
    /// Human, Shera et al. (2002) tuning
    #[default]
    #[serde(rename = "human")]
    HumanShera,
    /// Human, Glasberg & Moore (1990) tuning
    #[serde(rename = "human-glasberg")]
    HumanGlasberg,
}

impl Species {
    /// Numeric species code understood by the hair-cell kernel
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Cat => 1,
            Self::HumanShera => 2,
            Self::HumanGlasberg => 3,
        }
    }

    /// Accepted CF range in Hz (inclusive)
    #[inline]
    #[must_use]
    pub const fn cf_range_hz(self) -> (f64, f64) {
        match self {
            Self::Cat => (MIN_CF_HZ, MAX_CF_CAT_HZ),
            Self::HumanShera | Self::HumanGlasberg => (MIN_CF_HZ, MAX_CF_HUMAN_HZ),
        }
    }

    /// Symbol used in configuration files and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::HumanShera => "human",
            Self::HumanGlasberg => "human-glasberg",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cat" => Ok(Self::Cat),
            "human" => Ok(Self::HumanShera),
            "human-glasberg" => Ok(Self::HumanGlasberg),
            other => Err(ModelError::invalid(
                "species",
                format!("'{other}' is not one of [cat, human, human-glasberg]"),
            )),
        }
    }
}

// ============================================================================
// Fiber Type
// ============================================================================

/// Auditory-nerve fiber class, by spontaneous rate
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiberType {
    /// High spontaneous rate
    #[default]
    #[serde(rename = "hsr")]
    HighSpont,
    /// Medium spontaneous rate
    #[serde(rename = "msr")]
    MediumSpont,
    /// Low spontaneous rate
    #[serde(rename = "lsr")]
    LowSpont,
}

impl FiberType {
    /// Spontaneous rate in spikes/s
    #[inline]
    #[must_use]
    pub const fn spont_rate(self) -> f64 {
        match self {
            Self::HighSpont => 100.0,
            Self::MediumSpont => 4.0,
            Self::LowSpont => 0.1,
        }
    }

    /// Standard deviation applied to the adaptation noise
    #[inline]
    #[must_use]
    pub const fn noise_sigma(self) -> f64 {
        match self {
            Self::HighSpont => 200.0,
            Self::MediumSpont => 30.0,
            Self::LowSpont => 3.0,
        }
    }

    /// Symbol used in configuration files and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighSpont => "hsr",
            Self::MediumSpont => "msr",
            Self::LowSpont => "lsr",
        }
    }
}

impl fmt::Display for FiberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FiberType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hsr" => Ok(Self::HighSpont),
            "msr" => Ok(Self::MediumSpont),
            "lsr" => Ok(Self::LowSpont),
            other => Err(ModelError::invalid(
                "fiber_type",
                format!("'{other}' is not one of [hsr, msr, lsr]"),
            )),
        }
    }
}

// ============================================================================
// Power-Law Adaptation
// ============================================================================

/// Implementation of the synapse's power-law adaptation
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerLaw {
    /// Full convolution with the power-law kernel
    #[default]
    #[serde(rename = "true")]
    Exact,
    /// IIR approximation of the power-law kernel
    #[serde(rename = "approx")]
    Approximate,
}

impl PowerLaw {
    /// Implementation code understood by the synapse kernel
    #[inline]
    #[must_use]
    pub const fn code(self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::Approximate => 0.0,
        }
    }

    /// Symbol used in configuration files and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "true",
            Self::Approximate => "approx",
        }
    }
}

impl fmt::Display for PowerLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerLaw {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "exact" => Ok(Self::Exact),
            "approx" | "approximate" => Ok(Self::Approximate),
            other => Err(ModelError::invalid(
                "power_law",
                format!("'{other}' is not one of [true, approx]"),
            )),
        }
    }
}

// ============================================================================
// Noise Type
// ============================================================================

/// Noise driving the slow power-law adaptation path
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseType {
    /// No noise (zeros)
    #[serde(rename = "none")]
    None,
    /// Freshly synthesized fractional Gaussian noise on every call
    #[default]
    #[serde(rename = "fresh")]
    Fresh,
}

impl NoiseType {
    /// Symbol used in configuration files and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fresh => "fresh",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "fresh" => Ok(Self::Fresh),
            other => Err(ModelError::invalid(
                "noise",
                format!("'{other}' is not one of [none, fresh]"),
            )),
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Parameters for one simulation call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Characteristic frequency (Hz)
    pub cf_hz: f64,
    /// Number of stimulus repetitions
    pub nrep: usize,
    /// Sample rate of the waveform (Hz)
    pub sample_rate_hz: f64,
    /// Outer hair-cell health, 1.0 = normal
    pub cohc: f64,
    /// Inner hair-cell health, 1.0 = normal
    pub cihc: f64,
    /// Species tuning
    pub species: Species,
    /// Fiber class
    pub fiber_type: FiberType,
    /// Power-law adaptation implementation
    pub power_law: PowerLaw,
    /// Adaptation noise
    pub noise: NoiseType,
    /// Silence appended to each repetition (s)
    pub extra_time_s: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            cf_hz: 1000.0,
            nrep: 1,
            sample_rate_hz: 100e3,
            cohc: 1.0,
            cihc: 1.0,
            species: Species::HumanShera,
            fiber_type: FiberType::HighSpont,
            power_law: PowerLaw::Exact,
            noise: NoiseType::Fresh,
            extra_time_s: 0.0,
        }
    }
}

impl SimulationParameters {
    /// Time step of the waveform (s)
    #[inline]
    #[must_use]
    pub fn tdres(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// Check every parameter and map the symbolic options to engine codes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] for the first parameter that
    /// is out of range.
    pub fn validate(&self) -> ModelResult<ValidatedParameters> {
        if self.nrep < 1 {
            return Err(ModelError::invalid("nrep", "repetition count must be at least 1"));
        }

        check_unit_interval("cohc", self.cohc)?;
        check_unit_interval("cihc", self.cihc)?;

        let (min_cf, max_cf) = self.species.cf_range_hz();
        if !(min_cf..=max_cf).contains(&self.cf_hz) {
            return Err(ModelError::invalid(
                "cf_hz",
                format!(
                    "{} Hz is outside [{min_cf}, {max_cf}] Hz for species {}",
                    self.cf_hz, self.species
                ),
            ));
        }

        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ModelError::invalid(
                "sample_rate_hz",
                format!("{} Hz is not a positive sample rate", self.sample_rate_hz),
            ));
        }

        if !self.extra_time_s.is_finite() || self.extra_time_s < 0.0 {
            return Err(ModelError::invalid(
                "extra_time_s",
                format!("{} s is not a non-negative duration", self.extra_time_s),
            ));
        }

        let mut advisories = Vec::new();
        if self.sample_rate_hz < RECOMMENDED_SAMPLE_RATE_HZ {
            advisories.push(Advisory::LowTimeResolution { sample_rate_hz: self.sample_rate_hz });
        }

        Ok(ValidatedParameters {
            params: self.clone(),
            species_code: self.species.code(),
            spont: self.fiber_type.spont_rate(),
            implnt: self.power_law.code(),
            advisories,
        })
    }
}

fn check_unit_interval(parameter: &'static str, value: f64) -> ModelResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::invalid(parameter, format!("{value} is outside [0, 1]")))
    }
}

// ============================================================================
// Validation Output
// ============================================================================

/// Non-fatal notice produced during validation
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    /// Sample rate is below the recommended 100 kHz
    LowTimeResolution {
        /// Requested sample rate (Hz)
        sample_rate_hz: f64,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowTimeResolution { sample_rate_hz } => write!(
                f,
                "time-domain resolution is less than recommended: {sample_rate_hz} Hz \
                 (sampling rate > 100 kHz, sampling period < 1e-5 s)"
            ),
        }
    }
}

/// Parameters that passed validation, with their engine codes
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedParameters {
    /// The checked parameters
    pub params: SimulationParameters,
    /// Species code for the hair-cell kernel
    pub species_code: i32,
    /// Spontaneous rate for the synapse kernel (spikes/s)
    pub spont: f64,
    /// Power-law implementation code for the synapse kernel
    pub implnt: f64,
    /// Non-fatal notices
    pub advisories: Vec<Advisory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_at(cf_hz: f64) -> SimulationParameters {
        SimulationParameters { cf_hz, species: Species::Cat, ..Default::default() }
    }

    #[test]
    fn test_cf_range_depends_on_species() {
        assert!(cat_at(39_000.0).validate().is_ok());

        let human = SimulationParameters { cf_hz: 39_000.0, ..Default::default() };
        let err = human.validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter { parameter: "cf_hz", .. }));

        let glasberg = SimulationParameters {
            cf_hz: 20_000.0,
            species: Species::HumanGlasberg,
            ..Default::default()
        };
        assert!(glasberg.validate().is_ok());

        assert!(cat_at(124.9).validate().is_err());
        assert!(cat_at(40_000.0).validate().is_ok());
        assert!(cat_at(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_health_factors() {
        let bad = SimulationParameters { cohc: 1.5, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ModelError::InvalidParameter { parameter: "cohc", .. })
        ));

        for cohc in [0.0, 1.0] {
            let ok = SimulationParameters { cohc, ..Default::default() };
            assert!(ok.validate().is_ok());
        }

        let bad = SimulationParameters { cihc: -0.01, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ModelError::InvalidParameter { parameter: "cihc", .. })
        ));

        let nan = SimulationParameters { cihc: f64::NAN, ..Default::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_repetitions() {
        let bad = SimulationParameters { nrep: 0, ..Default::default() };
        assert!(matches!(
            bad.validate(),
            Err(ModelError::InvalidParameter { parameter: "nrep", .. })
        ));
    }

    #[test]
    fn test_sample_rate_and_extra_time() {
        for fs in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let bad = SimulationParameters { sample_rate_hz: fs, ..Default::default() };
            assert!(bad.validate().is_err(), "fs = {fs} should be rejected");
        }

        let bad = SimulationParameters { extra_time_s: -0.1, ..Default::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_low_sample_rate_is_advisory() {
        let params = SimulationParameters { sample_rate_hz: 50e3, ..Default::default() };
        let validated = params.validate().unwrap();
        assert_eq!(
            validated.advisories,
            vec![Advisory::LowTimeResolution { sample_rate_hz: 50e3 }]
        );

        let validated = SimulationParameters::default().validate().unwrap();
        assert!(validated.advisories.is_empty());
    }

    #[test]
    fn test_code_mapping() {
        let spont = |s: &str| s.parse::<FiberType>().map(FiberType::spont_rate);
        assert_eq!(spont("hsr").unwrap(), 100.0);
        assert_eq!(spont("msr").unwrap(), 4.0);
        assert_eq!(spont("lsr").unwrap(), 0.1);
        assert!(spont("xsr").unwrap_err().is_invalid_parameter());

        assert_eq!("true".parse::<PowerLaw>().unwrap().code(), 1.0);
        assert_eq!("approx".parse::<PowerLaw>().unwrap().code(), 0.0);
        assert!("maybe".parse::<PowerLaw>().is_err());

        assert_eq!("cat".parse::<Species>().unwrap().code(), 1);
        assert_eq!("human".parse::<Species>().unwrap().code(), 2);
        assert_eq!("human-glasberg".parse::<Species>().unwrap().code(), 3);
        assert!("dog".parse::<Species>().is_err());

        assert_eq!("none".parse::<NoiseType>().unwrap(), NoiseType::None);
        assert!("frozen".parse::<NoiseType>().is_err());

        let validated = SimulationParameters {
            fiber_type: FiberType::MediumSpont,
            power_law: PowerLaw::Approximate,
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(validated.species_code, 2);
        assert_eq!(validated.spont, 4.0);
        assert_eq!(validated.implnt, 0.0);
    }

    #[test]
    fn test_symbols_round_trip_through_display() {
        for species in [Species::Cat, Species::HumanShera, Species::HumanGlasberg] {
            assert_eq!(species.to_string().parse::<Species>().unwrap(), species);
        }
        for fiber in [FiberType::HighSpont, FiberType::MediumSpont, FiberType::LowSpont] {
            assert_eq!(fiber.to_string().parse::<FiberType>().unwrap(), fiber);
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: SimulationParameters =
            serde_json::from_str(r#"{ "cf_hz": 4000.0, "fiber_type": "lsr", "species": "cat" }"#)
                .unwrap();
        assert_eq!(params.cf_hz, 4000.0);
        assert_eq!(params.fiber_type, FiberType::LowSpont);
        assert_eq!(params.species, Species::Cat);
        assert_eq!(params.nrep, 1);
        assert_eq!(params.noise, NoiseType::Fresh);

        let unknown = serde_json::from_str::<SimulationParameters>(r#"{ "fiber_type": "xsr" }"#);
        assert!(unknown.is_err());
    }
}
