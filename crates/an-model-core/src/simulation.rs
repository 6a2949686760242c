//! Auditory-Nerve Simulation
//!
//! Orchestrates one simulation call: validates parameters, sizes every
//! buffer the engine touches, runs the hair-cell and synapse stages, and
//! applies the refractory nonlinearity to the synapse output.
//!
//! # Simulation Pipeline
//!
//! ```text
//! Waveform ──► Validate ──► Hair-cell stage ──► Potential
//!                                                   │
//!                            fGn (H = 0.9) ──► Synapse stage ──► Raw rate
//!                                                                   │
//!                                          r / (1 + 0.75e-3·r) ◄───┘
//!                                                   │
//!                                                   ▼
//!                                              Firing rate
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # use an_model_core::engine::{HairCellStage, SimulationEngine, SynapseStage};
//! # struct MyEngine;
//! # impl SimulationEngine for MyEngine {
//! #     fn hair_cell_stage(&self, _: &HairCellStage<'_>, _: &mut [f64]) {}
//! #     fn synapse_stage(&self, _: &SynapseStage<'_>, _: &mut [f64]) {}
//! # }
//! use an_model_core::{SimulationParameters, Simulator};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let simulator = Simulator::new(MyEngine);
//! let params = SimulationParameters::default();
//! let tone: Vec<f64> = (0..10_000)
//!     .map(|i| 0.02 * (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / 100e3).sin())
//!     .collect();
//!
//! let ihc = simulator.simulate_hair_cell_response(&tone, &params).unwrap();
//! let rate = simulator
//!     .simulate_an_firing_rate(&ihc, &params, &mut StdRng::seed_from_u64(1))
//!     .unwrap();
//! assert_eq!(rate.len(), ihc.len());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::engine::{HairCellStage, SimulationEngine, SynapseStage};
use crate::error::{ModelError, ModelResult};
use crate::noise::ffgn;
use crate::params::{NoiseType, SimulationParameters, ValidatedParameters};

/// Hurst exponent of the adaptation noise
pub const ADAPTATION_HURST: f64 = 0.9;

/// Sampling frequency of the synapse's power-law stage (Hz)
pub const SYNAPSE_INTERNAL_FS_HZ: f64 = 10e3;

/// Refractory scaling of the pre-refractory rate (s)
pub const REFRACTORY_FACTOR: f64 = 0.75e-3;

// ============================================================================
// Buffer Sizing
// ============================================================================

/// Samples per repetition for a stimulus of `stimulus_len` samples, with
/// `extra_time_s` of silence appended and rounded to whole samples.
///
/// # Errors
///
/// Returns [`ModelError::InvalidParameter`] if the padded length does not
/// fit in `usize`.
pub fn total_samples(stimulus_len: usize, sample_rate_hz: f64, extra_time_s: f64) -> ModelResult<usize> {
    let extra = (extra_time_s * sample_rate_hz).round();
    let overflow = || {
        ModelError::invalid(
            "extra_time_s",
            format!("{extra_time_s} s at {sample_rate_hz} Hz overflows the sample count"),
        )
    };
    if !(extra < usize::MAX as f64) {
        return Err(overflow());
    }
    stimulus_len.checked_add(extra as usize).ok_or_else(overflow)
}

/// Delay of the power-law stage in samples, `floor(7500 / (cf / 1000))`
#[must_use]
pub fn delay_points(cf_hz: f64) -> usize {
    (7500.0 / (cf_hz / 1e3)).floor() as usize
}

/// Number of noise samples the synapse stage reads on its internal grid.
///
/// `ceil((len + 2·delay) · tdres · 10 kHz)`
#[must_use]
pub fn noise_length(potential_len: usize, cf_hz: f64, sample_rate_hz: f64) -> usize {
    let padded = (potential_len + 2 * delay_points(cf_hz)) as f64;
    (padded * (1.0 / sample_rate_hz) * SYNAPSE_INTERNAL_FS_HZ).ceil() as usize
}

/// Map a pre-refractory rate to the post-refractory rate, `r / (1 + 0.75e-3·r)`
#[inline]
#[must_use]
pub fn refractory_nonlinearity(rate: f64) -> f64 {
    rate / (1.0 + REFRACTORY_FACTOR * rate)
}

/// Log-spaced characteristic frequencies from `low_hz` to `high_hz`
#[must_use]
pub fn log_spaced_cfs(low_hz: f64, high_hz: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![low_hz],
        _ => {
            let (ln_low, ln_high) = (low_hz.ln(), high_hz.ln());
            let step = (ln_high - ln_low) / (count - 1) as f64;
            (0..count).map(|i| (ln_low + step * i as f64).exp()).collect()
        }
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Hair-cell potential and firing rate for one CF
#[derive(Clone, Debug, PartialEq)]
pub struct AnResponse {
    /// Characteristic frequency (Hz)
    pub cf_hz: f64,
    /// Inner hair-cell potential
    pub ihc: Vec<f64>,
    /// Post-refractory firing rate (spikes/s)
    pub rate: Vec<f64>,
}

impl AnResponse {
    /// Mean firing rate over the whole response (spikes/s)
    #[must_use]
    pub fn mean_rate(&self) -> f64 {
        if self.rate.is_empty() {
            0.0
        } else {
            self.rate.iter().sum::<f64>() / self.rate.len() as f64
        }
    }
}

/// Runs the simulation pipeline on a [`SimulationEngine`]
#[derive(Clone, Debug, Default)]
pub struct Simulator<E> {
    engine: E,
}

impl<E: SimulationEngine> Simulator<E> {
    /// Create a simulator over `engine`
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Simulate the inner hair-cell potential for `waveform`.
    ///
    /// Returns `total_samples × nrep` values, where `total_samples` includes
    /// any extra simulated time.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] if the waveform is empty or
    /// any parameter is out of range. The engine is not invoked in that case.
    pub fn simulate_hair_cell_response(
        &self,
        waveform: &[f64],
        params: &SimulationParameters,
    ) -> ModelResult<Vec<f64>> {
        let validated = validate_and_report(params)?;
        if waveform.is_empty() {
            return Err(ModelError::invalid("waveform", "stimulus must contain at least one sample"));
        }

        let total = total_samples(waveform.len(), params.sample_rate_hz, params.extra_time_s)?;
        let output_len = total.checked_mul(params.nrep).ok_or_else(|| {
            ModelError::invalid("nrep", format!("{total} samples × {} repetitions overflows", params.nrep))
        })?;
        let padded;
        let stimulus = if total == waveform.len() {
            waveform
        } else {
            let mut buf = Vec::with_capacity(total);
            buf.extend_from_slice(waveform);
            buf.resize(total, 0.0);
            padded = buf;
            padded.as_slice()
        };

        let stage = HairCellStage {
            waveform: stimulus,
            cf_hz: params.cf_hz,
            nrep: params.nrep,
            tdres: params.tdres(),
            total_samples: total,
            cohc: params.cohc,
            cihc: params.cihc,
            species_code: validated.species_code,
        };

        let mut ihc = vec![0.0; output_len];
        debug!(
            cf_hz = params.cf_hz,
            total_samples = total,
            nrep = params.nrep,
            output_len = ihc.len(),
            "running hair-cell stage"
        );
        debug_assert_eq!(stage.waveform.len(), stage.total_samples);
        self.engine.hair_cell_stage(&stage, &mut ihc);

        Ok(ihc)
    }

    /// Simulate the post-refractory auditory-nerve firing rate for a
    /// hair-cell potential produced by
    /// [`simulate_hair_cell_response`](Self::simulate_hair_cell_response)
    /// with the same parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] if the potential is empty or
    /// not a whole number of repetitions, or any parameter is out of range.
    /// Noise-synthesis failures are propagated. The engine is not invoked in
    /// either case.
    pub fn simulate_an_firing_rate<R: Rng + ?Sized>(
        &self,
        potential: &[f64],
        params: &SimulationParameters,
        rng: &mut R,
    ) -> ModelResult<Vec<f64>> {
        let validated = validate_and_report(params)?;
        let len = potential.len();
        if len == 0 {
            return Err(ModelError::invalid("potential", "hair-cell potential is empty"));
        }
        if len % params.nrep != 0 {
            return Err(ModelError::invalid(
                "potential",
                format!("{len} samples is not a whole number of {} repetitions", params.nrep),
            ));
        }

        let tdres = params.tdres();
        let l_noise = noise_length(len, params.cf_hz, params.sample_rate_hz);
        let noise = match params.noise {
            NoiseType::None => vec![0.0; l_noise],
            NoiseType::Fresh => {
                ffgn(len.max(l_noise), tdres, ADAPTATION_HURST, params.fiber_type, rng)?
            }
        };
        debug_assert!(noise.len() >= l_noise);

        let stage = SynapseStage {
            potential,
            noise: &noise,
            tdres,
            cf_hz: params.cf_hz,
            total_samples: len / params.nrep,
            nrep: params.nrep,
            spont: validated.spont,
            implnt: validated.implnt,
            internal_fs: SYNAPSE_INTERNAL_FS_HZ,
        };

        let mut rate = vec![0.0; len];
        debug!(
            cf_hz = params.cf_hz,
            fiber = %params.fiber_type,
            noise = %params.noise,
            noise_len = noise.len(),
            required_noise_len = l_noise,
            "running synapse stage"
        );
        debug_assert_eq!(stage.output_len(), rate.len());
        self.engine.synapse_stage(&stage, &mut rate);

        for r in &mut rate {
            *r = refractory_nonlinearity(*r);
        }

        Ok(rate)
    }

    /// [`simulate_an_firing_rate`](Self::simulate_an_firing_rate) with noise
    /// drawn from an OS-seeded generator
    ///
    /// # Errors
    ///
    /// See [`simulate_an_firing_rate`](Self::simulate_an_firing_rate).
    pub fn simulate_an_firing_rate_from_entropy(
        &self,
        potential: &[f64],
        params: &SimulationParameters,
    ) -> ModelResult<Vec<f64>> {
        self.simulate_an_firing_rate(potential, params, &mut StdRng::from_entropy())
    }

    /// Run both stages for one CF
    ///
    /// # Errors
    ///
    /// Any error from either stage.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        waveform: &[f64],
        params: &SimulationParameters,
        rng: &mut R,
    ) -> ModelResult<AnResponse> {
        let ihc = self.simulate_hair_cell_response(waveform, params)?;
        let rate = self.simulate_an_firing_rate(&ihc, params, rng)?;
        Ok(AnResponse { cf_hz: params.cf_hz, ihc, rate })
    }

    /// Run both stages for every CF in `cfs_hz`, in order.
    ///
    /// Each CF draws its noise from its own generator seeded with
    /// `seed + index`, so results do not depend on evaluation order. All
    /// CFs are validated before any of them is simulated.
    ///
    /// # Errors
    ///
    /// The first validation or simulation error encountered.
    pub fn simulate_population(
        &self,
        waveform: &[f64],
        base: &SimulationParameters,
        cfs_hz: &[f64],
        seed: u64,
    ) -> ModelResult<Vec<AnResponse>> {
        let per_cf: Vec<SimulationParameters> = cfs_hz
            .iter()
            .map(|&cf_hz| SimulationParameters { cf_hz, ..base.clone() })
            .collect();
        for params in &per_cf {
            params.validate()?;
        }

        per_cf
            .iter()
            .enumerate()
            .map(|(i, params)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                self.simulate(waveform, params, &mut rng)
            })
            .collect()
    }
}

fn validate_and_report(params: &SimulationParameters) -> ModelResult<ValidatedParameters> {
    let validated = params.validate()?;
    for advisory in &validated.advisories {
        warn!("{advisory}");
    }
    Ok(validated)
}
