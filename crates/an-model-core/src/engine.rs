//! Simulation Engine Contract
//!
//! The inner-hair-cell and synapse stages are numerical kernels that live
//! outside this crate. The orchestrator talks to them through
//! [`SimulationEngine`], which mirrors the kernels' raw-buffer calling
//! convention: inputs by slice and scalar, outputs filled in place.
//!
//! Kernels perform no bounds checking. Every length recorded in
//! [`HairCellStage`] and [`SynapseStage`] must agree with the slices passed
//! alongside it; the orchestrator guarantees this.

/// Inputs to the inner-hair-cell stage
#[derive(Clone, Copy, Debug)]
pub struct HairCellStage<'a> {
    /// Stimulus waveform (Pa), `total_samples` long
    pub waveform: &'a [f64],
    /// Characteristic frequency (Hz)
    pub cf_hz: f64,
    /// Number of repetitions
    pub nrep: usize,
    /// Time step (s)
    pub tdres: f64,
    /// Samples per repetition
    pub total_samples: usize,
    /// Outer hair-cell health
    pub cohc: f64,
    /// Inner hair-cell health
    pub cihc: f64,
    /// Species code (1 = cat, 2 = human Shera, 3 = human Glasberg)
    pub species_code: i32,
}

impl HairCellStage<'_> {
    /// Length of the output buffer this stage fills
    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.total_samples * self.nrep
    }
}

/// Inputs to the synapse stage
#[derive(Clone, Copy, Debug)]
pub struct SynapseStage<'a> {
    /// Inner hair-cell potential, `total_samples * nrep` long
    pub potential: &'a [f64],
    /// Adaptation noise on the kernel's internal sampling grid
    pub noise: &'a [f64],
    /// Time step (s)
    pub tdres: f64,
    /// Characteristic frequency (Hz)
    pub cf_hz: f64,
    /// Samples per repetition
    pub total_samples: usize,
    /// Number of repetitions
    pub nrep: usize,
    /// Spontaneous rate (spikes/s)
    pub spont: f64,
    /// Power-law implementation code (1 = exact, 0 = approximate)
    pub implnt: f64,
    /// Internal sampling frequency of the power-law stage (Hz)
    pub internal_fs: f64,
}

impl SynapseStage<'_> {
    /// Length of the output buffer this stage fills
    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.total_samples * self.nrep
    }
}

/// Numerical kernels behind the simulation pipeline.
///
/// Implementations must be reentrant: no global buffers, no state carried
/// between calls. Both operations are infallible.
pub trait SimulationEngine: Send + Sync {
    /// Fill `out` (`stage.output_len()` long) with the hair-cell potential
    fn hair_cell_stage(&self, stage: &HairCellStage<'_>, out: &mut [f64]);

    /// Fill `out` (`stage.output_len()` long) with pre-refractory firing rates
    fn synapse_stage(&self, stage: &SynapseStage<'_>, out: &mut [f64]);
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for &E {
    fn hair_cell_stage(&self, stage: &HairCellStage<'_>, out: &mut [f64]) {
        (**self).hair_cell_stage(stage, out);
    }

    fn synapse_stage(&self, stage: &SynapseStage<'_>, out: &mut [f64]) {
        (**self).synapse_stage(stage, out);
    }
}

// ============================================================================
// Native kernels
// ============================================================================

#[cfg(feature = "native-engine")]
pub use native::NativeEngine;

#[cfg(feature = "native-engine")]
mod native {
    use std::os::raw::{c_double, c_int};

    use super::{HairCellStage, SimulationEngine, SynapseStage};

    #[link(name = "zbc2014")]
    extern "C" {
        #[link_name = "IHCAN"]
        fn ihcan(
            px: *const c_double,
            cf: c_double,
            nrep: c_int,
            tdres: c_double,
            totalstim: c_int,
            cohc: c_double,
            cihc: c_double,
            species: c_int,
            ihcout: *mut c_double,
        );

        #[link_name = "Synapse"]
        fn synapse(
            ihcout: *const c_double,
            rand_nums: *const c_double,
            tdres: c_double,
            cf: c_double,
            totalstim: c_int,
            nrep: c_int,
            spont: c_double,
            implnt: c_double,
            samp_freq: c_double,
            synouttmp: *mut c_double,
        ) -> c_double;
    }

    /// Engine backed by the native `libzbc2014` kernels
    #[derive(Clone, Copy, Debug, Default)]
    pub struct NativeEngine;

    fn to_c_int(value: usize, what: &str) -> c_int {
        c_int::try_from(value).unwrap_or_else(|_| panic!("{what} {value} exceeds the kernel's int range"))
    }

    impl SimulationEngine for NativeEngine {
        fn hair_cell_stage(&self, stage: &HairCellStage<'_>, out: &mut [f64]) {
            assert_eq!(stage.waveform.len(), stage.total_samples, "waveform length mismatch");
            assert_eq!(out.len(), stage.output_len(), "hair-cell output length mismatch");

            // SAFETY: the kernel reads `total_samples` values from `px` and
            // writes `total_samples * nrep` values to `ihcout`; both lengths
            // are asserted above.
            unsafe {
                ihcan(
                    stage.waveform.as_ptr(),
                    stage.cf_hz,
                    to_c_int(stage.nrep, "nrep"),
                    stage.tdres,
                    to_c_int(stage.total_samples, "totalstim"),
                    stage.cohc,
                    stage.cihc,
                    stage.species_code,
                    out.as_mut_ptr(),
                );
            }
        }

        fn synapse_stage(&self, stage: &SynapseStage<'_>, out: &mut [f64]) {
            assert_eq!(stage.potential.len(), stage.output_len(), "potential length mismatch");
            assert_eq!(out.len(), stage.output_len(), "synapse output length mismatch");

            // SAFETY: lengths of the potential and output buffers are asserted
            // above; the orchestrator sizes `noise` to cover every sample the
            // kernel reads on its internal grid.
            unsafe {
                synapse(
                    stage.potential.as_ptr(),
                    stage.noise.as_ptr(),
                    stage.tdres,
                    stage.cf_hz,
                    to_c_int(stage.total_samples, "totalstim"),
                    to_c_int(stage.nrep, "nrep"),
                    stage.spont,
                    stage.implnt,
                    stage.internal_fs,
                    out.as_mut_ptr(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl SimulationEngine for Constant {
        fn hair_cell_stage(&self, _stage: &HairCellStage<'_>, out: &mut [f64]) {
            out.fill(self.0);
        }

        fn synapse_stage(&self, _stage: &SynapseStage<'_>, out: &mut [f64]) {
            out.fill(self.0 * 2.0);
        }
    }

    #[test]
    fn test_stage_output_lengths() {
        let waveform = vec![0.0; 300];
        let stage = HairCellStage {
            waveform: &waveform,
            cf_hz: 1000.0,
            nrep: 4,
            tdres: 1e-5,
            total_samples: 300,
            cohc: 1.0,
            cihc: 1.0,
            species_code: 2,
        };
        assert_eq!(stage.output_len(), 1200);

        let potential = vec![0.0; 1200];
        let synapse = SynapseStage {
            potential: &potential,
            noise: &[],
            tdres: 1e-5,
            cf_hz: 1000.0,
            total_samples: 300,
            nrep: 4,
            spont: 100.0,
            implnt: 1.0,
            internal_fs: 10e3,
        };
        assert_eq!(synapse.output_len(), potential.len());
    }

    #[test]
    fn test_engine_by_reference() {
        fn run<E: SimulationEngine>(engine: E, out: &mut [f64]) {
            let potential = vec![0.0; out.len()];
            let stage = SynapseStage {
                potential: &potential,
                noise: &[],
                tdres: 1e-5,
                cf_hz: 1000.0,
                total_samples: out.len(),
                nrep: 1,
                spont: 4.0,
                implnt: 0.0,
                internal_fs: 10e3,
            };
            engine.synapse_stage(&stage, out);
        }

        let engine = Constant(1.5);
        let mut out = vec![0.0; 8];
        run(&engine, &mut out);
        assert!(out.iter().all(|&v| v == 3.0));
    }
}
