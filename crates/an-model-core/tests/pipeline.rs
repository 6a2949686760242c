//! End-to-end pipeline tests against a toy engine

use std::f64::consts::PI;

use an_model_core::engine::{HairCellStage, SimulationEngine, SynapseStage};
use an_model_core::simulation::{delay_points, log_spaced_cfs, total_samples};
use an_model_core::{
    refractory_nonlinearity, FiberType, ModelError, NoiseType, PowerLaw, SimulationParameters,
    Simulator, Species,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Rectifying hair cell and a synapse that adds spont to the scaled potential.
///
/// Panics on any buffer-length disagreement, standing in for a kernel that
/// would otherwise read or write out of bounds.
struct ToyEngine;

impl SimulationEngine for ToyEngine {
    fn hair_cell_stage(&self, stage: &HairCellStage<'_>, out: &mut [f64]) {
        assert_eq!(stage.waveform.len(), stage.total_samples);
        assert_eq!(out.len(), stage.total_samples * stage.nrep);
        for (i, v) in out.iter_mut().enumerate() {
            let x = stage.waveform[i % stage.total_samples];
            *v = stage.cihc * x.max(0.0) * 100.0;
        }
    }

    fn synapse_stage(&self, stage: &SynapseStage<'_>, out: &mut [f64]) {
        assert_eq!(stage.potential.len(), stage.total_samples * stage.nrep);
        assert_eq!(out.len(), stage.potential.len());
        let padded = (stage.potential.len() + 2 * delay_points(stage.cf_hz)) as f64;
        let needed = (padded * stage.tdres * stage.internal_fs).ceil() as usize;
        assert!(stage.noise.len() >= needed);
        for (o, p) in out.iter_mut().zip(stage.potential) {
            *o = stage.spont + 1000.0 * p;
        }
    }
}

fn tone(freq_hz: f64, level_db_spl: f64, duration_s: f64, fs: f64) -> Vec<f64> {
    let amplitude = 20e-6 * 10f64.powf(level_db_spl / 20.0) * 2f64.sqrt();
    let n = (duration_s * fs).round() as usize;
    (0..n).map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / fs).sin()).collect()
}

#[test]
fn test_tone_through_pipeline() {
    let simulator = Simulator::new(ToyEngine);
    let stimulus = tone(1000.0, 50.0, 0.05, 100e3);
    let params = SimulationParameters { noise: NoiseType::None, ..Default::default() };

    let response = simulator.simulate(&stimulus, &params, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(response.ihc.len(), stimulus.len());
    assert_eq!(response.rate.len(), stimulus.len());

    // Silent half-cycles sit at the post-refractory spontaneous rate
    let floor = refractory_nonlinearity(100.0);
    let min = response.rate.iter().copied().fold(f64::INFINITY, f64::min);
    assert!((min - floor).abs() < 1e-9);
    assert!(response.mean_rate() > floor);
    assert!(response.rate.iter().all(|&r| r < 1.0 / 0.75e-3));
}

#[test]
fn test_buffer_lengths_over_parameter_grid() {
    let simulator = Simulator::new(ToyEngine);
    let mut rng = StdRng::seed_from_u64(2024);

    for &fs in &[50e3, 100e3, 200e3] {
        for &len in &[1, 137, 5000] {
            for nrep in 1..=3 {
                for &extra_time_s in &[0.0, 0.0015] {
                    for noise in [NoiseType::None, NoiseType::Fresh] {
                        let params = SimulationParameters {
                            cf_hz: 4000.0,
                            sample_rate_hz: fs,
                            nrep,
                            extra_time_s,
                            noise,
                            ..Default::default()
                        };
                        let waveform = vec![0.01; len];
                        let ihc = simulator.simulate_hair_cell_response(&waveform, &params).unwrap();
                        assert_eq!(ihc.len(), total_samples(len, fs, extra_time_s).unwrap() * nrep);

                        let rate = simulator.simulate_an_firing_rate(&ihc, &params, &mut rng).unwrap();
                        assert_eq!(rate.len(), ihc.len());
                    }
                }
            }
        }
    }
}

#[test]
fn test_impaired_ear_lowers_drive() {
    let simulator = Simulator::new(ToyEngine);
    let stimulus = tone(2000.0, 60.0, 0.02, 100e3);
    let healthy = SimulationParameters {
        cf_hz: 2000.0,
        noise: NoiseType::None,
        fiber_type: FiberType::MediumSpont,
        power_law: PowerLaw::Approximate,
        ..Default::default()
    };
    let impaired = SimulationParameters { cihc: 0.1, ..healthy.clone() };

    let mut rng = StdRng::seed_from_u64(5);
    let a = simulator.simulate(&stimulus, &healthy, &mut rng).unwrap();
    let b = simulator.simulate(&stimulus, &impaired, &mut rng).unwrap();
    assert!(b.mean_rate() < a.mean_rate());
}

#[test]
fn test_population_across_species() {
    let simulator = Simulator::new(ToyEngine);
    let stimulus = tone(1000.0, 50.0, 0.01, 100e3);
    let cfs = log_spaced_cfs(500.0, 2000.0, 5);

    for species in [Species::Cat, Species::HumanShera, Species::HumanGlasberg] {
        let base = SimulationParameters { species, ..Default::default() };
        let first = simulator.simulate_population(&stimulus, &base, &cfs, 9).unwrap();
        let second = simulator.simulate_population(&stimulus, &base, &cfs, 9).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }
}

#[test]
fn test_validation_rejects_before_engine() {
    let simulator = Simulator::new(ToyEngine);
    let human_high_cf = SimulationParameters { cf_hz: 39_000.0, ..Default::default() };
    let err = simulator.simulate_hair_cell_response(&[0.0; 10], &human_high_cf).unwrap_err();
    assert!(matches!(err, ModelError::InvalidParameter { parameter: "cf_hz", .. }));

    let cat_high_cf = SimulationParameters { species: Species::Cat, ..human_high_cf };
    assert!(simulator.simulate_hair_cell_response(&[0.0; 10], &cat_high_cf).is_ok());
}
