//! Auditory-Nerve Model Application
//!
//! Command-line entry point for the auditory-nerve model pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Print 1 s of high-spont adaptation noise at 100 kHz
//! an-model noise --samples 100000 --fs 100000 --fiber hsr --seed 7
//!
//! # Firing rate to a 1 kHz, 50 dB SPL tone (requires the native kernels)
//! an-model simulate --cf 1000 --tone-hz 1000 --level-db 50
//!
//! # Same, with parameters read from a JSON file
//! an-model simulate --params params.json --tone-hz 1000 --level-db 50
//! ```

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use an_model_core::noise::ffgn;
use an_model_core::{FiberType, NoiseType, PowerLaw, SimulationParameters, Species};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Auditory-Nerve Model
#[derive(Parser, Debug)]
#[command(name = "an-model")]
#[command(author, version, about = "Auditory-periphery simulation (Zilany, Bruce & Carney 2014)", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize fractional Gaussian adaptation noise
    Noise {
        /// Number of samples
        #[arg(short = 'n', long, default_value = "100000")]
        samples: usize,

        /// Sample rate (Hz)
        #[arg(long, default_value = "100000")]
        fs: f64,

        /// Hurst exponent in [0, 2]
        #[arg(long, default_value = "0.9")]
        hurst: f64,

        /// Fiber type: hsr, msr, or lsr
        #[arg(long, default_value = "hsr")]
        fiber: String,

        /// RNG seed (OS entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Simulate the firing rate to a pure tone
    Simulate {
        /// Read simulation parameters from a JSON file
        #[arg(long)]
        params: Option<PathBuf>,

        /// Characteristic frequency (Hz)
        #[arg(long, default_value = "1000")]
        cf: f64,

        /// Number of repetitions
        #[arg(long, default_value = "1")]
        nrep: usize,

        /// Sample rate (Hz)
        #[arg(long, default_value = "100000")]
        fs: f64,

        /// Outer hair-cell health in [0, 1]
        #[arg(long, default_value = "1.0")]
        cohc: f64,

        /// Inner hair-cell health in [0, 1]
        #[arg(long, default_value = "1.0")]
        cihc: f64,

        /// Species: cat, human, or human-glasberg
        #[arg(long, default_value = "human")]
        species: String,

        /// Fiber type: hsr, msr, or lsr
        #[arg(long, default_value = "hsr")]
        fiber: String,

        /// Power-law implementation: true or approx
        #[arg(long, default_value = "true")]
        power_law: String,

        /// Adaptation noise: none or fresh
        #[arg(long, default_value = "fresh")]
        noise: String,

        /// Tone frequency (Hz)
        #[arg(long, default_value = "1000")]
        tone_hz: f64,

        /// Tone level (dB SPL)
        #[arg(long, default_value = "50")]
        level_db: f64,

        /// Tone duration (s)
        #[arg(long, default_value = "0.1")]
        duration_s: f64,

        /// RNG seed (OS entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("an-model v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Noise { samples, fs, hurst, fiber, seed } => {
            run_noise(samples, fs, hurst, &fiber, seed)?;
        }
        Commands::Simulate {
            params,
            cf,
            nrep,
            fs,
            cohc,
            cihc,
            species,
            fiber,
            power_law,
            noise,
            tone_hz,
            level_db,
            duration_s,
            seed,
        } => {
            let params = match params {
                Some(path) => {
                    info!("Loading parameters from {}", path.display());
                    let text = std::fs::read_to_string(&path)?;
                    serde_json::from_str(&text)?
                }
                None => SimulationParameters {
                    cf_hz: cf,
                    nrep,
                    sample_rate_hz: fs,
                    cohc,
                    cihc,
                    species: species.parse::<Species>()?,
                    fiber_type: fiber.parse::<FiberType>()?,
                    power_law: power_law.parse::<PowerLaw>()?,
                    noise: noise.parse::<NoiseType>()?,
                    ..Default::default()
                },
            };
            let stimulus = pure_tone(tone_hz, level_db, duration_s, params.sample_rate_hz);
            run_simulate(&params, &stimulus, seed)?;
        }
    }

    Ok(())
}

/// Sine tone at `level_db` dB SPL (re 20 µPa, RMS)
fn pure_tone(freq_hz: f64, level_db: f64, duration_s: f64, fs: f64) -> Vec<f64> {
    let amplitude = 20e-6 * 10f64.powf(level_db / 20.0) * std::f64::consts::SQRT_2;
    let n = (duration_s * fs).round() as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq_hz * i as f64 / fs).sin())
        .collect()
}

fn make_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn write_column(values: &[f64]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for v in values {
        writeln!(out, "{v}")?;
    }
    out.flush()?;
    Ok(())
}

/// Synthesize noise and print it, one sample per line
fn run_noise(samples: usize, fs: f64, hurst: f64, fiber: &str, seed: Option<u64>) -> anyhow::Result<()> {
    let fiber_type: FiberType = fiber.parse()?;
    if !(fs.is_finite() && fs > 0.0) {
        anyhow::bail!("sample rate must be positive, got {fs}");
    }

    info!("Synthesizing {} samples (H = {}, fiber {})", samples, hurst, fiber_type);
    let noise = ffgn(samples, 1.0 / fs, hurst, fiber_type, &mut make_rng(seed))?;
    write_column(&noise)
}

/// Run the full pipeline and print the firing rate
#[allow(unreachable_code)]
fn run_simulate(params: &SimulationParameters, stimulus: &[f64], seed: Option<u64>) -> anyhow::Result<()> {
    #[cfg(feature = "native")]
    {
        use an_model_core::{NativeEngine, Simulator};

        info!("Simulating CF {} Hz ({}, {})", params.cf_hz, params.species, params.fiber_type);
        let simulator = Simulator::new(NativeEngine);
        let response = simulator.simulate(stimulus, params, &mut make_rng(seed))?;
        info!("Mean rate: {:.1} spikes/s", response.mean_rate());
        write_column(&response.rate)?;
    }

    #[cfg(not(feature = "native"))]
    {
        let _ = (stimulus, seed);
        params.validate()?;
        anyhow::bail!(
            "Native kernels not enabled. Rebuild with --features native:\n\
             cargo run -p an-model-app --features native -- simulate"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_noise() {
        let cli = Cli::try_parse_from(["an-model", "noise", "-n", "500", "--fiber", "lsr", "--seed", "3"])
            .unwrap();
        match cli.command {
            Commands::Noise { samples, fiber, seed, hurst, .. } => {
                assert_eq!(samples, 500);
                assert_eq!(fiber, "lsr");
                assert_eq!(seed, Some(3));
                assert!((hurst - 0.9).abs() < 1e-12);
            }
            Commands::Simulate { .. } => panic!("expected noise subcommand"),
        }
    }

    #[test]
    fn test_pure_tone_level() {
        // 94 dB SPL is 1 Pa RMS
        let tone = pure_tone(1000.0, 94.0, 0.01, 100e3);
        assert_eq!(tone.len(), 1000);
        let rms = (tone.iter().map(|x| x * x).sum::<f64>() / tone.len() as f64).sqrt();
        assert!((rms - 1.0).abs() < 0.01);
    }
}
