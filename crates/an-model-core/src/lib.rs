//! Auditory-Nerve Model Core - simulation pipeline for the auditory periphery
//!
//! This crate drives the Zilany, Bruce & Carney (2014) auditory-nerve model:
//! given a sound-pressure waveform and a characteristic frequency it produces
//! the inner hair-cell potential and the auditory-nerve firing rate.
//!
//! The hair-cell and synapse kernels are external; this crate validates
//! parameters, sizes every buffer the kernels touch, synthesizes the
//! fractional Gaussian noise that drives long-term adaptation, and applies
//! the refractory nonlinearity to the kernel output.
//!
//! # Modules
//!
//! - [`params`]: Simulation parameters, symbolic options, validation
//! - [`noise`]: Fractional Gaussian/Brownian noise synthesis
//! - [`resample`]: Fourier-method resampling
//! - [`engine`]: Contract for the numerical kernels
//! - [`simulation`]: Pipeline orchestration
//! - [`error`]: Error types
//!
//! # Features
//!
//! - `native-engine`: Link `libzbc2014` and expose [`engine::NativeEngine`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod engine;
pub mod error;
pub mod noise;
pub mod params;
pub mod resample;
pub mod simulation;

// Re-export key types
pub use engine::{HairCellStage, SimulationEngine, SynapseStage};
pub use error::{ModelError, ModelResult};
pub use noise::ffgn;
pub use params::{
    Advisory, FiberType, NoiseType, PowerLaw, SimulationParameters, Species, ValidatedParameters,
};
pub use simulation::{refractory_nonlinearity, AnResponse, Simulator};

#[cfg(feature = "native-engine")]
pub use engine::NativeEngine;
