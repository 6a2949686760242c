//! Fractional Gaussian Noise
//!
//! Generator for the long-range-dependent noise that drives the slow
//! power-law adaptation path of the synapse.
//!
//! # Method
//!
//! Noise is synthesized on a coarse 0.1 s grid with the circulant-embedding
//! (Davies-Harte) method, then band-limited resampled to the simulation
//! sample rate and scaled per fiber class:
//!
//! ```text
//! autocovariance(H) ──► FFT ──► √ ──► × complex N(0,1) ──► IFFT ──► fGn
//!                                                                    │
//!                                     (H > 1: cumulative sum ──► fBn)
//!                                                                    ▼
//!                                          resample ──► × σ(fiber) ──► N samples
//! ```
//!
//! # Example
//!
//! ```rust
//! use an_model_core::noise::ffgn;
//! use an_model_core::params::FiberType;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let noise = ffgn(5000, 1e-5, 0.9, FiberType::HighSpont, &mut rng).unwrap();
//! assert_eq!(noise.len(), 5000);
//! ```

use rand::Rng;
use rand_distr::StandardNormal;
use rustfft::{num_complex::Complex, FftPlanner};
use tracing::trace;

use crate::error::{ModelError, ModelResult};
use crate::params::FiberType;
use crate::resample::resample_fourier;

/// Time step of the coarse synthesis grid (s)
pub const COARSE_TDRES_S: f64 = 0.1;

/// Smallest coarse grid the synthesis runs on
const MIN_COARSE_SAMPLES: usize = 10;

/// Coarse-grid layout for a noise request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoarseGrid {
    /// Upsampling factor from the coarse grid to the requested resolution
    pub resamp: usize,
    /// Number of coarse samples synthesized
    pub samples: usize,
}

impl CoarseGrid {
    /// Layout for `n` output samples at time step `tdres`
    #[must_use]
    pub fn new(n: usize, tdres: f64) -> Self {
        let resamp = ((COARSE_TDRES_S / tdres).ceil() as usize).max(1);
        let samples = (n.div_ceil(resamp) + 1).max(MIN_COARSE_SAMPLES);
        Self { resamp, samples }
    }

    /// Circulant-embedding FFT length for this grid
    #[must_use]
    pub fn fft_len(&self) -> usize {
        (2 * (self.samples - 1)).next_power_of_two()
    }
}

/// Generate `n` samples of fractional Gaussian (or Brownian) noise.
///
/// # Arguments
///
/// * `n` - Number of samples to return
/// * `tdres` - Time step of the returned samples (s), in (0, 1)
/// * `hurst` - Hurst exponent in [0, 2]; values above 1 produce fractional
///   Brownian noise with exponent `hurst - 1`
/// * `fiber_type` - Selects the output standard deviation
/// * `rng` - Source of the Gaussian draws
///
/// A Hurst exponent of exactly 0.5 (or 1.5) degenerates to white noise: the
/// result is `n` independent standard-normal draws at full resolution,
/// without resampling or fiber scaling (integrated for 1.5).
///
/// # Errors
///
/// * [`ModelError::InvalidParameter`] if `n` is zero, `tdres` is outside
///   (0, 1), or `hurst` is outside [0, 2].
/// * [`ModelError::InternalConsistency`] if the circulant embedding has a
///   negative eigenvalue.
pub fn ffgn<R: Rng + ?Sized>(
    n: usize,
    tdres: f64,
    hurst: f64,
    fiber_type: FiberType,
    rng: &mut R,
) -> ModelResult<Vec<f64>> {
    if n == 0 {
        return Err(ModelError::invalid("n", "noise length must be positive"));
    }
    if !(tdres > 0.0 && tdres < 1.0) {
        return Err(ModelError::invalid("tdres", format!("{tdres} s is outside (0, 1)")));
    }
    if !(0.0..=2.0).contains(&hurst) {
        return Err(ModelError::invalid("hurst", format!("{hurst} is outside [0, 2]")));
    }

    let (h, brownian) = if hurst <= 1.0 { (hurst, false) } else { (hurst - 1.0, true) };

    if h == 0.5 {
        let mut y: Vec<f64> = (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
        if brownian {
            cumulative_sum(&mut y);
        }
        return Ok(y);
    }

    let grid = CoarseGrid::new(n, tdres);
    let y = synthesize_coarse(&grid, h, brownian, rng)?;

    let sigma = fiber_type.noise_sigma();
    let mut resampled = resample_fourier(&y, grid.resamp * grid.samples);
    resampled.truncate(n);
    for v in &mut resampled {
        *v *= sigma;
    }

    Ok(resampled)
}

/// Draw the coarse-grid fGn (or fBn) sequence, `grid.samples` long.
fn synthesize_coarse<R: Rng + ?Sized>(
    grid: &CoarseGrid,
    h: f64,
    brownian: bool,
    rng: &mut R,
) -> ModelResult<Vec<f64>> {
    let fft_len = grid.fft_len();
    trace!(resamp = grid.resamp, coarse = grid.samples, fft_len, h, brownian, "synthesizing fGn");

    let magnitudes = spectral_magnitudes(fft_len, h)?;

    let real: Vec<f64> = (0..fft_len).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    let imag: Vec<f64> = (0..fft_len).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    let mut spectrum: Vec<Complex<f64>> = magnitudes
        .iter()
        .zip(real.iter().zip(&imag))
        .map(|(&m, (&re, &im))| Complex::new(m * re, m * im))
        .collect();

    FftPlanner::<f64>::new().plan_fft_inverse(fft_len).process(&mut spectrum);

    // Inverse transform is unnormalized: (1/M)·√M
    let scale = 1.0 / (fft_len as f64).sqrt();
    let mut y: Vec<f64> = spectrum[..grid.samples].iter().map(|c| c.re * scale).collect();

    if brownian {
        cumulative_sum(&mut y);
    }

    Ok(y)
}

/// Square-rooted eigenvalues of the circulant embedding of the fGn
/// autocovariance with exponent `h`, for an FFT of length `fft_len`.
///
/// The kernel is evaluated on a folded ramp (0, 1, …, M/2−1, M/2, …, 1).
///
/// # Errors
///
/// Returns [`ModelError::InternalConsistency`] if any eigenvalue is negative;
/// the embedding is then not a valid covariance.
pub fn spectral_magnitudes(fft_len: usize, h: f64) -> ModelResult<Vec<f64>> {
    let half = fft_len / 2;
    let two_h = 2.0 * h;

    let mut kernel: Vec<Complex<f64>> = (0..half)
        .chain((1..=fft_len - half).rev())
        .map(|k| {
            let k = k as f64;
            let z = 0.5 * ((k + 1.0).powf(two_h) - 2.0 * k.powf(two_h) + (k - 1.0).abs().powf(two_h));
            Complex::new(z, 0.0)
        })
        .collect();

    FftPlanner::<f64>::new().plan_fft_forward(fft_len).process(&mut kernel);

    kernel
        .iter()
        .enumerate()
        .map(|(bin, c)| {
            if c.re >= 0.0 {
                Ok(c.re.sqrt())
            } else {
                Err(ModelError::InternalConsistency {
                    reason: format!(
                        "circulant embedding eigenvalue {} at bin {bin} is negative (H = {h})",
                        c.re
                    ),
                })
            }
        })
        .collect()
}

fn cumulative_sum(values: &mut [f64]) {
    let mut acc = 0.0;
    for v in values.iter_mut() {
        acc += *v;
        *v = acc;
    }
}
