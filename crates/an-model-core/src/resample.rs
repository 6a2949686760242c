//! Fourier-method resampling
//!
//! Band-limited resampling by zero-padding (or truncating) the spectrum of
//! the input. The signal is assumed periodic over its length, which is the
//! same assumption the spectral noise synthesis makes.

use rustfft::{num_complex::Complex, FftPlanner};

/// Resample `samples` to exactly `num` points.
///
/// When upsampling from an even length the Nyquist bin is split evenly
/// between the positive and negative halves of the new spectrum; when
/// downsampling to an even length the two halves are folded together.
/// Output amplitude matches the input amplitude.
#[must_use]
pub fn resample_fourier(samples: &[f64], num: usize) -> Vec<f64> {
    let nx = samples.len();
    if nx == 0 || num == 0 {
        return vec![0.0; num];
    }

    let mut planner = FftPlanner::<f64>::new();

    let mut spectrum: Vec<Complex<f64>> =
        samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    planner.plan_fft_forward(nx).process(&mut spectrum);

    let n = nx.min(num);
    let nyq = n / 2 + 1;

    let mut resized = vec![Complex::new(0.0, 0.0); num];
    resized[..nyq].copy_from_slice(&spectrum[..nyq]);
    let negative = n - nyq;
    if negative > 0 {
        resized[num - negative..].copy_from_slice(&spectrum[nx - negative..]);
    }

    if n % 2 == 0 {
        if num < nx {
            resized[n / 2] += spectrum[nx - n / 2];
        } else if nx < num {
            resized[n / 2] *= 0.5;
            resized[num - n / 2] = resized[n / 2];
        }
    }

    planner.plan_fft_inverse(num).process(&mut resized);

    let scale = 1.0 / nx as f64;
    resized.iter().map(|c| c.re * scale).collect()
}
