// src/processing/filters/mod.rs
//! Digital filters for EMG signal conditioning
//!
//! Filters are cascades of second-order sections. High-order polynomials lose
//! too much precision at low normalized cutoffs, so a section cascade is the
//! only representation used here.

pub mod butterworth;
pub mod notch;

pub use butterworth::*;
pub use notch::*;

use crate::config::constants::filters::PADDING_FACTOR;
use rustfft::num_complex::Complex64;
use thiserror::Error;

/// Common filter error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Insufficient samples: zero-phase filtering needs at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },
}

/// Single second-order section with `a0` normalised to one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a1: a[0], a2: a[1] }
    }

    /// Gain at DC
    pub fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (1.0 + self.a1 + self.a2)
    }

    /// Complex response at normalised angular frequency `omega` (rad/sample)
    pub fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Transposed direct form II state that holds a unit step at steady state
    fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        let z2 = self.b[2] - self.a2 * g;
        let z1 = self.b[1] - self.a1 * g + z2;
        [z1, z2]
    }

    fn scale_numerator(&mut self, factor: f64) {
        for b in &mut self.b {
            *b *= factor;
        }
    }
}

/// Cascade of biquad sections applied in order
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    pub fn new(sections: Vec<Biquad>) -> Result<Self, FilterError> {
        if sections.is_empty() {
            return Err(FilterError::InvalidParameters("Filter needs at least one section".to_string()));
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Magnitude response at a frequency in Hz
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * std::f64::consts::PI * freq_hz / sample_rate;
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Samples of odd-reflection padding added on each side before
    /// zero-phase filtering
    pub fn padding_len(&self) -> usize {
        PADDING_FACTOR * (2 * self.sections.len() + 1)
    }

    /// Smallest input accepted by [`SosFilter::filtfilt`]
    pub fn min_input_len(&self) -> usize {
        self.padding_len() + 1
    }

    /// Causal filtering with zeroed initial state
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let zero = vec![[0.0; 2]; self.sections.len()];
        self.run(input, &zero, 0.0)
    }

    /// Zero-phase forward-backward filtering
    ///
    /// The signal is extended by odd reflection at both ends and each pass
    /// starts from the steady-state response to its first sample, which keeps
    /// edge transients out of the returned samples.
    pub fn filtfilt(&self, input: &[f64]) -> Result<Vec<f64>, FilterError> {
        let pad = self.padding_len();
        let n = input.len();
        if n <= pad {
            return Err(FilterError::InsufficientSamples {
                required: pad + 1,
                actual: n,
            });
        }

        let first = input[0];
        let last = input[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * pad);
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - input[i]));
        extended.extend_from_slice(input);
        extended.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i]));

        let initial = self.steady_state();

        let mut forward = self.run(&extended, &initial, extended[0]);
        forward.reverse();
        let start = forward[0];
        let mut backward = self.run(&forward, &initial, start);
        backward.reverse();

        Ok(backward[pad..pad + n].to_vec())
    }

    /// Per-section initial state for a unit step, each section scaled by the
    /// DC gain of the sections before it
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.step_state();
                let state = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    fn run(&self, input: &[f64], initial: &[[f64; 2]], x0: f64) -> Vec<f64> {
        let mut signal = input.to_vec();
        for (section, state) in self.sections.iter().zip(initial) {
            let [b0, b1, b2] = section.b;
            let mut z1 = state[0] * x0;
            let mut z2 = state[1] * x0;
            for sample in signal.iter_mut() {
                let x = *sample;
                let y = b0 * x + z1;
                z1 = b1 * x - section.a1 * y + z2;
                z2 = b2 * x - section.a2 * y;
                *sample = y;
            }
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving_pair() -> SosFilter {
        // y[n] = 0.5 x[n] + 0.5 x[n-1]
        SosFilter::new(vec![Biquad::new([0.5, 0.5, 0.0], [0.0, 0.0])]).unwrap()
    }

    #[test]
    fn test_empty_cascade_rejected() {
        assert!(SosFilter::new(Vec::new()).is_err());
    }

    #[test]
    fn test_causal_filter() {
        let output = moving_pair().filter(&[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(output, vec![0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_filtfilt_minimum_length() {
        let filter = moving_pair();
        assert_eq!(filter.padding_len(), 9);

        let short = vec![1.0; 9];
        assert_eq!(
            filter.filtfilt(&short),
            Err(FilterError::InsufficientSamples { required: 10, actual: 9 })
        );
        assert!(filter.filtfilt(&vec![1.0; 10]).is_ok());
    }

    #[test]
    fn test_filtfilt_preserves_constant_through_unity_dc() {
        let output = moving_pair().filtfilt(&vec![3.0; 40]).unwrap();
        assert_eq!(output.len(), 40);
        for value in output {
            assert!((value - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_filtfilt_is_zero_phase() {
        // A symmetric pulse stays centred after forward-backward smoothing
        let mut input = vec![0.0; 41];
        input[20] = 1.0;
        let output = moving_pair().filtfilt(&input).unwrap();
        let peak = output
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        assert_eq!(peak, 20);
        assert!((output[19] - output[21]).abs() < 1e-12);
    }

    #[test]
    fn test_magnitude_at_dc_and_nyquist() {
        let filter = moving_pair();
        assert!((filter.magnitude_at(0.0, 1000.0) - 1.0).abs() < 1e-12);
        assert!(filter.magnitude_at(500.0, 1000.0) < 1e-12);
    }
}
