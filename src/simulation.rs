// src/simulation.rs
//! Synthetic EMG recordings for demos, tests and benchmarks

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Seeded builder for noise, tone bursts and slow drift
pub struct SignalGenerator {
    sample_rate: f64,
    rng: StdRng,
}

impl SignalGenerator {
    pub fn new(sample_rate: f64, seed: u64) -> Self {
        Self {
            sample_rate,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples spanning `seconds`
    pub fn samples_for(&self, seconds: f64) -> usize {
        (seconds * self.sample_rate).round() as usize
    }

    /// Zero-mean Gaussian noise with standard deviation `sigma`
    pub fn noise(&mut self, len: usize, sigma: f64) -> Vec<f64> {
        (0..len).map(|_| self.gaussian() * sigma).collect()
    }

    /// Add a sinusoid gated to `[start_s, end_s)`, clipped to the buffer
    pub fn add_burst(&self, signal: &mut [f64], freq_hz: f64, amplitude: f64, start_s: f64, end_s: f64) {
        let start = self.samples_for(start_s).min(signal.len());
        let end = self.samples_for(end_s).min(signal.len());
        for (i, sample) in signal.iter_mut().enumerate().take(end).skip(start) {
            *sample += amplitude * (2.0 * PI * freq_hz * i as f64 / self.sample_rate).sin();
        }
    }

    /// Add a slow sinusoidal baseline wander over the whole buffer
    pub fn add_drift(&self, signal: &mut [f64], freq_hz: f64, amplitude: f64) {
        let end_s = signal.len() as f64 / self.sample_rate;
        self.add_burst(signal, freq_hz, amplitude, 0.0, end_s);
    }

    /// 12 s reference-limb recording with four 1 s bursts
    pub fn reference_recording(&mut self) -> Vec<f64> {
        let mut signal = self.noise(self.samples_for(12.0), 0.02);
        for start in [2.0, 5.0, 8.0, 10.0] {
            self.add_burst(&mut signal, 80.0, 0.3, start, start + 1.0);
        }
        signal
    }

    /// 3 s trial with late activation on a drifting, noisy baseline
    pub fn posture_trial(&mut self) -> Vec<f64> {
        let mut signal = self.noise(self.samples_for(3.0), 0.03);
        self.add_drift(&mut signal, 2.0, 0.05);
        self.add_burst(&mut signal, 70.0, 0.12, 1.0, 3.0);
        signal
    }

    /// 3 s trial with a weak but clean activation starting at `onset_s`
    pub fn low_activation_trial(&mut self, onset_s: f64) -> Vec<f64> {
        let mut signal = self.noise(self.samples_for(3.0), 0.01);
        self.add_burst(&mut signal, 90.0, 0.08, onset_s, 3.0);
        signal
    }

    /// 3 s trial with a strong activation after 0.5 s
    pub fn sufficient_trial(&mut self) -> Vec<f64> {
        let mut signal = self.noise(self.samples_for(3.0), 0.02);
        self.add_burst(&mut signal, 100.0, 0.25, 0.5, 3.0);
        signal
    }

    fn gaussian(&mut self) -> f64 {
        // Box-Muller; 1 - u keeps the log argument in (0, 1]
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}
