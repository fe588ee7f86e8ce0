// src/processing/onset.rs
//! Activation onset from Teager-Kaiser energy

use crate::config::constants::features::DIVISION_EPSILON;
use crate::processing::stats::{median, std_dev};

/// Teager-Kaiser energy, clamped at zero, with zero endpoints
pub fn tkeo(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut energy = vec![0.0; n];
    for i in 1..n.saturating_sub(1) {
        let e = signal[i] * signal[i] - signal[i - 1] * signal[i + 1];
        energy[i] = e.max(0.0);
    }
    energy
}

/// Moving average aligned like a centred "same" convolution
///
/// Samples outside the signal count as zero; the divisor is always `window`.
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    let window = window.max(1);
    if n == 0 {
        return Vec::new();
    }

    let mut cumulative = Vec::with_capacity(n + 1);
    cumulative.push(0.0);
    let mut acc = 0.0;
    for &sample in signal {
        acc += sample;
        cumulative.push(acc);
    }

    let shift = (window - 1) / 2;
    (0..n)
        .map(|i| {
            let end = (i + shift).min(n - 1) + 1;
            let start = (i + shift + 1).saturating_sub(window);
            (cumulative[end] - cumulative[start]) / window as f64
        })
        .collect()
}

/// Z-score threshold crossing on smoothed TKEO energy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetDetector {
    window: usize,
    threshold_z: f64,
}

impl OnsetDetector {
    pub fn new(window: usize, threshold_z: f64) -> Self {
        Self {
            window: window.max(1),
            threshold_z,
        }
    }

    /// Smoothed energy z-scored against its own median and spread
    pub fn z_scores(&self, conditioned: &[f64]) -> Vec<f64> {
        let smoothed = moving_average(&tkeo(conditioned), self.window);
        let center = median(&smoothed);
        let spread = std_dev(&smoothed) + DIVISION_EPSILON;
        smoothed.iter().map(|e| (e - center) / spread).collect()
    }

    /// First sample whose z-score exceeds the threshold
    pub fn detect(&self, conditioned: &[f64]) -> Option<usize> {
        self.z_scores(conditioned)
            .iter()
            .position(|&z| z > self.threshold_z)
    }

    /// Onset index, or 0 when no crossing exists
    ///
    /// A quiet buffer and an activation that starts at the first sample both
    /// map to 0; use [`OnsetDetector::detect`] to tell them apart.
    pub fn onset_index(&self, conditioned: &[f64]) -> usize {
        self.detect(conditioned).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_tkeo_of_sine_is_constant() {
        // For A sin(wn) the operator yields A^2 sin^2(w)
        let w = 2.0 * PI * 50.0 / 1000.0;
        let signal: Vec<f64> = (0..100).map(|i| 2.0 * (w * i as f64).sin()).collect();
        let energy = tkeo(&signal);
        assert_eq!(energy[0], 0.0);
        assert_eq!(energy[99], 0.0);
        let expected = 4.0 * w.sin().powi(2);
        for value in &energy[1..99] {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tkeo_clamps_negative() {
        let energy = tkeo(&[1.0, 0.0, 1.0]);
        assert_eq!(energy, vec![0.0, 0.0, 0.0]);
        assert!(tkeo(&[]).is_empty());
        assert_eq!(tkeo(&[5.0]), vec![0.0]);
    }

    #[test]
    fn test_moving_average_same_alignment() {
        // Odd window: centred
        assert_eq!(
            moving_average(&[3.0, 3.0, 3.0, 3.0], 3),
            vec![2.0, 3.0, 3.0, 2.0]
        );
        // Even window: output i covers samples i-1 and i
        let smoothed = moving_average(&[0.0, 0.0, 4.0, 0.0], 2);
        assert_eq!(smoothed, vec![0.0, 0.0, 2.0, 2.0]);
    }

    #[test]
    fn test_moving_average_window_longer_than_signal() {
        let smoothed = moving_average(&[1.0, 1.0], 5);
        assert_eq!(smoothed, vec![0.4, 0.4]);
    }

    #[test]
    fn test_detects_burst_start() {
        let mut signal = vec![0.0; 2000];
        for (i, sample) in signal.iter_mut().enumerate().skip(1200) {
            *sample = 0.5 * (2.0 * PI * 100.0 * i as f64 / 1000.0).sin();
        }
        let onset = OnsetDetector::new(50, 2.0).detect(&signal).unwrap();
        // Smoothing centres the window, so the crossing can lead the burst
        assert!((1170..=1240).contains(&onset), "onset {}", onset);
    }

    #[test]
    fn test_no_crossing_defaults_to_zero() {
        let detector = OnsetDetector::new(50, 2.0);
        let flat = vec![0.0; 500];
        assert_eq!(detector.detect(&flat), None);
        assert_eq!(detector.onset_index(&flat), 0);
    }
}
