// src/processing/conditioner.rs
//! Zero-phase bandpass and mains notch chain

use crate::config::constants::filters::BANDPASS_ORDER;
use crate::config::AssistConfig;
use crate::processing::filters::{butterworth_bandpass, iir_notch, FilterError, SosFilter};

/// Bandpass followed by notch, both run forward and backward
///
/// Filter coefficients are designed once at construction. Input must be
/// longer than the bandpass padding, see [`SignalConditioner::min_input_len`].
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    bandpass: SosFilter,
    notch: SosFilter,
}

impl SignalConditioner {
    pub fn new(config: &AssistConfig) -> Result<Self, FilterError> {
        let bandpass = butterworth_bandpass(
            BANDPASS_ORDER,
            config.bandpass_low_hz,
            config.bandpass_high_hz,
            config.sampling_rate_hz,
        )?;
        let notch = iir_notch(config.notch_freq_hz, config.notch_q, config.sampling_rate_hz)?;
        Ok(Self { bandpass, notch })
    }

    /// Smallest buffer the chain accepts (28 samples for the default order)
    pub fn min_input_len(&self) -> usize {
        self.bandpass.min_input_len().max(self.notch.min_input_len())
    }

    /// Filter a raw buffer; output has the same length as the input
    pub fn condition(&self, raw: &[f64]) -> Result<Vec<f64>, FilterError> {
        let required = self.min_input_len();
        if raw.len() < required {
            return Err(FilterError::InsufficientSamples {
                required,
                actual: raw.len(),
            });
        }
        let band_limited = self.bandpass.filtfilt(raw)?;
        self.notch.filtfilt(&band_limited)
    }

    pub fn bandpass(&self) -> &SosFilter {
        &self.bandpass
    }

    pub fn notch(&self) -> &SosFilter {
        &self.notch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::num_complex::Complex;
    use rustfft::FftPlanner;
    use std::f64::consts::PI;

    fn tone(freq: f64, amplitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / 1000.0).sin())
            .collect()
    }

    fn spectrum_magnitude(signal: &[f64], bin: usize) -> f64 {
        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let mut planner = FftPlanner::new();
        planner.plan_fft_forward(buffer.len()).process(&mut buffer);
        buffer[bin].norm()
    }

    #[test]
    fn test_minimum_length() {
        let conditioner = SignalConditioner::new(&AssistConfig::default()).unwrap();
        assert_eq!(conditioner.min_input_len(), 28);

        let short = vec![0.0; 27];
        assert_eq!(
            conditioner.condition(&short),
            Err(FilterError::InsufficientSamples { required: 28, actual: 27 })
        );
        assert_eq!(conditioner.condition(&vec![0.0; 28]).unwrap().len(), 28);
    }

    #[test]
    fn test_mains_and_drift_removed() {
        // 1 s at 1 kHz: FFT bin index equals frequency in Hz
        let n = 1000;
        let signal: Vec<f64> = tone(60.0, 1.0, n)
            .iter()
            .zip(tone(2.0, 1.0, n))
            .zip(tone(100.0, 0.5, n))
            .map(|((a, b), c)| a + b + c)
            .collect();

        let conditioner = SignalConditioner::new(&AssistConfig::default()).unwrap();
        let output = conditioner.condition(&signal).unwrap();

        let mains_in = spectrum_magnitude(&signal, 60);
        let mains_out = spectrum_magnitude(&output, 60);
        let drift_out = spectrum_magnitude(&output, 2);
        let band_in = spectrum_magnitude(&signal, 100);
        let band_out = spectrum_magnitude(&output, 100);

        assert!(mains_out < mains_in * 0.05, "60 Hz {} -> {}", mains_in, mains_out);
        assert!(drift_out < band_out * 0.01);
        assert!((band_out / band_in - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_deterministic() {
        let conditioner = SignalConditioner::new(&AssistConfig::default()).unwrap();
        let signal = tone(80.0, 0.3, 500);
        assert_eq!(
            conditioner.condition(&signal).unwrap(),
            conditioner.condition(&signal).unwrap()
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AssistConfig {
            bandpass_high_hz: 600.0,
            ..Default::default()
        };
        assert!(SignalConditioner::new(&config).is_err());
    }
}
