// src/config/assist_config.rs
//! Signal processing, classification and control parameters

use serde::{Deserialize, Serialize};

/// Tunable thresholds and filter/controller parameters for one session
///
/// Loaded once at session start and never mutated afterwards; share it by
/// reference (or `Arc`) across threads.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssistConfig {
    #[serde(default = "defaults::sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::bandpass_low_hz")]
    pub bandpass_low_hz: f64,

    #[serde(default = "defaults::bandpass_high_hz")]
    pub bandpass_high_hz: f64,

    #[serde(default = "defaults::notch_freq_hz")]
    pub notch_freq_hz: f64,

    #[serde(default = "defaults::notch_q")]
    pub notch_q: f64,

    #[serde(default = "defaults::rms_window_ms")]
    pub rms_window_ms: f64,

    #[serde(default = "defaults::tkeo_window_ms")]
    pub tkeo_window_ms: f64,

    #[serde(default = "defaults::reference_percentile")]
    pub reference_percentile: f64,

    #[serde(default = "defaults::target_activation")]
    pub target_activation: f64,

    #[serde(default = "defaults::onset_threshold_z")]
    pub onset_threshold_z: f64,

    #[serde(default = "defaults::noise_cv_threshold")]
    pub noise_cv_threshold: f64,

    #[serde(default = "defaults::snr_threshold_db")]
    pub snr_threshold_db: f64,

    #[serde(default = "defaults::low_activation_threshold")]
    pub low_activation_threshold: f64,

    #[serde(default = "defaults::low_activation_hold_s")]
    pub low_activation_hold_s: f64,

    #[serde(default = "defaults::assist_kp")]
    pub assist_kp: f64,

    #[serde(default = "defaults::assist_ki")]
    pub assist_ki: f64,

    /// Maximum change of the assist ratio per second
    #[serde(default = "defaults::assist_ramp_max")]
    pub assist_ramp_max: f64,

    #[serde(default = "defaults::assist_min")]
    pub assist_min: f64,

    #[serde(default = "defaults::assist_max")]
    pub assist_max: f64,

    /// Engage threshold of the assist latch; disengage happens at half of it
    #[serde(default = "defaults::hysteresis")]
    pub hysteresis: f64,

    #[serde(default = "defaults::safety_spike_sigma")]
    pub safety_spike_sigma: f64,

    /// Second-half SNR may fall at most this many dB below the first half
    #[serde(default = "defaults::safety_drop_db")]
    pub safety_drop_db: f64,
}

mod defaults {
    use crate::config::constants::*;

    pub fn sampling_rate_hz() -> f64 { signal::DEFAULT_SAMPLING_RATE_HZ }
    pub fn bandpass_low_hz() -> f64 { filters::DEFAULT_BANDPASS_LOW_HZ }
    pub fn bandpass_high_hz() -> f64 { filters::DEFAULT_BANDPASS_HIGH_HZ }
    pub fn notch_freq_hz() -> f64 { filters::DEFAULT_NOTCH_FREQ_HZ }
    pub fn notch_q() -> f64 { filters::DEFAULT_NOTCH_Q }
    pub fn rms_window_ms() -> f64 { features::DEFAULT_RMS_WINDOW_MS }
    pub fn tkeo_window_ms() -> f64 { features::DEFAULT_TKEO_WINDOW_MS }
    pub fn reference_percentile() -> f64 { calibration::DEFAULT_REFERENCE_PERCENTILE }
    pub fn target_activation() -> f64 { assessment::DEFAULT_TARGET_ACTIVATION }
    pub fn onset_threshold_z() -> f64 { features::DEFAULT_ONSET_THRESHOLD_Z }
    pub fn noise_cv_threshold() -> f64 { assessment::DEFAULT_NOISE_CV_THRESHOLD }
    pub fn snr_threshold_db() -> f64 { assessment::DEFAULT_SNR_THRESHOLD_DB }
    pub fn low_activation_threshold() -> f64 { assessment::DEFAULT_LOW_ACTIVATION_THRESHOLD }
    pub fn low_activation_hold_s() -> f64 { assessment::DEFAULT_LOW_ACTIVATION_HOLD_S }
    pub fn assist_kp() -> f64 { controller::DEFAULT_KP }
    pub fn assist_ki() -> f64 { controller::DEFAULT_KI }
    pub fn assist_ramp_max() -> f64 { controller::DEFAULT_RAMP_MAX_PER_S }
    pub fn assist_min() -> f64 { controller::DEFAULT_ASSIST_MIN }
    pub fn assist_max() -> f64 { controller::DEFAULT_ASSIST_MAX }
    pub fn hysteresis() -> f64 { controller::DEFAULT_HYSTERESIS }
    pub fn safety_spike_sigma() -> f64 { safety::DEFAULT_SPIKE_SIGMA }
    pub fn safety_drop_db() -> f64 { safety::DEFAULT_DROP_DB }
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::sampling_rate_hz(),
            bandpass_low_hz: defaults::bandpass_low_hz(),
            bandpass_high_hz: defaults::bandpass_high_hz(),
            notch_freq_hz: defaults::notch_freq_hz(),
            notch_q: defaults::notch_q(),
            rms_window_ms: defaults::rms_window_ms(),
            tkeo_window_ms: defaults::tkeo_window_ms(),
            reference_percentile: defaults::reference_percentile(),
            target_activation: defaults::target_activation(),
            onset_threshold_z: defaults::onset_threshold_z(),
            noise_cv_threshold: defaults::noise_cv_threshold(),
            snr_threshold_db: defaults::snr_threshold_db(),
            low_activation_threshold: defaults::low_activation_threshold(),
            low_activation_hold_s: defaults::low_activation_hold_s(),
            assist_kp: defaults::assist_kp(),
            assist_ki: defaults::assist_ki(),
            assist_ramp_max: defaults::assist_ramp_max(),
            assist_min: defaults::assist_min(),
            assist_max: defaults::assist_max(),
            hysteresis: defaults::hysteresis(),
            safety_spike_sigma: defaults::safety_spike_sigma(),
            safety_drop_db: defaults::safety_drop_db(),
        }
    }
}

impl AssistConfig {
    /// Nyquist frequency for the configured sampling rate
    pub fn nyquist_hz(&self) -> f64 {
        self.sampling_rate_hz / 2.0
    }

    /// Convert a duration in seconds to a whole number of samples (truncating)
    pub fn samples_for(&self, seconds: f64) -> usize {
        (seconds * self.sampling_rate_hz) as usize
    }

    /// RMS envelope window in samples, never less than one
    pub fn rms_window_samples(&self) -> usize {
        self.samples_for(self.rms_window_ms / 1000.0).max(1)
    }

    /// TKEO smoothing window in samples, never less than one
    pub fn tkeo_window_samples(&self) -> usize {
        self.samples_for(self.tkeo_window_ms / 1000.0).max(1)
    }
}

/// Validate assist configuration, collecting every problem found
pub fn validate_assist_config(config: &AssistConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !(config.sampling_rate_hz > 0.0) {
        errors.push("Sampling rate must be positive".to_string());
    }

    let nyquist = config.nyquist_hz();
    if config.bandpass_low_hz <= 0.0 {
        errors.push("Bandpass low cutoff must be positive".to_string());
    }
    if config.bandpass_high_hz <= config.bandpass_low_hz {
        errors.push(format!(
            "Bandpass high cutoff ({} Hz) must be above low cutoff ({} Hz)",
            config.bandpass_high_hz, config.bandpass_low_hz
        ));
    }
    if config.bandpass_high_hz >= nyquist {
        errors.push(format!(
            "Bandpass high cutoff ({} Hz) must be less than Nyquist frequency ({} Hz)",
            config.bandpass_high_hz, nyquist
        ));
    }
    if config.notch_freq_hz <= 0.0 || config.notch_freq_hz >= nyquist {
        errors.push(format!(
            "Notch frequency ({} Hz) must lie between 0 and Nyquist ({} Hz)",
            config.notch_freq_hz, nyquist
        ));
    }
    if config.notch_q <= 0.0 {
        errors.push("Notch quality factor must be positive".to_string());
    }

    if config.rms_window_ms <= 0.0 || config.tkeo_window_ms <= 0.0 {
        errors.push("Envelope and TKEO windows must be positive".to_string());
    }
    if !(0.0..=100.0).contains(&config.reference_percentile) {
        errors.push("Reference percentile must be between 0 and 100".to_string());
    }

    let non_negative = [
        ("target_activation", config.target_activation),
        ("onset_threshold_z", config.onset_threshold_z),
        ("noise_cv_threshold", config.noise_cv_threshold),
        ("snr_threshold_db", config.snr_threshold_db),
        ("low_activation_threshold", config.low_activation_threshold),
        ("low_activation_hold_s", config.low_activation_hold_s),
        ("assist_kp", config.assist_kp),
        ("assist_ki", config.assist_ki),
        ("assist_ramp_max", config.assist_ramp_max),
        ("assist_min", config.assist_min),
        ("assist_max", config.assist_max),
        ("hysteresis", config.hysteresis),
        ("safety_spike_sigma", config.safety_spike_sigma),
        ("safety_drop_db", config.safety_drop_db),
    ];
    for (name, value) in non_negative {
        // NaN fails this check as well
        if !(value >= 0.0) {
            errors.push(format!("{} must be non-negative, got {}", name, value));
        }
    }

    if config.assist_min > config.assist_max {
        errors.push(format!(
            "Assist bounds inverted: min {} > max {}",
            config.assist_min, config.assist_max
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AssistConfig::default();
        assert!(validate_assist_config(&config).is_ok());
    }

    #[test]
    fn test_window_samples() {
        let config = AssistConfig::default();
        assert_eq!(config.rms_window_samples(), 200);
        assert_eq!(config.tkeo_window_samples(), 50);
        assert_eq!(config.samples_for(1.5), 1500);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = AssistConfig {
            assist_min: 0.8,
            assist_max: 0.2,
            ..Default::default()
        };
        let errors = validate_assist_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("inverted")));
    }

    #[test]
    fn test_negative_gain_rejected() {
        let config = AssistConfig {
            assist_ki: -0.1,
            ..Default::default()
        };
        let errors = validate_assist_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("assist_ki")));
    }

    #[test]
    fn test_invalid_filter_config() {
        let mut config = AssistConfig::default();
        config.bandpass_high_hz = 600.0;
        assert!(validate_assist_config(&config).is_err());

        config.bandpass_high_hz = 10.0;
        assert!(validate_assist_config(&config).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = AssistConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AssistConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AssistConfig = toml::from_str("notch_freq_hz = 50.0").unwrap();
        assert_eq!(config.notch_freq_hz, 50.0);
        assert_eq!(config.bandpass_low_hz, 20.0);
    }
}
