// src/config/mod.rs
//! Session configuration: processing parameters, acquisition and actuator settings

pub mod constants;
pub mod assist_config;
pub mod loader;

pub use constants::*;
pub use assist_config::*;
pub use loader::{ConfigLoader, ConfigError};

use serde::{Deserialize, Serialize};

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub assist: AssistConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

/// Sample ingestion and windowing settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AcquisitionConfig {
    /// Samples kept per limb channel before the oldest are dropped
    #[serde(default = "defaults::buffer_capacity")]
    pub buffer_capacity: usize,

    #[serde(default = "defaults::analysis_window_s")]
    pub analysis_window_s: f64,

    #[serde(default = "defaults::calibration_window_s")]
    pub calibration_window_s: f64,

    /// Processing is skipped until this many affected-limb samples are buffered
    #[serde(default = "defaults::min_process_samples")]
    pub min_process_samples: usize,

    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Actuator command scaling
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ActuatorConfig {
    /// Retraction distance commanded at assist ratio 1.0
    #[serde(default = "defaults::max_retraction_mm")]
    pub max_retraction_mm: f64,

    #[serde(default = "defaults::simulated_speed_base_rpm")]
    pub simulated_speed_base_rpm: f64,

    #[serde(default = "defaults::simulated_speed_offset")]
    pub simulated_speed_offset: f64,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn buffer_capacity() -> usize { acquisition::DEFAULT_BUFFER_CAPACITY }
    pub fn analysis_window_s() -> f64 { acquisition::DEFAULT_ANALYSIS_WINDOW_S }
    pub fn calibration_window_s() -> f64 { acquisition::DEFAULT_CALIBRATION_WINDOW_S }
    pub fn min_process_samples() -> usize { acquisition::DEFAULT_MIN_PROCESS_SAMPLES }
    pub fn poll_interval_ms() -> u64 { acquisition::DEFAULT_POLL_INTERVAL_MS }

    pub fn max_retraction_mm() -> f64 { actuator::DEFAULT_MAX_RETRACTION_MM }
    pub fn simulated_speed_base_rpm() -> f64 { actuator::SIMULATED_SPEED_BASE_RPM }
    pub fn simulated_speed_offset() -> f64 { actuator::SIMULATED_SPEED_OFFSET }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: defaults::buffer_capacity(),
            analysis_window_s: defaults::analysis_window_s(),
            calibration_window_s: defaults::calibration_window_s(),
            min_process_samples: defaults::min_process_samples(),
            poll_interval_ms: defaults::poll_interval_ms(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            max_retraction_mm: defaults::max_retraction_mm(),
            simulated_speed_base_rpm: defaults::simulated_speed_base_rpm(),
            simulated_speed_offset: defaults::simulated_speed_offset(),
        }
    }
}

impl SystemConfig {
    /// Validate configuration consistency across all sections
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = match validate_assist_config(&self.assist) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        let acq = &self.acquisition;
        if acq.buffer_capacity == 0 {
            errors.push("Buffer capacity must be greater than 0".to_string());
        }
        if acq.analysis_window_s <= 0.0 || acq.calibration_window_s <= 0.0 {
            errors.push("Analysis and calibration windows must be positive".to_string());
        }
        if acq.min_process_samples > acq.buffer_capacity {
            errors.push(format!(
                "Minimum processing samples ({}) exceed buffer capacity ({})",
                acq.min_process_samples, acq.buffer_capacity
            ));
        }

        if self.actuator.max_retraction_mm <= 0.0 {
            errors.push("Maximum retraction must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Analysis window in samples at the configured sampling rate
    pub fn analysis_window_samples(&self) -> usize {
        self.assist.samples_for(self.acquisition.analysis_window_s)
    }

    /// Calibration window in samples at the configured sampling rate
    pub fn calibration_window_samples(&self) -> usize {
        self.assist.samples_for(self.acquisition.calibration_window_s)
    }
}
