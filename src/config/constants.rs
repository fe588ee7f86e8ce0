// src/config/constants.rs
//! System-wide configuration constants
//!
//! Every tunable default and numeric guard lives here so that processing code
//! never carries magic numbers.

/// Signal acquisition constants
pub mod signal {
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 1000.0;
    pub const MIN_SAMPLING_RATE_HZ: f64 = 100.0;
    pub const MAX_SAMPLING_RATE_HZ: f64 = 20_000.0;
}

/// Signal conditioning filter constants
pub mod filters {
    pub const BANDPASS_ORDER: usize = 4;
    pub const DEFAULT_BANDPASS_LOW_HZ: f64 = 20.0;
    pub const DEFAULT_BANDPASS_HIGH_HZ: f64 = 450.0;
    pub const DEFAULT_NOTCH_FREQ_HZ: f64 = 60.0;
    pub const DEFAULT_NOTCH_Q: f64 = 30.0;

    /// Zero-phase padding is this many times the filter's coefficient count
    pub const PADDING_FACTOR: usize = 3;
}

/// Envelope, onset and feature extraction constants
pub mod features {
    pub const DEFAULT_RMS_WINDOW_MS: f64 = 200.0;
    pub const DEFAULT_TKEO_WINDOW_MS: f64 = 50.0;
    pub const DEFAULT_ONSET_THRESHOLD_Z: f64 = 2.0;

    pub const ANALYSIS_SEGMENT_S: f64 = 1.5;
    pub const SNR_SEGMENT_S: f64 = 0.5;
    pub const MIN_SEGMENT_SAMPLES: usize = 10;

    /// Constant used for the pre-onset trace when no pre-onset samples exist
    pub const PRE_ONSET_FALLBACK_FRACTION: f64 = 0.1;

    pub const DIVISION_EPSILON: f64 = 1e-9;
    pub const POWER_EPSILON: f64 = 1e-12;
}

/// Calibration constants
pub mod calibration {
    pub const DEFAULT_REFERENCE_PERCENTILE: f64 = 95.0;
    pub const NOISE_PERCENTILE: f64 = 10.0;
    pub const MIN_REFERENCE_SAMPLES: usize = 100;
    pub const AMPLITUDE_FLOOR: f64 = 1e-6;
    pub const NOISE_EPSILON: f64 = 1e-9;
}

/// Classifier thresholds
pub mod assessment {
    pub const DEFAULT_TARGET_ACTIVATION: f64 = 0.5;
    pub const DEFAULT_NOISE_CV_THRESHOLD: f64 = 0.35;
    pub const DEFAULT_SNR_THRESHOLD_DB: f64 = 8.0;
    pub const DEFAULT_LOW_ACTIVATION_THRESHOLD: f64 = 0.3;
    pub const DEFAULT_LOW_ACTIVATION_HOLD_S: f64 = 2.0;

    pub const POSTURE_BASE_CONFIDENCE: f64 = 0.5;
    pub const POSTURE_DEFICIT_GAIN: f64 = 0.5;
    pub const HYPOACTIVATION_BASE_CONFIDENCE: f64 = 0.4;
    pub const HYPOACTIVATION_DEFICIT_GAIN: f64 = 0.8;
    pub const MAX_CONFIDENCE: f64 = 0.9;
    pub const OK_CONFIDENCE: f64 = 0.7;
}

/// Assist controller constants
pub mod controller {
    pub const DEFAULT_KP: f64 = 0.8;
    pub const DEFAULT_KI: f64 = 0.1;
    pub const DEFAULT_RAMP_MAX_PER_S: f64 = 0.2;
    pub const DEFAULT_ASSIST_MIN: f64 = 0.0;
    pub const DEFAULT_ASSIST_MAX: f64 = 1.0;
    pub const DEFAULT_HYSTERESIS: f64 = 0.05;
}

/// Safety guard constants
pub mod safety {
    pub const DEFAULT_SPIKE_SIGMA: f64 = 8.0;
    pub const DEFAULT_DROP_DB: f64 = 20.0;
    pub const MIN_HALF_SAMPLES: usize = 10;
}

/// Acquisition and ingestion constants
pub mod acquisition {
    pub const DEFAULT_BUFFER_CAPACITY: usize = 3000;
    pub const DEFAULT_ANALYSIS_WINDOW_S: f64 = 3.0;
    pub const DEFAULT_CALIBRATION_WINDOW_S: f64 = 1.0;
    pub const DEFAULT_MIN_PROCESS_SAMPLES: usize = 100;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
    pub const LINE_PREFIX: &str = "EMG:";
}

/// Actuator command constants
pub mod actuator {
    pub const DEFAULT_MAX_RETRACTION_MM: f64 = 20.0;
    pub const SIMULATED_SPEED_BASE_RPM: f64 = 30.0;
    pub const SIMULATED_SPEED_OFFSET: f64 = 0.5;
    pub const COMMAND_PREFIX: &str = "CMD";
}
