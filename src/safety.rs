// src/safety.rs
//! Signal-quality guard evaluated before every assist cycle

use serde::{Deserialize, Serialize};

use crate::config::constants::features::DIVISION_EPSILON;
use crate::config::constants::safety::MIN_HALF_SAMPLES;
use crate::config::AssistConfig;
use crate::processing::features::snr_db;
use crate::processing::stats::{mean, std_dev};

/// Which fault conditions fired on a buffer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// A sample deviated more than the spike threshold from the buffer mean
    pub spike: bool,
    /// Second-half SNR collapsed relative to the first half
    pub drop: bool,
}

impl SafetyVerdict {
    pub fn is_fault(&self) -> bool {
        self.spike || self.drop
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyGuard {
    spike_sigma: f64,
    drop_db: f64,
}

impl SafetyGuard {
    pub fn new(config: &AssistConfig) -> Self {
        Self {
            spike_sigma: config.safety_spike_sigma,
            drop_db: config.safety_drop_db,
        }
    }

    /// Evaluate a conditioned buffer
    ///
    /// The drop check needs at least 10 samples per half and is skipped for
    /// shorter buffers; the spike check always runs.
    pub fn check(&self, conditioned: &[f64]) -> SafetyVerdict {
        let verdict = SafetyVerdict {
            spike: self.has_spike(conditioned),
            drop: self.has_quality_drop(conditioned),
        };
        if verdict.is_fault() {
            tracing::warn!(spike = verdict.spike, drop = verdict.drop, "signal quality fault");
        }
        verdict
    }

    fn has_spike(&self, signal: &[f64]) -> bool {
        let m = mean(signal);
        let spread = std_dev(signal) + DIVISION_EPSILON;
        signal.iter().any(|v| ((v - m) / spread).abs() > self.spike_sigma)
    }

    fn has_quality_drop(&self, signal: &[f64]) -> bool {
        let half = signal.len() / 2;
        if half < MIN_HALF_SAMPLES {
            return false;
        }
        let first = half_snr_db(&signal[..half]);
        let second = half_snr_db(&signal[half..]);
        first - second > self.drop_db
    }
}

/// Power of a segment relative to its mean-removed power
fn half_snr_db(segment: &[f64]) -> f64 {
    let m = mean(segment);
    let centred: Vec<f64> = segment.iter().map(|v| v - m).collect();
    snr_db(segment, &centred)
}
