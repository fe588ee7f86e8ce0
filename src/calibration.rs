// src/calibration.rs
//! Reference amplitude calibration from the unaffected limb

use serde::{Deserialize, Serialize};

use crate::config::constants::calibration::{
    AMPLITUDE_FLOOR, MIN_REFERENCE_SAMPLES, NOISE_EPSILON, NOISE_PERCENTILE,
};
use crate::config::AssistConfig;
use crate::error::{AssistError, AssistResult, ProcessingStage};
use crate::processing::envelope::EnvelopeExtractor;
use crate::processing::stats::{mean, percentile};
use crate::processing::SignalConditioner;

/// Reference activation amplitude and noise floor for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Envelope amplitude that maps to activation 1.0; always positive
    pub a_ref: f64,
    pub noise_level: f64,
}

/// One-shot calibrator; holds no state between runs
#[derive(Debug, Clone)]
pub struct Calibrator {
    conditioner: SignalConditioner,
    envelope: EnvelopeExtractor,
    percentile: f64,
}

impl Calibrator {
    pub fn new(config: &AssistConfig) -> AssistResult<Self> {
        Ok(Self {
            conditioner: SignalConditioner::new(config)?,
            envelope: EnvelopeExtractor::new(config.rms_window_samples()),
            percentile: config.reference_percentile,
        })
    }

    /// Minimum reference buffer length
    pub fn min_samples(&self) -> usize {
        MIN_REFERENCE_SAMPLES.max(self.conditioner.min_input_len())
    }

    pub fn calibrate(&self, reference_raw: &[f64]) -> AssistResult<CalibrationResult> {
        let required = self.min_samples();
        if reference_raw.len() < required {
            return Err(AssistError::insufficient(
                ProcessingStage::Calibration,
                required,
                reference_raw.len(),
            ));
        }

        let conditioned = self.conditioner.condition(reference_raw)?;
        let rectified: Vec<f64> = conditioned.iter().map(|v| v.abs()).collect();
        let envelope = self.envelope.extract(&rectified);

        let a_ref = percentile(&envelope, self.percentile).max(AMPLITUDE_FLOOR);

        let p10 = percentile(&envelope, NOISE_PERCENTILE);
        let quiet: Vec<f64> = envelope.iter().copied().filter(|&v| v <= p10).collect();
        let noise_level = (mean(&quiet) + NOISE_EPSILON).max(AMPLITUDE_FLOOR);

        tracing::info!(a_ref, noise_level, samples = reference_raw.len(), "reference calibrated");
        Ok(CalibrationResult { a_ref, noise_level })
    }
}
