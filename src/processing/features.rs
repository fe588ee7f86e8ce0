// src/processing/features.rs
//! Activation features around the detected onset

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationResult;
use crate::config::constants::features::{
    ANALYSIS_SEGMENT_S, DIVISION_EPSILON, MIN_SEGMENT_SAMPLES, POWER_EPSILON,
    PRE_ONSET_FALLBACK_FRACTION, SNR_SEGMENT_S,
};
use crate::config::AssistConfig;
use crate::processing::envelope::EnvelopeExtractor;
use crate::processing::onset::OnsetDetector;
use crate::processing::stats::{mean, mean_square, std_dev};

/// Features of one analysis buffer, normalised to the reference amplitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmgFeatures {
    pub onset_index: usize,
    /// Mean of envelope / A_ref over the analysis segment
    pub mean_activation: f64,
    /// Coefficient of variation of the same segment
    pub activation_cv: f64,
    pub snr_db: f64,
}

/// Power ratio in dB between two traces, each floored to avoid log of zero
pub fn snr_db(signal: &[f64], noise: &[f64]) -> f64 {
    let signal_power = mean_square(signal) + POWER_EPSILON;
    let noise_power = mean_square(noise) + POWER_EPSILON;
    10.0 * (signal_power / noise_power).log10()
}

/// Envelope, onset and segment statistics for conditioned buffers
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    envelope: EnvelopeExtractor,
    onset: OnsetDetector,
    segment_len: usize,
    snr_len: usize,
}

impl FeatureExtractor {
    pub fn new(config: &AssistConfig) -> Self {
        Self {
            envelope: EnvelopeExtractor::new(config.rms_window_samples()),
            onset: OnsetDetector::new(config.tkeo_window_samples(), config.onset_threshold_z),
            segment_len: config.samples_for(ANALYSIS_SEGMENT_S),
            snr_len: config.samples_for(SNR_SEGMENT_S),
        }
    }

    pub fn envelope(&self) -> &EnvelopeExtractor {
        &self.envelope
    }

    pub fn onset_detector(&self) -> &OnsetDetector {
        &self.onset
    }

    /// Extract features from an already conditioned buffer
    ///
    /// Short segments fall back to whole-trace statistics instead of failing;
    /// callers reject empty input before getting here.
    pub fn extract(&self, conditioned: &[f64], calibration: &CalibrationResult) -> EmgFeatures {
        let rectified: Vec<f64> = conditioned.iter().map(|v| v.abs()).collect();
        let activation: Vec<f64> = self
            .envelope
            .extract(&rectified)
            .iter()
            .map(|v| v / calibration.a_ref)
            .collect();

        let onset_index = self.onset.onset_index(conditioned);
        let n = activation.len();

        let segment_end = (onset_index + self.segment_len).min(n);
        let segment = &activation[onset_index.min(n)..segment_end];
        let stats_source = if segment.len() < MIN_SEGMENT_SAMPLES {
            &activation[..]
        } else {
            segment
        };
        let mean_activation = mean(stats_source);
        let activation_cv = std_dev(stats_source) / (mean_activation + DIVISION_EPSILON);

        let post_end = (onset_index + self.snr_len).min(n);
        let post = &activation[onset_index.min(n)..post_end];
        let pre = &activation[onset_index.saturating_sub(self.snr_len)..onset_index.min(n)];

        let post_source = if post.len() < MIN_SEGMENT_SAMPLES {
            &activation[..]
        } else {
            post
        };
        let snr = if pre.len() < MIN_SEGMENT_SAMPLES {
            let floor = vec![mean(&activation) * PRE_ONSET_FALLBACK_FRACTION; n];
            snr_db(post_source, &floor)
        } else {
            snr_db(post_source, pre)
        };

        let features = EmgFeatures {
            onset_index,
            mean_activation,
            activation_cv,
            snr_db: snr,
        };
        tracing::debug!(?features, "features extracted");
        features
    }
}
