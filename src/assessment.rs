// src/assessment.rs
//! Feature classification into posture, hypoactivation or ok

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::constants::assessment::{
    HYPOACTIVATION_BASE_CONFIDENCE, HYPOACTIVATION_DEFICIT_GAIN, MAX_CONFIDENCE, OK_CONFIDENCE,
    POSTURE_BASE_CONFIDENCE, POSTURE_DEFICIT_GAIN,
};
use crate::config::AssistConfig;
use crate::processing::EmgFeatures;

/// Classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentLabel {
    /// Artifacts or electrode/posture problems make the activation unreliable
    PostureSuspect,
    HypoactivationSuspect,
    Ok,
}

impl fmt::Display for AssessmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentLabel::PostureSuspect => write!(f, "posture_suspect"),
            AssessmentLabel::HypoactivationSuspect => write!(f, "hypoactivation_suspect"),
            AssessmentLabel::Ok => write!(f, "ok"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub label: AssessmentLabel,
    /// In `[0, 1]`
    pub confidence: f64,
    /// Target activation minus measured activation, never negative
    pub deficit: f64,
}

/// Classify features against the configured thresholds
///
/// Posture suspicion wins over hypoactivation: a contaminated signal cannot
/// support a deficit judgement.
pub fn assess(features: &EmgFeatures, config: &AssistConfig) -> Assessment {
    let deficit = (config.target_activation - features.mean_activation).max(0.0);
    let posture_flag = features.activation_cv >= config.noise_cv_threshold
        || features.snr_db < config.snr_threshold_db;
    let low_activation_flag =
        features.mean_activation < config.low_activation_threshold && !posture_flag;

    if posture_flag && deficit > 0.0 {
        Assessment {
            label: AssessmentLabel::PostureSuspect,
            confidence: MAX_CONFIDENCE.min(POSTURE_BASE_CONFIDENCE + POSTURE_DEFICIT_GAIN * deficit),
            deficit,
        }
    } else if low_activation_flag && deficit > 0.0 {
        Assessment {
            label: AssessmentLabel::HypoactivationSuspect,
            confidence: MAX_CONFIDENCE
                .min(HYPOACTIVATION_BASE_CONFIDENCE + HYPOACTIVATION_DEFICIT_GAIN * deficit),
            deficit,
        }
    } else {
        Assessment {
            label: AssessmentLabel::Ok,
            confidence: OK_CONFIDENCE,
            deficit: 0.0,
        }
    }
}
