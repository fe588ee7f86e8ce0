// src/error.rs
//! Unified error handling for the assist pipeline
//!
//! Only configuration problems, insufficient data and transport failures are
//! surfaced as errors. Signal-quality faults are a regular pipeline outcome
//! (see [`crate::session::SessionState::SafetyFault`]) and numerical
//! degeneracies are absorbed locally with epsilon floors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::actuator::TransportError;
use crate::config::ConfigError;
use crate::processing::filters::FilterError;

/// Unified error type for the assist system
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssistError {
    /// Invalid parameter combinations, detected at session start
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration { component: String, reason: String },

    /// A buffer was too short for the requested stage
    #[error("[DATA] Insufficient data for {stage}: need at least {required} samples, got {actual}")]
    InsufficientData {
        stage: ProcessingStage,
        required: usize,
        actual: usize,
    },

    /// Assessment was requested before a reference calibration existed
    #[error("[SESSION] No calibration available; calibrate the reference limb first")]
    NotCalibrated,

    /// Read or write failure on the physical link
    #[error("[COMM] Transport error during {operation}: {reason}")]
    Transport { operation: String, reason: String },
}

/// Pipeline stages for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    Conditioning,
    Calibration,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Conditioning => write!(f, "signal conditioning"),
            ProcessingStage::Calibration => write!(f, "calibration"),
        }
    }
}

/// Result type alias for assist operations
pub type AssistResult<T> = Result<T, AssistError>;

impl AssistError {
    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        AssistError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    pub fn insufficient(stage: ProcessingStage, required: usize, actual: usize) -> Self {
        AssistError::InsufficientData {
            stage,
            required,
            actual,
        }
    }

    /// Whether the error was caused by the caller's data rather than setup
    pub fn is_data_error(&self) -> bool {
        matches!(self, AssistError::InsufficientData { .. } | AssistError::NotCalibrated)
    }
}

impl From<FilterError> for AssistError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InsufficientSamples { required, actual } => {
                AssistError::insufficient(ProcessingStage::Conditioning, required, actual)
            }
            other => AssistError::configuration("signal_conditioner", other.to_string()),
        }
    }
}

impl From<ConfigError> for AssistError {
    fn from(err: ConfigError) -> Self {
        AssistError::configuration("config_loader", err.to_string())
    }
}

impl From<TransportError> for AssistError {
    fn from(err: TransportError) -> Self {
        AssistError::Transport {
            operation: err.operation().to_string(),
            reason: err.to_string(),
        }
    }
}
