//! EMG-Assist: closed-loop neuromuscular assist controller
//!
//! Compares an affected limb's EMG activation against a calibrated reference
//! from the unaffected limb and drives a bounded assist actuator:
//!
//! - Zero-phase bandpass + notch conditioning, RMS envelope, TKEO onset
//! - Classification into posture/electrode suspicion, hypoactivation or ok
//! - Signal-quality guard that forces the actuator to a safe state
//! - PI assist controller with hysteresis, ramp limiting and saturation
//! - Threaded line-protocol ingestion and pluggable command/notification sinks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emg_assist::actuator::{LogNotifier, SimulatedActuator};
//! use emg_assist::simulation::SignalGenerator;
//! use emg_assist::{AssistSession, SystemConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SystemConfig::default();
//!     let mut session = AssistSession::new(
//!         &config,
//!         Box::new(SimulatedActuator::new(&config.actuator)),
//!         Box::new(LogNotifier),
//!     )?;
//!
//!     let mut generator = SignalGenerator::new(config.assist.sampling_rate_hz, 7);
//!     session.calibrate(&generator.reference_recording())?;
//!
//!     if let Some(report) = session.run_once(&generator.sufficient_trial(), 3.0)? {
//!         println!("{} -> u = {:.3}", report.state, report.assist_ratio());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod acquisition;
pub mod actuator;
pub mod assessment;
pub mod calibration;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod processing;
pub mod safety;
pub mod service;
pub mod session;
pub mod simulation;

// Re-export commonly used types for convenience
pub use assessment::{assess, Assessment, AssessmentLabel};
pub use calibration::{CalibrationResult, Calibrator};
pub use config::{AssistConfig, ConfigLoader, SystemConfig};
pub use control::{AssistController, ControllerState};
pub use error::{AssistError, AssistResult, ProcessingStage};
pub use processing::{EmgFeatures, FeatureExtractor, SignalConditioner};
pub use safety::{SafetyGuard, SafetyVerdict};
pub use service::{AssistService, SessionStatus};
pub use session::{AssistSession, CycleReport, SessionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Closed-loop EMG assist controller for rehabilitation devices".to_string(),
        features: vec![
            "Zero-phase EMG conditioning".to_string(),
            "Reference-limb calibration".to_string(),
            "Posture and hypoactivation classification".to_string(),
            "Safety-guarded PI assist control".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}
