// src/session.rs
//! Per-session orchestrator: guard, features, classification and control
//!
//! One [`AssistSession`] owns every piece of mutable session state (controller,
//! calibration, low-activation hold timer) together with the injected command
//! and notification sinks. Callers serialise `run_once` invocations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actuator::{ActuatorCommand, CommandSink, NotificationSink};
use crate::assessment::{assess, Assessment, AssessmentLabel};
use crate::calibration::{CalibrationResult, Calibrator};
use crate::config::{ActuatorConfig, AssistConfig, SystemConfig};
use crate::control::{AssistController, ControllerState};
use crate::error::{AssistError, AssistResult};
use crate::processing::{EmgFeatures, FeatureExtractor, SignalConditioner};
use crate::safety::{SafetyGuard, SafetyVerdict};

const SAFETY_MESSAGE: &str =
    "Safety warning: abnormal signal detected. Check electrodes and posture, then retry.";
const POSTURE_MESSAGE: &str =
    "Posture or electrode issue suspected: check electrode contact, skin preparation and limb alignment.";
const SUFFICIENT_MESSAGE: &str = "Activation is sufficient; continuing without assist.";
const NOT_CALIBRATED_MESSAGE: &str =
    "Calibration required: record the reference limb before starting assist.";

/// Outcome of one orchestrator cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Signal-quality fault; re-evaluated every cycle
    SafetyFault,
    PostureSuspect,
    /// Hypoactivation seen but not yet held long enough
    LowActivationPending,
    LowActivationAssist,
    Normal,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::SafetyFault => "SAFETY_FAULT",
            SessionState::PostureSuspect => "POSTURE_SUSPECT",
            SessionState::LowActivationPending => "LOW_ACT_PENDING",
            SessionState::LowActivationAssist => "LOW_ACT_ASSIST",
            SessionState::Normal => "NORMAL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub state: SessionState,
    pub command: ActuatorCommand,
    /// False when the command sink rejected the command
    pub command_delivered: bool,
    pub safety: SafetyVerdict,
    /// Absent on safety faults
    pub features: Option<EmgFeatures>,
    pub assessment: Option<Assessment>,
    pub hold_elapsed_s: f64,
}

impl CycleReport {
    pub fn assist_ratio(&self) -> f64 {
        self.command.assist_ratio
    }
}

pub struct AssistSession {
    assist: AssistConfig,
    actuator: ActuatorConfig,
    conditioner: SignalConditioner,
    calibrator: Calibrator,
    extractor: FeatureExtractor,
    guard: SafetyGuard,
    controller: AssistController,
    calibration: Option<CalibrationResult>,
    hold_elapsed_s: f64,
    last_state: Option<SessionState>,
    commands: Box<dyn CommandSink>,
    notifier: Box<dyn NotificationSink>,
}

impl AssistSession {
    /// Validate the configuration and design the filters
    pub fn new(
        config: &SystemConfig,
        commands: Box<dyn CommandSink>,
        notifier: Box<dyn NotificationSink>,
    ) -> AssistResult<Self> {
        config
            .validate_consistency()
            .map_err(|errors| AssistError::configuration("session", errors.join("; ")))?;

        let assist = config.assist.clone();
        Ok(Self {
            conditioner: SignalConditioner::new(&assist)?,
            calibrator: Calibrator::new(&assist)?,
            extractor: FeatureExtractor::new(&assist),
            guard: SafetyGuard::new(&assist),
            controller: AssistController::new(&assist),
            actuator: config.actuator.clone(),
            assist,
            calibration: None,
            hold_elapsed_s: 0.0,
            last_state: None,
            commands,
            notifier,
        })
    }

    pub fn config(&self) -> &AssistConfig {
        &self.assist
    }

    /// Run the calibrator on a reference-limb buffer and keep the result
    ///
    /// A failed run leaves any previous calibration and the controller as
    /// they were.
    pub fn calibrate(&mut self, reference_raw: &[f64]) -> AssistResult<CalibrationResult> {
        let result = self.calibrator.calibrate(reference_raw)?;
        self.calibration = Some(result);
        Ok(result)
    }

    /// Install a calibration computed elsewhere
    pub fn set_calibration(&mut self, calibration: CalibrationResult) {
        self.calibration = Some(calibration);
    }

    pub fn calibration(&self) -> Option<CalibrationResult> {
        self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn hold_elapsed_s(&self) -> f64 {
        self.hold_elapsed_s
    }

    /// Whether the command sink still reports a usable link
    pub fn commands_connected(&self) -> bool {
        self.commands.is_connected()
    }

    pub fn last_state(&self) -> Option<SessionState> {
        self.last_state
    }

    /// Process one affected-limb buffer covering `dt` seconds since the last call
    ///
    /// Returns `Ok(None)` for an empty buffer. Failures command zero output and
    /// notify the operator before being returned.
    pub fn run_once(&mut self, raw: &[f64], dt: f64) -> AssistResult<Option<CycleReport>> {
        if raw.is_empty() {
            tracing::debug!("no samples, cycle skipped");
            return Ok(None);
        }
        if !(dt.is_finite() && dt >= 0.0) {
            let err = AssistError::configuration("session", format!("invalid cycle duration {}", dt));
            self.fail_safe(&format!("Assist paused: {}", err));
            return Err(err);
        }

        let calibration = match self.calibration {
            Some(calibration) => calibration,
            None => {
                self.fail_safe(NOT_CALIBRATED_MESSAGE);
                return Err(AssistError::NotCalibrated);
            }
        };

        let conditioned = match self.conditioner.condition(raw) {
            Ok(conditioned) => conditioned,
            Err(e) => {
                let err = AssistError::from(e);
                self.fail_safe(&format!("Assist paused: {}", err));
                return Err(err);
            }
        };

        let safety = self.guard.check(&conditioned);
        if safety.is_fault() {
            self.controller.reset_integral();
            self.controller.hold_zero();
            self.hold_elapsed_s = 0.0;
            self.notifier.notify(SAFETY_MESSAGE);
            return Ok(Some(self.finish(SessionState::SafetyFault, 0.0, safety, None, None)));
        }

        let features = self.extractor.extract(&conditioned, &calibration);
        let assessment = assess(&features, &self.assist);
        tracing::debug!(
            label = %assessment.label,
            confidence = assessment.confidence,
            deficit = assessment.deficit,
            "signal assessed"
        );

        let (state, ratio) = match assessment.label {
            AssessmentLabel::PostureSuspect => {
                self.controller.hold_zero();
                self.hold_elapsed_s = 0.0;
                self.notifier.notify(POSTURE_MESSAGE);
                (SessionState::PostureSuspect, 0.0)
            }
            AssessmentLabel::HypoactivationSuspect => {
                self.hold_elapsed_s += dt;
                if self.hold_elapsed_s >= self.assist.low_activation_hold_s {
                    let ratio = self.controller.step(assessment.deficit, dt);
                    self.notifier.notify(&format!(
                        "Low activation suspected: applying assist ratio {:.2}.",
                        ratio
                    ));
                    (SessionState::LowActivationAssist, ratio)
                } else {
                    self.controller.hold_zero();
                    self.notifier.notify(&format!(
                        "Low activation trend observed: assist starts if it persists for {:.1} s.",
                        self.assist.low_activation_hold_s
                    ));
                    (SessionState::LowActivationPending, 0.0)
                }
            }
            AssessmentLabel::Ok => {
                self.hold_elapsed_s = 0.0;
                let ratio = self.controller.step(0.0, dt);
                self.notifier.notify(SUFFICIENT_MESSAGE);
                (SessionState::Normal, ratio)
            }
        };

        Ok(Some(self.finish(state, ratio, safety, Some(features), Some(assessment))))
    }

    fn finish(
        &mut self,
        state: SessionState,
        ratio: f64,
        safety: SafetyVerdict,
        features: Option<EmgFeatures>,
        assessment: Option<Assessment>,
    ) -> CycleReport {
        let (command, command_delivered) = self.dispatch(ratio);
        if self.last_state != Some(state) {
            tracing::info!(from = ?self.last_state, to = %state, "session state changed");
            self.last_state = Some(state);
        }
        CycleReport {
            state,
            command,
            command_delivered,
            safety,
            features,
            assessment,
            hold_elapsed_s: self.hold_elapsed_s,
        }
    }

    /// Command zero, forget the hold timer and tell the operator why
    fn fail_safe(&mut self, message: &str) {
        self.controller.hold_zero();
        self.hold_elapsed_s = 0.0;
        self.dispatch(0.0);
        self.notifier.notify(message);
    }

    fn dispatch(&mut self, ratio: f64) -> (ActuatorCommand, bool) {
        let command = ActuatorCommand::from_ratio(ratio, &self.actuator);
        match self.commands.send(&command) {
            Ok(()) => (command, true),
            Err(e) => {
                tracing::warn!(error = %e, "actuator command not delivered");
                (command, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::TransportError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recorder {
        commands: Arc<Mutex<Vec<ActuatorCommand>>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl CommandSink for Recorder {
        fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
            self.commands.lock().push(*command);
            Ok(())
        }
    }

    impl NotificationSink for Recorder {
        fn notify(&mut self, message: &str) {
            self.messages.lock().push(message.to_string());
        }
    }

    fn session() -> (AssistSession, Recorder) {
        let recorder = Recorder::default();
        let session = AssistSession::new(
            &SystemConfig::default(),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
        )
        .unwrap();
        (session, recorder)
    }

    fn calibrated() -> (AssistSession, Recorder) {
        let (mut session, recorder) = session();
        session.set_calibration(CalibrationResult {
            a_ref: 0.2,
            noise_level: 0.01,
        });
        (session, recorder)
    }

    fn quiet_buffer() -> Vec<f64> {
        (0..3000).map(|i| if i % 2 == 0 { 1e-4 } else { -1e-4 }).collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SystemConfig::default();
        config.assist.assist_min = 2.0;
        let recorder = Recorder::default();
        let result = AssistSession::new(&config, Box::new(recorder.clone()), Box::new(recorder));
        assert!(matches!(result, Err(AssistError::Configuration { .. })));
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let (mut session, recorder) = calibrated();
        assert_eq!(session.run_once(&[], 0.1).unwrap(), None);
        assert!(recorder.commands.lock().is_empty());
        assert!(recorder.messages.lock().is_empty());
    }

    #[test]
    fn test_not_calibrated_commands_zero() {
        let (mut session, recorder) = session();
        let err = session.run_once(&quiet_buffer(), 0.1).unwrap_err();
        assert_eq!(err, AssistError::NotCalibrated);
        assert_eq!(recorder.commands.lock().as_slice(), &[ActuatorCommand::neutral()]);
        assert_eq!(recorder.messages.lock().len(), 1);
    }

    #[test]
    fn test_short_buffer_is_insufficient_data() {
        let (mut session, recorder) = calibrated();
        let err = session.run_once(&[0.0; 10], 0.1).unwrap_err();
        assert!(err.is_data_error());
        assert_eq!(recorder.commands.lock().last().unwrap().assist_ratio, 0.0);
    }

    #[test]
    fn test_negative_dt_rejected() {
        let (mut session, _) = calibrated();
        assert!(matches!(
            session.run_once(&quiet_buffer(), -1.0),
            Err(AssistError::Configuration { .. })
        ));
    }

    #[test]
    fn test_spike_forces_safe_state() {
        let (mut session, recorder) = calibrated();
        let mut buffer = quiet_buffer();
        buffer[1500] = 5.0;

        let report = session.run_once(&buffer, 0.1).unwrap().unwrap();
        assert_eq!(report.state, SessionState::SafetyFault);
        assert_eq!(report.assist_ratio(), 0.0);
        assert!(report.features.is_none());
        assert!(report.assessment.is_none());
        assert_eq!(session.controller_state().integral, 0.0);
        assert_eq!(recorder.messages.lock().last().unwrap(), SAFETY_MESSAGE);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::LowActivationPending.to_string(), "LOW_ACT_PENDING");
        assert_eq!(SessionState::SafetyFault.to_string(), "SAFETY_FAULT");
    }
}
