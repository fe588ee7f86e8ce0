// tests/common/mod.rs
//! Shared test doubles for integration tests

#![allow(dead_code)]

use emg_assist::actuator::{ActuatorCommand, CommandSink, NotificationSink, TransportError};
use emg_assist::simulation::SignalGenerator;
use emg_assist::{AssistSession, CalibrationResult, SystemConfig};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every command and message it receives
#[derive(Clone, Default)]
pub struct Recorder {
    pub commands: Arc<Mutex<Vec<ActuatorCommand>>>,
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn last_command(&self) -> Option<ActuatorCommand> {
        self.commands.lock().last().copied()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
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

/// Session wired to a recorder, calibrated on the synthetic reference recording
pub fn calibrated_session(seed: u64) -> (AssistSession, Recorder, SignalGenerator) {
    let config = SystemConfig::default();
    let recorder = Recorder::default();
    let mut session = AssistSession::new(
        &config,
        Box::new(recorder.clone()),
        Box::new(recorder.clone()),
    )
    .expect("default configuration is valid");

    let mut generator = SignalGenerator::new(config.assist.sampling_rate_hz, seed);
    session
        .calibrate(&generator.reference_recording())
        .expect("reference recording calibrates");
    (session, recorder, generator)
}

pub fn fixed_calibration() -> CalibrationResult {
    CalibrationResult {
        a_ref: 0.21,
        noise_level: 0.017,
    }
}
