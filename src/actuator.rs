// src/actuator.rs
//! Actuator command and operator notification sinks

use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use thiserror::Error;

use crate::config::constants::actuator::COMMAND_PREFIX;
use crate::config::ActuatorConfig;

/// Link-level failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("link is disconnected")]
    Disconnected,
}

impl TransportError {
    /// Operation that failed, for error reporting
    pub fn operation(&self) -> &'static str {
        match self {
            TransportError::Write(_) | TransportError::Disconnected => "send_command",
            TransportError::Read(_) => "read_samples",
        }
    }
}

/// Assist ratio plus the retraction distance derived from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub assist_ratio: f64,
    pub retract_mm: f64,
}

impl ActuatorCommand {
    /// Scale the assist ratio linearly to a retraction distance
    pub fn from_ratio(assist_ratio: f64, config: &ActuatorConfig) -> Self {
        Self {
            assist_ratio,
            retract_mm: config.max_retraction_mm * assist_ratio,
        }
    }

    pub fn neutral() -> Self {
        Self {
            assist_ratio: 0.0,
            retract_mm: 0.0,
        }
    }

    /// Wire form, newline terminated
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} u={:.3},mm={:.1}",
            COMMAND_PREFIX, self.assist_ratio, self.retract_mm
        )
    }
}

/// Destination for actuator commands; only the latest command matters
pub trait CommandSink: Send {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool {
        true
    }
}

/// Fire-and-forget operator messages
pub trait NotificationSink: Send {
    fn notify(&mut self, message: &str);
}

/// Writes command lines to a serial-like byte stream
pub struct SerialCommandSink<W: Write + Send> {
    writer: W,
    connected: bool,
}

impl<W: Write + Send> SerialCommandSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            connected: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> CommandSink for SerialCommandSink<W> {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        let line = command.to_line();
        let result = self
            .writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            self.connected = false;
            tracing::warn!(error = %e, "actuator link write failed, marking disconnected");
            return Err(TransportError::Write(e.to_string()));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Motion the simulated actuator would perform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMotion {
    pub assist_ratio: f64,
    pub retract_mm: f64,
    pub speed_rpm: f64,
}

/// Stand-in when no physical link is attached
pub struct SimulatedActuator {
    speed_base_rpm: f64,
    speed_offset: f64,
    last: Option<SimulatedMotion>,
}

impl SimulatedActuator {
    pub fn new(config: &ActuatorConfig) -> Self {
        Self {
            speed_base_rpm: config.simulated_speed_base_rpm,
            speed_offset: config.simulated_speed_offset,
            last: None,
        }
    }

    pub fn last_motion(&self) -> Option<SimulatedMotion> {
        self.last
    }
}

impl CommandSink for SimulatedActuator {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        let motion = SimulatedMotion {
            assist_ratio: command.assist_ratio,
            retract_mm: command.retract_mm,
            speed_rpm: self.speed_base_rpm * (self.speed_offset + command.assist_ratio),
        };
        tracing::info!(
            retract_mm = motion.retract_mm,
            speed_rpm = motion.speed_rpm,
            "simulated motor command"
        );
        self.last = Some(motion);
        Ok(())
    }
}

/// Routes operator messages to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&mut self, message: &str) {
        tracing::info!(target: "operator", "{}", message);
    }
}

/// Forwards operator messages over a channel; drops them once the receiver is gone
pub struct ChannelNotifier {
    sender: Sender<String>,
}

impl ChannelNotifier {
    pub fn new(sender: Sender<String>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&mut self, message: &str) {
        if self.sender.try_send(message.to_string()).is_err() {
            tracing::trace!("operator notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_command_line_format() {
        let command = ActuatorCommand::from_ratio(0.25, &ActuatorConfig::default());
        assert_eq!(command.to_line(), "CMD u=0.250,mm=5.0\n");
        assert_eq!(ActuatorCommand::neutral().to_line(), "CMD u=0.000,mm=0.0\n");
    }

    #[test]
    fn test_serial_sink_writes_lines() {
        let mut sink = SerialCommandSink::new(Vec::new());
        sink.send(&ActuatorCommand::from_ratio(0.5, &ActuatorConfig::default())).unwrap();
        sink.send(&ActuatorCommand::neutral()).unwrap();
        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(written, "CMD u=0.500,mm=10.0\nCMD u=0.000,mm=0.0\n");
    }

    #[test]
    fn test_serial_sink_disconnects_on_failure() {
        let mut sink = SerialCommandSink::new(BrokenWriter);
        let err = sink.send(&ActuatorCommand::neutral()).unwrap_err();
        assert!(matches!(err, TransportError::Write(_)));
        assert_eq!(err.operation(), "send_command");
        assert!(!sink.is_connected());
        assert_eq!(sink.send(&ActuatorCommand::neutral()), Err(TransportError::Disconnected));
    }

    #[test]
    fn test_simulated_speed() {
        let mut actuator = SimulatedActuator::new(&ActuatorConfig::default());
        assert!(actuator.last_motion().is_none());
        actuator
            .send(&ActuatorCommand::from_ratio(0.5, &ActuatorConfig::default()))
            .unwrap();
        let motion = actuator.last_motion().unwrap();
        assert_eq!(motion.speed_rpm, 30.0);
        assert_eq!(motion.retract_mm, 10.0);
    }

    #[test]
    fn test_channel_notifier() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let mut notifier = ChannelNotifier::new(tx);
        notifier.notify("hello");
        assert_eq!(rx.recv().unwrap(), "hello");

        drop(rx);
        // Must not panic once the receiver is gone
        notifier.notify("nobody listening");
    }
}
