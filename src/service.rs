// src/service.rs
//! Session facade tying the shared sample buffer to the orchestrator

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::acquisition::{IngestWorker, LinkStatus, SampleBuffer};
use crate::actuator::{CommandSink, NotificationSink};
use crate::calibration::CalibrationResult;
use crate::config::SystemConfig;
use crate::error::AssistResult;
use crate::session::{AssistSession, CycleReport};

/// Read-only status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub transport_connected: bool,
    pub calibrated: bool,
    /// Affected-limb samples currently buffered
    pub buffered_samples: usize,
}

/// Thread-safe entry point for a running session
///
/// Ingestion writes into the shared [`SampleBuffer`]; `calibrate` and
/// `process_latest` copy the window they need and then process outside the
/// buffer lock. The session lock serialises orchestrator cycles. Status reads
/// never take the session lock; they see the flags published after the last
/// calibration or cycle.
pub struct AssistService {
    config: SystemConfig,
    buffer: Arc<SampleBuffer>,
    link: LinkStatus,
    session: Mutex<AssistSession>,
    calibrated: AtomicBool,
    commands_connected: AtomicBool,
}

impl AssistService {
    pub fn new(
        config: SystemConfig,
        commands: Box<dyn CommandSink>,
        notifier: Box<dyn NotificationSink>,
    ) -> AssistResult<Self> {
        let session = AssistSession::new(&config, commands, notifier)?;
        Ok(Self {
            buffer: Arc::new(SampleBuffer::new(config.acquisition.buffer_capacity)),
            link: LinkStatus::default(),
            calibrated: AtomicBool::new(session.is_calibrated()),
            commands_connected: AtomicBool::new(session.commands_connected()),
            session: Mutex::new(session),
            config,
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn buffer(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.buffer)
    }

    pub fn link(&self) -> LinkStatus {
        self.link.clone()
    }

    /// Worker that feeds this service's buffer and link status
    pub fn ingest_worker(&self) -> IngestWorker {
        IngestWorker::new(
            self.buffer(),
            self.link(),
            Duration::from_millis(self.config.acquisition.poll_interval_ms),
        )
    }

    /// Calibrate from the trailing reference-limb window
    pub fn calibrate(&self) -> AssistResult<CalibrationResult> {
        let window = self.config.calibration_window_samples();
        let reference = self.buffer.snapshot_reference(window);
        let mut session = self.session.lock();
        let result = session.calibrate(&reference);
        self.calibrated.store(session.is_calibrated(), Ordering::Release);
        result
    }

    /// Run one cycle on the trailing analysis window
    ///
    /// A no-op until enough affected-limb samples are buffered.
    pub fn process_latest(&self, dt: f64) -> AssistResult<Option<CycleReport>> {
        let window = self.config.analysis_window_samples();
        let snapshot = self.buffer.snapshot_affected(window);
        if snapshot.len() < self.config.acquisition.min_process_samples {
            tracing::trace!(buffered = snapshot.len(), "waiting for samples");
            return Ok(None);
        }
        let mut session = self.session.lock();
        let result = session.run_once(&snapshot, dt);
        self.commands_connected
            .store(session.commands_connected(), Ordering::Release);
        result
    }

    /// Snapshot of link, calibration and buffer state
    ///
    /// The transport counts as connected only while both the sample link and
    /// the command link are up.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            transport_connected: self.link.is_connected()
                && self.commands_connected.load(Ordering::Acquire),
            calibrated: self.calibrated.load(Ordering::Acquire),
            buffered_samples: self.buffer.len(),
        }
    }
}
