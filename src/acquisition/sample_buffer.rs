// src/acquisition/sample_buffer.rs
//! Bounded two-channel sample store shared between ingestion and processing

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::acquisition::protocol::EmgFrame;

#[derive(Debug, Default)]
struct Channels {
    reference: VecDeque<f64>,
    affected: VecDeque<f64>,
}

/// Reference and affected-limb samples, oldest dropped beyond capacity
///
/// The lock is held only while appending or copying; snapshots are owned
/// vectors so processing never runs under the lock.
#[derive(Debug)]
pub struct SampleBuffer {
    capacity: usize,
    channels: Mutex<Channels>,
}

impl SampleBuffer {
    /// `capacity` applies to each channel; zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            channels: Mutex::new(Channels {
                reference: VecDeque::with_capacity(capacity),
                affected: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a frame; single-value frames only feed the reference channel
    pub fn push(&self, frame: EmgFrame) {
        let mut channels = self.channels.lock();
        match frame {
            EmgFrame::Reference(value) => {
                push_bounded(&mut channels.reference, value, self.capacity);
            }
            EmgFrame::Paired { reference, affected } => {
                push_bounded(&mut channels.reference, reference, self.capacity);
                push_bounded(&mut channels.affected, affected, self.capacity);
            }
        }
    }

    /// Copy of the last `count` reference samples (fewer if not available)
    pub fn snapshot_reference(&self, count: usize) -> Vec<f64> {
        let channels = self.channels.lock();
        tail(&channels.reference, count)
    }

    /// Copy of the last `count` affected-limb samples (fewer if not available)
    pub fn snapshot_affected(&self, count: usize) -> Vec<f64> {
        let channels = self.channels.lock();
        tail(&channels.affected, count)
    }

    /// Buffered affected-limb samples
    pub fn len(&self) -> usize {
        self.channels.lock().affected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reference_len(&self) -> usize {
        self.channels.lock().reference.len()
    }

    pub fn clear(&self) {
        let mut channels = self.channels.lock();
        channels.reference.clear();
        channels.affected.clear();
    }
}

fn push_bounded(channel: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if channel.len() == capacity {
        channel.pop_front();
    }
    channel.push_back(value);
}

fn tail(channel: &VecDeque<f64>, count: usize) -> Vec<f64> {
    let skip = channel.len().saturating_sub(count);
    channel.iter().skip(skip).copied().collect()
}
