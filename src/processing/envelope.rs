// src/processing/envelope.rs
//! Moving RMS envelope

/// Windowed RMS with edge replication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeExtractor {
    window: usize,
}

impl EnvelopeExtractor {
    /// `window` is in samples; zero is raised to one
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// RMS envelope of `signal`, same length as the input
    ///
    /// Runs in O(n) from a cumulative sum of squares. The window shrinks to
    /// the signal length when the signal is shorter than one window.
    pub fn extract(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let window = self.window.min(n);

        let mut cumulative = Vec::with_capacity(n + 1);
        cumulative.push(0.0);
        let mut acc = 0.0;
        for &sample in signal {
            acc += sample * sample;
            cumulative.push(acc);
        }

        let valid: Vec<f64> = (0..=n - window)
            .map(|i| {
                let power = (cumulative[i + window] - cumulative[i]) / window as f64;
                // Rounding in the running sum can dip just below zero
                power.max(0.0).sqrt()
            })
            .collect();

        let left = window / 2;
        let right = n - valid.len() - left;
        let first = valid[0];
        let last = valid[valid.len() - 1];

        let mut envelope = Vec::with_capacity(n);
        envelope.extend(std::iter::repeat(first).take(left));
        envelope.extend_from_slice(&valid);
        envelope.extend(std::iter::repeat(last).take(right));
        envelope
    }
}
