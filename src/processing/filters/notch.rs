// src/processing/filters/notch.rs
//! Second-order IIR notch for mains interference

use super::{Biquad, FilterError, SosFilter};
use std::f64::consts::PI;

/// Design a notch at `freq_hz` with quality factor `q`
///
/// The stopband width is `freq_hz / q`, measured between the -3 dB points.
pub fn iir_notch(freq_hz: f64, q: f64, sample_rate: f64) -> Result<SosFilter, FilterError> {
    let nyquist = sample_rate / 2.0;
    if !(freq_hz > 0.0 && freq_hz < nyquist) {
        return Err(FilterError::InvalidParameters(format!(
            "Notch frequency {} Hz must lie in (0, {}) Hz",
            freq_hz, nyquist
        )));
    }
    if !(q > 0.0) {
        return Err(FilterError::InvalidParameters("Quality factor must be positive".to_string()));
    }

    let w0 = PI * freq_hz / nyquist;
    let bandwidth = w0 / q;
    let beta = (bandwidth / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    let section = Biquad::new(
        [gain, -2.0 * gain * cos_w0, gain],
        [-2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    );
    SosFilter::new(vec![section])
}
