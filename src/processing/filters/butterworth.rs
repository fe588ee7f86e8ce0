// src/processing/filters/butterworth.rs
//! Butterworth bandpass design as second-order sections

use super::{Biquad, FilterError, SosFilter};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Largest prototype order accepted
pub const MAX_BUTTERWORTH_ORDER: usize = 8;

/// Prototype poles closer than this to the real axis are treated as real
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Design a Butterworth bandpass filter
///
/// `order` is the prototype order; the resulting filter has `2 * order` poles
/// split into `order` biquad sections. The passband gain is normalised to one
/// at the geometric centre of the pre-warped band edges.
pub fn butterworth_bandpass(
    order: usize,
    low_hz: f64,
    high_hz: f64,
    sample_rate: f64,
) -> Result<SosFilter, FilterError> {
    if order == 0 || order > MAX_BUTTERWORTH_ORDER {
        return Err(FilterError::InvalidParameters(format!(
            "Order must be 1-{}",
            MAX_BUTTERWORTH_ORDER
        )));
    }
    if !(sample_rate > 0.0) {
        return Err(FilterError::InvalidParameters("Sample rate must be positive".to_string()));
    }
    if !(low_hz > 0.0 && low_hz < high_hz && high_hz < sample_rate / 2.0) {
        return Err(FilterError::InvalidParameters(format!(
            "Invalid band {}-{} Hz for sample rate {} Hz",
            low_hz, high_hz, sample_rate
        )));
    }

    let fs2 = 2.0 * sample_rate;
    let warp = |freq: f64| fs2 * (PI * freq / sample_rate).tan();
    let (w_low, w_high) = (warp(low_hz), warp(high_hz));
    let bandwidth = w_high - w_low;
    let center = (w_low * w_high).sqrt();

    let mut sections = Vec::with_capacity(order);
    for k in 0..order {
        // Left half-plane poles of the normalised analog prototype
        let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        let pole = Complex64::from_polar(1.0, theta);
        if pole.im < -REAL_POLE_TOLERANCE {
            continue;
        }

        // Each lowpass pole maps to a pair of bandpass poles
        let half = pole * (bandwidth / 2.0);
        let root = (half * half - center * center).sqrt();
        let digital = [half + root, half - root].map(|s| (fs2 + s) / (fs2 - s));

        if pole.im > REAL_POLE_TOLERANCE {
            // Conjugate partners are implied; one section per digital pole
            for z in digital {
                sections.push(Biquad::new([1.0, 0.0, -1.0], [-2.0 * z.re, z.norm_sqr()]));
            }
        } else {
            let [z1, z2] = digital;
            sections.push(Biquad::new(
                [1.0, 0.0, -1.0],
                [-(z1 + z2).re, (z1 * z2).re],
            ));
        }
    }

    let mut filter = SosFilter::new(sections)?;
    let center_omega = 2.0 * (center / fs2).atan();
    let gain = filter
        .sections
        .iter()
        .map(|s| s.response(center_omega))
        .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
        .norm();
    if !(gain > 0.0 && gain.is_finite()) {
        return Err(FilterError::InvalidParameters(
            "Degenerate bandpass design".to_string(),
        ));
    }
    filter.sections[0].scale_numerator(1.0 / gain);

    Ok(filter)
}
