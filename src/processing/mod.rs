// src/processing/mod.rs
//! Signal processing for EMG assist: conditioning, envelope, onset and features

pub mod conditioner;
pub mod envelope;
pub mod features;
pub mod filters;
pub mod onset;
pub mod stats;

pub use conditioner::SignalConditioner;
pub use envelope::EnvelopeExtractor;
pub use features::{snr_db, EmgFeatures, FeatureExtractor};
pub use onset::{moving_average, tkeo, OnsetDetector};
