//! Staleness detection and correction
//!
//! [`pattern`] derives a show's release cadence, [`detector`] decides
//! whether a show is overdue and [`service`] runs the detector over the
//! whole catalog and records what it found.

pub mod detector;
pub mod pattern;
pub mod service;

pub use detector::{Detector, StaleShowInfo};
pub use pattern::UpdatePattern;
pub use service::{CorrectionService, DetectionResult};
