//! Algorithm implementations for synthetic panel generation
//!
//! Classification, noise calibration, categorical sampling and synthesis
//! produce the synthetic rows; quality and privacy scoring assess them and
//! the report module combines the scores.

pub mod noise;
pub mod privacy;
pub mod quality;
pub mod report;
pub mod sampling;
pub mod signature;
pub mod synthesis;
