//! Clinical signature detection
//!
//! Scores rows against a configurable rule set of laboratory conditions.

pub mod classifier;
pub mod rules;

pub use classifier::{SignatureClassifier, SignatureEvaluation};
pub use rules::{SignatureCondition, SignatureRules, Threshold};
