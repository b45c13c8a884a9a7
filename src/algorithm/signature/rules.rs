//! Signature rule definitions
//!
//! The screened condition is recognised by a small set of independent
//! laboratory conditions. Each condition contributes its weight to a row's
//! score when met; a row is signature-positive once the score reaches the
//! configured minimum. Cutoffs are data, not code, so they can be supplied
//! through configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{NumericField, PanelRecord};

/// Comparison applied to a single field value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "cutoff", rename_all = "snake_case")]
pub enum Threshold {
    /// Met when `value <= cutoff`
    AtMost(f64),
    /// Met when `value > cutoff`
    Above(f64),
    /// Met when `value < cutoff`
    Below(f64),
}

impl Threshold {
    /// Whether a value satisfies the comparison
    #[must_use]
    pub fn is_met(self, value: f64) -> bool {
        match self {
            Self::AtMost(cutoff) => value <= cutoff,
            Self::Above(cutoff) => value > cutoff,
            Self::Below(cutoff) => value < cutoff,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtMost(c) => write!(f, "<= {c}"),
            Self::Above(c) => write!(f, "> {c}"),
            Self::Below(c) => write!(f, "< {c}"),
        }
    }
}

/// One named condition of the rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureCondition {
    /// Short name used in logs and explanations
    pub name: String,
    /// Field the condition inspects
    pub field: NumericField,
    /// Comparison against the field value
    pub threshold: Threshold,
    /// Score contribution when met (negative for competing explanations)
    pub weight: i32,
}

impl SignatureCondition {
    /// Create a condition
    #[must_use]
    pub fn new(name: impl Into<String>, field: NumericField, threshold: Threshold, weight: i32) -> Self {
        Self {
            name: name.into(),
            field,
            threshold,
            weight,
        }
    }

    /// Whether the condition holds for a record; absent or non-numeric values never match
    #[must_use]
    pub fn is_met(&self, record: &PanelRecord) -> bool {
        record
            .value(self.field)
            .is_some_and(|value| self.threshold.is_met(value))
    }

    /// Score contribution for a record
    #[must_use]
    pub fn contribution(&self, record: &PanelRecord) -> i32 {
        if self.is_met(record) { self.weight } else { 0 }
    }
}

/// The full rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureRules {
    /// Conditions evaluated for every row
    pub conditions: Vec<SignatureCondition>,
    /// Score at or above which a row is positive
    pub min_score: i32,
}

impl Default for SignatureRules {
    fn default() -> Self {
        Self {
            conditions: vec![
                SignatureCondition::new("microcytosis", NumericField::Mcv, Threshold::AtMost(80.0), 1),
                SignatureCondition::new("hypochromia", NumericField::Mch, Threshold::AtMost(27.0), 1),
                SignatureCondition::new("mild_anemia", NumericField::Hb, Threshold::AtMost(12.0), 1),
                SignatureCondition::new("elevated_hba2", NumericField::HbA2, Threshold::Above(3.5), 1),
                // Low ferritin points at iron deficiency instead
                SignatureCondition::new("iron_deficiency", NumericField::Ferritin, Threshold::Below(15.0), -1),
            ],
            min_score: 2,
        }
    }
}

impl SignatureRules {
    /// Rule set with no conditions
    #[must_use]
    pub const fn empty(min_score: i32) -> Self {
        Self {
            conditions: Vec::new(),
            min_score,
        }
    }

    /// Add a condition
    #[must_use]
    pub fn with_condition(mut self, condition: SignatureCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the positive score threshold
    #[must_use]
    pub const fn with_min_score(mut self, min_score: i32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Sum of contributions of all conditions
    #[must_use]
    pub fn score(&self, record: &PanelRecord) -> i32 {
        self.conditions.iter().map(|c| c.contribution(record)).sum()
    }

    /// Names of the conditions a record meets
    #[must_use]
    pub fn matched<'a>(&'a self, record: &PanelRecord) -> Vec<&'a str> {
        self.conditions
            .iter()
            .filter(|c| c.is_met(record))
            .map(|c| c.name.as_str())
            .collect()
    }
}
