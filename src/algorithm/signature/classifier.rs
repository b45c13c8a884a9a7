//! Signature classification of panel rows
//!
//! Classification is a pure function of a row's numeric values. It runs once
//! per source row; the flag is then carried by the [`AnnotatedRecord`] and
//! inherited by every synthetic row generated from it.

use log::info;
use serde::Serialize;

use super::rules::SignatureRules;
use crate::models::{AnnotatedRecord, PanelRecord};

/// Detailed outcome for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureEvaluation {
    /// Net score
    pub score: i32,
    /// Names of the conditions that were met
    pub matched: Vec<String>,
    /// Whether the score reached the positive threshold
    pub positive: bool,
}

/// Classifier scoring rows against a [`SignatureRules`] set
#[derive(Debug, Clone, Default)]
pub struct SignatureClassifier {
    rules: SignatureRules,
}

impl SignatureClassifier {
    /// Create a classifier for a rule set
    #[must_use]
    pub const fn new(rules: SignatureRules) -> Self {
        Self { rules }
    }

    /// The rule set in use
    #[must_use]
    pub const fn rules(&self) -> &SignatureRules {
        &self.rules
    }

    /// Net score of a row
    #[must_use]
    pub fn score(&self, record: &PanelRecord) -> i32 {
        self.rules.score(record)
    }

    /// Whether a row matches the signature
    #[must_use]
    pub fn classify(&self, record: &PanelRecord) -> bool {
        self.score(record) >= self.rules.min_score
    }

    /// Score, matched conditions and verdict for a row
    #[must_use]
    pub fn evaluate(&self, record: &PanelRecord) -> SignatureEvaluation {
        let score = self.score(record);
        SignatureEvaluation {
            score,
            matched: self.rules.matched(record).into_iter().map(str::to_string).collect(),
            positive: score >= self.rules.min_score,
        }
    }

    /// Classify every row, producing annotated records in input order
    #[must_use]
    pub fn annotate(&self, records: &[PanelRecord]) -> Vec<AnnotatedRecord> {
        let annotated: Vec<AnnotatedRecord> = records
            .iter()
            .map(|record| AnnotatedRecord::new(record.clone(), self.classify(record)))
            .collect();

        let positive = annotated.iter().filter(|r| r.signature_positive()).count();
        info!(
            "Signature classification complete: {positive} of {} rows positive",
            annotated.len()
        );

        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::signature::rules::{SignatureCondition, Threshold};
    use crate::models::{Measurement, NumericField};

    fn carrier_like() -> PanelRecord {
        PanelRecord::new("C1")
            .with_measurement(NumericField::Hb, 11.2)
            .with_measurement(NumericField::Mcv, 66.0)
            .with_measurement(NumericField::Mch, 20.5)
            .with_measurement(NumericField::HbA2, 5.1)
            .with_measurement(NumericField::Ferritin, 80.0)
    }

    #[test]
    fn test_classify_positive_row() {
        let classifier = SignatureClassifier::default();
        let record = carrier_like();
        assert_eq!(classifier.score(&record), 4);
        assert!(classifier.classify(&record));
    }

    #[test]
    fn test_iron_deficiency_reduces_score() {
        let classifier = SignatureClassifier::default();
        let record = PanelRecord::new("I1")
            .with_measurement(NumericField::Mcv, 70.0)
            .with_measurement(NumericField::Mch, 22.0)
            .with_measurement(NumericField::Ferritin, 6.0);
        let evaluation = classifier.evaluate(&record);
        assert_eq!(evaluation.score, 1);
        assert!(!evaluation.positive);
        assert!(evaluation.matched.contains(&"iron_deficiency".to_string()));
    }

    #[test]
    fn test_absent_and_malformed_values_do_not_count() {
        let classifier = SignatureClassifier::default();
        let record = PanelRecord::new("M1")
            .with_measurement(NumericField::Mcv, Measurement::Raw("low".into()))
            .with_measurement(NumericField::Mch, 22.0);
        assert_eq!(classifier.score(&record), 1);
        assert!(!classifier.classify(&record));
        assert!(!classifier.classify(&PanelRecord::new("empty")));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = SignatureClassifier::default();
        let record = carrier_like();
        let first = classifier.classify(&record);
        assert!((0..100).all(|_| classifier.classify(&record) == first));
    }

    #[test]
    fn test_custom_rules() {
        let rules = SignatureRules::empty(1).with_condition(SignatureCondition::new(
            "high_ferritin",
            NumericField::Ferritin,
            Threshold::Above(300.0),
            1,
        ));
        let classifier = SignatureClassifier::new(rules);
        assert!(classifier.classify(&PanelRecord::new("F").with_measurement(NumericField::Ferritin, 350.0)));
        assert!(!classifier.classify(&carrier_like()));
    }

    #[test]
    fn test_annotate_preserves_order() {
        let classifier = SignatureClassifier::default();
        let records = vec![carrier_like(), PanelRecord::new("N1").with_measurement(NumericField::Mcv, 90.0)];
        let annotated = classifier.annotate(&records);
        assert_eq!(annotated.len(), 2);
        assert!(annotated[0].signature_positive());
        assert!(!annotated[1].signature_positive());
        assert_eq!(annotated[1].record().id(), "N1");
    }
}
