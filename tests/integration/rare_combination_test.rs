use labsynth::{CategoricalField, PanelRecord, PrivacyScorer, ReportBuilder, SignatureClassifier};

fn rows_with(rare_value: &str, common: usize) -> Vec<PanelRecord> {
    let mut rows: Vec<PanelRecord> = (0..common)
        .map(|i| {
            PanelRecord::new(format!("C{i}"))
                .with_category(CategoricalField::Sex, "F")
                .with_category(CategoricalField::Ethnicity, "Nordic")
        })
        .collect();
    rows.push(
        PanelRecord::new("R")
            .with_category(CategoricalField::Sex, "F")
            .with_category(CategoricalField::Ethnicity, rare_value),
    );
    rows
}

#[test]
fn test_exactly_five_percent_is_not_rare() {
    let rows = rows_with("Inuit", 19);
    assert_eq!(rows.len(), 20);
    assert!(PrivacyScorer::default().rare_combinations(&rows).is_empty());
}

#[test]
fn test_below_five_percent_is_rare() {
    let rows = rows_with("Inuit", 20);
    assert_eq!(rows.len(), 21);
    let rare = PrivacyScorer::default().rare_combinations(&rows);
    assert_eq!(rare.len(), 1);
    assert_eq!(rare[0].label, "F | Inuit");
    assert_eq!(rare[0].count, 1);
}

#[test]
fn test_report_lists_rare_combination_and_leak() {
    let original = SignatureClassifier::default().annotate(&rows_with("Inuit", 20));
    let synthetic = SignatureClassifier::default().annotate(&rows_with("Inuit", 9));

    let report = ReportBuilder::default().build(&original, &synthetic);
    assert_eq!(report.rare_combinations.len(), 1);
    // One of ten synthetic rows reproduces the rare combination
    assert_eq!(report.attr_risk_percent, Some(10));
    // No numeric fields at all
    assert_eq!(report.reid_risk_percent, None);
    assert_eq!(report.similarity, None);
}
