use labsynth::algorithm::quality::{histogram_of, overlap_bins};
use labsynth::{NumericField, PanelRecord, QualityScorer, ValueRange, histogram};

fn mcv_rows(values: &[f64]) -> Vec<PanelRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| PanelRecord::new(format!("M{i}")).with_measurement(NumericField::Mcv, *v))
        .collect()
}

#[test]
fn test_upper_boundary_falls_in_last_bin() {
    let rows = mcv_rows(&(0..=10).map(|i| f64::from(i) * 10.0).collect::<Vec<_>>());
    let bins = histogram(&rows, NumericField::Mcv, 10, Some(ValueRange::new(0.0, 100.0)));
    assert_eq!(bins.len(), 10);
    assert_eq!(bins.last().unwrap().index, 9);
    // 90 and 100
    assert!((bins[9].percent - 2.0 * 100.0 / 11.0).abs() < 1e-9);

    let only_top = histogram(&mcv_rows(&[100.0]), NumericField::Mcv, 10, Some(ValueRange::new(0.0, 100.0)));
    assert_eq!(only_top[9].percent, 100.0);
}

#[test]
fn test_overlap_properties() {
    let range = Some(ValueRange::new(50.0, 110.0));
    let a = histogram_of(&[61.0, 65.0, 72.0, 80.0, 88.0, 90.0, 95.0], 12, range);
    let b = histogram_of(&[58.0, 66.0, 70.0, 91.0, 101.0], 12, range);

    assert_eq!(overlap_bins(&a, &b), overlap_bins(&b, &a));
    assert_eq!(overlap_bins(&a, &a), 100);
    assert_eq!(overlap_bins(&b, &b), 100);
    assert!(overlap_bins(&a, &b) <= 100);
}

#[test]
fn test_shifted_distribution_scores_lower() {
    let original = mcv_rows(&(0..50).map(|i| 60.0 + f64::from(i % 25)).collect::<Vec<_>>());
    let close = mcv_rows(&(0..50).map(|i| 60.5 + f64::from(i % 25)).collect::<Vec<_>>());
    let far = mcv_rows(&(0..50).map(|i| 95.0 + f64::from(i % 10)).collect::<Vec<_>>());

    let scorer = QualityScorer::default();
    let near_score = scorer.similarity(&original, &close).unwrap();
    let far_score = scorer.similarity(&original, &far).unwrap();
    assert!(near_score > far_score, "{near_score} vs {far_score}");
    assert!(far_score < 20);
}
