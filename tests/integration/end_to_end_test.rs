use crate::utils::ten_row_panel;
use labsynth::algorithm::synthesis::SynthesisSettings;
use labsynth::{NoiseCalibrator, RecordSynthesizer, SignatureClassifier};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

#[test]
fn test_classification_of_ten_rows() {
    let classifier = SignatureClassifier::default();
    let flags: Vec<bool> = ten_row_panel().iter().map(|r| classifier.classify(r)).collect();
    assert_eq!(
        flags,
        vec![true, true, true, false, true, false, false, false, false, false]
    );

    let evaluation = classifier.evaluate(&ten_row_panel()[3]);
    assert_eq!(evaluation.score, 1);
    assert!(evaluation.matched.contains(&"iron_deficiency".to_string()));
}

#[test]
fn test_five_synthetic_rows_follow_cyclic_provenance() {
    let annotated = SignatureClassifier::default().annotate(&ten_row_panel());
    let synthesizer = RecordSynthesizer::default();
    let mut rng = StdRng::seed_from_u64(2024);

    let synthetic = synthesizer.generate(&annotated, 5, &mut rng).unwrap();
    assert_eq!(synthetic.len(), 5);

    let flags: Vec<bool> = synthetic.iter().map(|r| r.signature_positive()).collect();
    assert_eq!(flags, vec![true, true, true, false, true]);
    assert_eq!(flags.iter().filter(|f| **f).count(), 4);
}

#[test]
fn test_wraparound_and_unique_ids() {
    let annotated = SignatureClassifier::default().annotate(&ten_row_panel());
    let synthesizer = RecordSynthesizer::new(
        NoiseCalibrator::default(),
        SynthesisSettings {
            id_prefix: "S".to_string(),
            id_width: 3,
            ..SynthesisSettings::default()
        },
    );
    let mut rng = StdRng::seed_from_u64(7);

    let synthetic = synthesizer.generate(&annotated, 25, &mut rng).unwrap();
    assert_eq!(synthetic.len(), 25);
    for (i, row) in synthetic.iter().enumerate() {
        assert_eq!(row.signature_positive(), annotated[i % 10].signature_positive());
    }

    let ids: HashSet<&str> = synthetic.iter().map(|r| r.record().id()).collect();
    assert_eq!(ids.len(), 25);
    assert!(ids.contains("S-001") && ids.contains("S-025"));
    let source_ids: HashSet<&str> = annotated.iter().map(|r| r.record().id()).collect();
    assert!(ids.is_disjoint(&source_ids));
}
