use crate::utils::grid_panel;
use labsynth::algorithm::synthesis::LocalBackend;
use labsynth::{
    GenerationBackend, GenerationRequest, NoiseSettings, ReportBuilder, SignatureClassifier,
    SynthConfig,
};

#[tokio::test]
async fn test_zero_noise_copies_are_similar_and_risky() {
    let config = SynthConfig::default()
        .with_seed(11)
        .with_noise(NoiseSettings::default().with_noise_fraction(0.0));
    let original = grid_panel(40);

    let backend = LocalBackend::from_config(&config);
    let request = GenerationRequest::new(original.clone(), 40);
    let response = backend.generate(&request).await.unwrap();
    assert_eq!(response.synthetic_rows.len(), 40);

    let annotated = SignatureClassifier::new(config.signature.clone()).annotate(&original);
    let report = ReportBuilder::from_config(&config).build(&annotated, &response.synthetic_rows);

    let similarity = report.similarity.unwrap();
    let risk = report.reid_risk_percent.unwrap();
    assert!(similarity >= 95, "similarity {similarity}");
    assert!(risk >= 95, "risk {risk}");
    assert_eq!(report.original_signature_positive, 10);
    assert_eq!(report.synthetic_signature_positive, 10);
}

#[tokio::test]
async fn test_default_noise_lowers_risk() {
    let original = grid_panel(40);
    let annotated = SignatureClassifier::default().annotate(&original);
    let request = GenerationRequest::new(original, 40);

    let quiet = SynthConfig::default()
        .with_seed(3)
        .with_noise(NoiseSettings::default().with_noise_fraction(0.0));
    let noisy = SynthConfig::default()
        .with_seed(3)
        .with_noise(NoiseSettings::default().with_noise_fraction(0.2));

    let mut risks = Vec::new();
    for config in [quiet, noisy] {
        let response = LocalBackend::from_config(&config).generate(&request).await.unwrap();
        let report = ReportBuilder::from_config(&config).build(&annotated, &response.synthetic_rows);
        let risk = report.reid_risk_percent.unwrap();
        assert!(risk <= 100);
        risks.push(risk);
    }
    assert!(risks[1] < risks[0], "risks {risks:?}");
}
