use crate::utils::ten_row_panel;
use labsynth::algorithm::synthesis::LocalBackend;
use labsynth::{
    GenerationBackend, GenerationRequest, NumericField, SignatureClassifier, SynthConfig,
    io, read_annotated, read_records, write_records,
};
use std::collections::HashSet;

#[tokio::test]
async fn test_generate_write_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.csv");
    let original = SignatureClassifier::default().annotate(&ten_row_panel());
    write_records(&source, &original).unwrap();

    let loaded = io::load_records_async(&[source.clone()]).await.unwrap();
    assert_eq!(loaded.len(), 10);
    assert_eq!(loaded[2].value(NumericField::HbA2), Some(5.2));

    let config = SynthConfig::default().with_seed(5);
    let response = LocalBackend::from_config(&config)
        .generate(&GenerationRequest::new(loaded, 30))
        .await
        .unwrap();

    for name in ["synthetic.csv", "synthetic.parquet"] {
        let path = dir.path().join(name);
        io::write_records_async(&path, response.synthetic_rows.clone()).await.unwrap();

        let back = read_annotated(&path, &SignatureClassifier::default()).unwrap();
        assert_eq!(back.len(), 30, "{name}");
        let ids: HashSet<&str> = back.iter().map(|r| r.record().id()).collect();
        assert_eq!(ids.len(), 30);
        for (written, read) in response.synthetic_rows.iter().zip(&back) {
            assert_eq!(written.signature_positive(), read.signature_positive());
            assert_eq!(written.record().value(NumericField::Mcv), read.record().value(NumericField::Mcv));
        }
    }

    let plain = read_records(&source).unwrap();
    assert_eq!(plain[0].id(), "P00");
}
