use labsynth::algorithm::synthesis::SynthesisSettings;
use labsynth::{
    AnnotatedRecord, NoiseCalibrator, NoiseSettings, NumericField, PanelRecord, RecordSynthesizer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_random_values_stay_in_profile_bounds() {
    let settings = NoiseSettings::default();
    let calibrator = NoiseCalibrator::new(settings.clone());

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..200 {
            for field in NumericField::ALL {
                let value = rng.random_range(-50.0..600.0);
                for preserve in [false, true] {
                    let range = settings.profiles[&field].select(preserve);
                    let out = calibrator.perturb_value(field, value, preserve, &mut rng);
                    assert!(out.is_finite());
                    assert!(
                        range.contains(out),
                        "{field} {value} -> {out} (preserve={preserve})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_synthetic_rows_respect_regime_bounds() {
    let settings = NoiseSettings::default();
    let source: Vec<AnnotatedRecord> = (0..6)
        .map(|i| {
            let extreme = if i % 2 == 0 { 1000.0 } else { 0.5 };
            let mut record = PanelRecord::new(format!("X{i}"));
            for field in NumericField::ALL {
                record.set_measurement(field, extreme);
            }
            AnnotatedRecord::new(record, i % 3 == 0)
        })
        .collect();

    let synthesizer = RecordSynthesizer::new(NoiseCalibrator::new(settings.clone()), SynthesisSettings::default());
    let mut rng = StdRng::seed_from_u64(77);
    let rows = synthesizer.generate(&source, 120, &mut rng).unwrap();

    for row in &rows {
        for field in NumericField::ALL {
            let value = row.record().value(field).unwrap();
            let range = settings.profiles[&field].select(row.signature_positive());
            assert!(range.contains(value), "{field}: {value}");
        }
    }
}
