use labsynth::{CategoricalField, NumericField, PanelRecord};

/// Build a fully populated row
#[must_use]
pub fn panel_row(id: &str, sex: &str, ethnicity: &str, values: [f64; 5]) -> PanelRecord {
    let [hb, mcv, mch, hba2, ferritin] = values;
    PanelRecord::new(id)
        .with_category(CategoricalField::Sex, sex)
        .with_category(CategoricalField::Ethnicity, ethnicity)
        .with_measurement(NumericField::Hb, hb)
        .with_measurement(NumericField::Mcv, mcv)
        .with_measurement(NumericField::Mch, mch)
        .with_measurement(NumericField::HbA2, hba2)
        .with_measurement(NumericField::Ferritin, ferritin)
}

/// Ten rows, four of them with low MCV
///
/// Rows 0-2 and 4 are signature-positive; row 3 has low MCV and MCH but is
/// pulled back by low ferritin.
#[must_use]
pub fn ten_row_panel() -> Vec<PanelRecord> {
    let mut rows = vec![
        panel_row("P00", "F", "Nordic", [13.5, 68.0, 22.0, 2.8, 90.0]),
        panel_row("P01", "M", "Nordic", [13.2, 71.5, 23.4, 2.9, 75.0]),
        panel_row("P02", "F", "Asian", [11.4, 64.0, 20.1, 5.2, 110.0]),
        panel_row("P03", "F", "Nordic", [13.0, 70.0, 24.0, 2.7, 10.0]),
        panel_row("P04", "M", "Mediterranean", [11.0, 92.0, 29.0, 4.2, 60.0]),
    ];
    for i in 5..10 {
        let step = f64::from(i - 5);
        rows.push(panel_row(
            &format!("P{i:02}"),
            if i % 2 == 0 { "F" } else { "M" },
            "Nordic",
            [14.0 + step * 0.2, 90.0 + step, 30.0, 2.5, 100.0 + step * 10.0],
        ));
    }
    rows
}

/// Rows whose values sit exactly on the rounding grid and, for positive rows,
/// inside the signature noise ranges
#[must_use]
pub fn grid_panel(n: usize) -> Vec<PanelRecord> {
    (0..n)
        .map(|i| {
            let k = i as f64;
            let id = format!("G{i:03}");
            let ethnicity = ["Nordic", "Asian", "African"][i % 3];
            if i % 4 == 0 {
                panel_row(
                    &id,
                    "F",
                    ethnicity,
                    [9.0 + (k % 5.0) * 0.5, 62.0 + k % 7.0, 20.0 + k % 3.0, 4.0, 60.0 + k],
                )
            } else {
                panel_row(
                    &id,
                    if i % 2 == 0 { "F" } else { "M" },
                    ethnicity,
                    [13.0 + (k % 6.0) * 0.5, 85.0 + k % 9.0, 28.0 + (k % 4.0) * 0.5, 2.5, 40.0 + k * 3.0],
                )
            }
        })
        .collect()
}
