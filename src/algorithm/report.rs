//! Privacy and fidelity report for a synthetic dataset

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::algorithm::privacy::{PrivacyScorer, RareCombination};
use crate::algorithm::quality::{FeatureComparison, QualityScorer, similarity_of};
use crate::config::SynthConfig;
use crate::error::Result;
use crate::models::AnnotatedRecord;

/// Scores of a synthetic dataset against its source
///
/// Figures that could not be computed are `None` and serialize as `null`,
/// distinct from a genuine zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Number of source rows
    pub original_rows: usize,
    /// Number of synthetic rows
    pub synthetic_rows: usize,
    /// Signature-positive source rows
    pub original_signature_positive: usize,
    /// Signature-positive synthetic rows
    pub synthetic_signature_positive: usize,
    /// Mean histogram overlap across features, 0 to 100
    pub similarity: Option<u32>,
    /// Nearest-neighbour re-identification risk, 0 to 100
    pub reid_risk_percent: Option<u32>,
    /// Share of synthetic rows reproducing a rare original combination, 0 to 100
    pub attr_risk_percent: Option<u32>,
    /// Re-identification distance threshold
    pub threshold: Option<f64>,
    /// Synthetic rows under the re-identification threshold
    pub flagged_rows: Vec<String>,
    /// Rarest categorical combinations of the source rows
    pub rare_combinations: Vec<RareCombination>,
    /// Aligned histograms per feature
    pub distribution_data: Vec<FeatureComparison>,
}

fn format_percent(value: Option<u32>) -> String {
    value.map_or_else(|| "not computable".to_string(), |v| format!("{v}%"))
}

fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Escape a string for CSV output
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_value<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl PrivacyReport {
    /// Human-readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = write!(
            output,
            "Synthetic Data Report ({})\n\
             - Original rows: {} ({} signature-positive)\n\
             - Synthetic rows: {} ({} signature-positive)\n\
             - Distribution similarity: {}\n\
             - Re-identification risk: {}\n\
             - Attribute-disclosure risk: {}\n\
             - Distance threshold: {}\n\
             - Flagged synthetic rows: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.original_rows,
            self.original_signature_positive,
            self.synthetic_rows,
            self.synthetic_signature_positive,
            format_percent(self.similarity),
            format_percent(self.reid_risk_percent),
            format_percent(self.attr_risk_percent),
            self.threshold
                .map_or_else(|| "not computable".to_string(), |t| format!("{t:.4}")),
            self.flagged_rows.len(),
        );

        if !self.distribution_data.is_empty() {
            output.push_str(
                "Feature    | Range                 | Overlap\n\
                 -----------|-----------------------|--------\n",
            );
            for comparison in &self.distribution_data {
                let _ = writeln!(
                    output,
                    "{:<10} | {:>9.2} - {:<9.2} | {:>6}%",
                    comparison.field.to_string(),
                    comparison.range.min,
                    comparison.range.max,
                    comparison.overlap
                );
            }
            output.push('\n');
        }

        if self.rare_combinations.is_empty() {
            output.push_str("No rare categorical combinations\n");
        } else {
            output.push_str("Rare combinations:\n");
            for combination in &self.rare_combinations {
                let _ = writeln!(
                    output,
                    "  {:<40} {:>5}",
                    truncate_string(&combination.label, 40),
                    combination.count
                );
            }
        }

        output
    }

    /// Write the report as pretty-printed JSON
    pub fn write_to_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!("Wrote report to {}", path.display());
        Ok(())
    }

    /// Write the headline metrics and rare combinations as CSV
    pub fn write_to_csv(&self, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(file, "Metric,Value")?;
        writeln!(file, "Generated at,{}", self.generated_at.to_rfc3339())?;
        writeln!(file, "Original rows,{}", self.original_rows)?;
        writeln!(file, "Synthetic rows,{}", self.synthetic_rows)?;
        writeln!(file, "Original signature-positive,{}", self.original_signature_positive)?;
        writeln!(file, "Synthetic signature-positive,{}", self.synthetic_signature_positive)?;
        writeln!(file, "Similarity,{}", csv_value(self.similarity))?;
        writeln!(file, "Re-identification risk,{}", csv_value(self.reid_risk_percent))?;
        writeln!(file, "Attribute-disclosure risk,{}", csv_value(self.attr_risk_percent))?;
        writeln!(file, "Threshold,{}", csv_value(self.threshold))?;
        writeln!(file, "Flagged rows,{}", self.flagged_rows.len())?;

        for comparison in &self.distribution_data {
            writeln!(file, "Overlap {},{}", comparison.field, comparison.overlap)?;
        }

        writeln!(file)?;
        writeln!(file, "Combination,Count")?;
        for combination in &self.rare_combinations {
            writeln!(file, "{},{}", escape_csv(&combination.label), combination.count)?;
        }

        file.flush()?;
        log::info!("Wrote report to {}", path.display());
        Ok(())
    }
}

/// Builds a [`PrivacyReport`] from the configured scorers
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    quality: QualityScorer,
    privacy: PrivacyScorer,
}

impl ReportBuilder {
    /// Create a builder
    #[must_use]
    pub const fn new(quality: QualityScorer, privacy: PrivacyScorer) -> Self {
        Self { quality, privacy }
    }

    /// Build from configuration
    #[must_use]
    pub fn from_config(config: &SynthConfig) -> Self {
        Self::new(
            QualityScorer::new(config.quality.clone()),
            PrivacyScorer::new(config.privacy.clone()),
        )
    }

    /// Score a synthetic dataset against its source
    ///
    /// Never fails: scores that cannot be computed are left empty and logged.
    #[must_use]
    pub fn build(&self, original: &[AnnotatedRecord], synthetic: &[AnnotatedRecord]) -> PrivacyReport {
        let distribution_data = self.quality.compare(original, synthetic);
        let similarity = similarity_of(&distribution_data)
            .inspect_err(|e| log::warn!("Similarity unavailable: {e}"))
            .ok();

        let (reid_risk_percent, threshold, flagged_rows) = match self.privacy.assess(original, synthetic) {
            Ok(assessment) => (
                Some(assessment.risk_percent),
                Some(assessment.threshold),
                assessment.flagged_ids,
            ),
            Err(e) => {
                log::warn!("Re-identification risk unavailable: {e}");
                (None, None, Vec::new())
            }
        };

        let attr_risk_percent = self
            .privacy
            .attribute_risk(original, synthetic)
            .inspect_err(|e| log::warn!("Attribute-disclosure risk unavailable: {e}"))
            .ok();

        PrivacyReport {
            generated_at: Utc::now(),
            original_rows: original.len(),
            synthetic_rows: synthetic.len(),
            original_signature_positive: count_positive(original),
            synthetic_signature_positive: count_positive(synthetic),
            similarity,
            reid_risk_percent,
            attr_risk_percent,
            threshold,
            flagged_rows,
            rare_combinations: self.privacy.reported_rare_combinations(original),
            distribution_data,
        }
    }
}

fn count_positive(records: &[AnnotatedRecord]) -> usize {
    records.iter().filter(|r| r.signature_positive()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoricalField, NumericField, PanelRecord};

    fn rows(n: usize, positive_every: usize) -> Vec<AnnotatedRecord> {
        (0..n)
            .map(|i| {
                let step = i as f64;
                let record = PanelRecord::new(format!("P{i}"))
                    .with_category(CategoricalField::Sex, if i % 2 == 0 { "F" } else { "M" })
                    .with_category(CategoricalField::Ethnicity, if i == 0 { "Sami" } else { "Nordic" })
                    .with_measurement(NumericField::Hb, 9.0 + step * 0.3)
                    .with_measurement(NumericField::Mcv, 60.0 + step * 1.5)
                    .with_measurement(NumericField::Ferritin, 20.0 + step * 7.0);
                AnnotatedRecord::new(record, i % positive_every == 0)
            })
            .collect()
    }

    #[test]
    fn test_report_on_identical_data() {
        let original = rows(30, 3);
        let report = ReportBuilder::default().build(&original, &original);
        assert_eq!(report.similarity, Some(100));
        assert_eq!(report.reid_risk_percent, Some(100));
        assert_eq!(report.flagged_rows.len(), 30);
        assert_eq!(report.original_signature_positive, 10);
        assert_eq!(report.distribution_data.len(), 3);
        assert_eq!(report.rare_combinations.len(), 1);
        assert_eq!(report.rare_combinations[0].label, "F | Sami");
        // The one rare row is copied into the synthetic set
        assert_eq!(report.attr_risk_percent, Some(3));
    }

    #[test]
    fn test_empty_synthetic_serializes_nulls() {
        let original = rows(5, 2);
        let report = ReportBuilder::default().build(&original, &[]);
        assert_eq!(report.similarity, None);
        assert_eq!(report.reid_risk_percent, None);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["similarity"].is_null());
        assert!(json["reidRiskPercent"].is_null());
        assert!(json["attrRiskPercent"].is_null());
        assert!(json["threshold"].is_null());
        assert!(report.summary().contains("not computable"));
    }

    #[test]
    fn test_write_json_and_csv() {
        let original = rows(12, 4);
        let report = ReportBuilder::default().build(&original, &original);
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("report.json");
        report.write_to_json(&json_path).unwrap();
        let parsed: PrivacyReport =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.similarity, report.similarity);
        assert_eq!(parsed.flagged_rows, report.flagged_rows);

        let csv_path = dir.path().join("report.csv");
        report.write_to_csv(&csv_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("Metric,Value\n"));
        assert!(csv.contains("Similarity,100\n"));
        assert!(csv.contains("Combination,Count\n"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("a | b"), "a | b");
        assert_eq!(escape_csv("a, b"), "\"a, b\"");
        assert_eq!(truncate_string("abcdef", 5), "ab...");
    }
}
