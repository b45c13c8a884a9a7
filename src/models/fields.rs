//! Canonical panel fields
//!
//! The screening panel has a fixed schema: one identifier, two categorical
//! fields and five numeric laboratory values. Header reconciliation maps
//! whatever a source file calls these columns onto the enums below.

use labsynth_macros::PanelField;
use serde::{Deserialize, Serialize};

/// Canonical column holding the row identifier
pub const ID_COLUMN: &str = "id";

/// Accepted header spellings for the identifier column (normalized)
pub const ID_ALIASES: &[&str] = &["id", "patientid", "sampleid", "recordid", "subjectid", "pnr"];

/// Common behaviour of the canonical field enums
///
/// Implemented through `#[derive(PanelField)]`.
pub trait PanelField: Copy + Eq + std::hash::Hash + Sized + 'static {
    /// All variants in declaration order
    fn all() -> &'static [Self];

    /// Canonical column name
    fn column(self) -> &'static str;

    /// Human readable label
    fn label(self) -> &'static str;

    /// Normalized header spellings, canonical column first
    fn aliases(self) -> &'static [&'static str];

    /// Position of the field in declaration order
    fn index(self) -> usize;

    /// Map a source header onto a canonical field
    ///
    /// The header is first normalized and matched against every alias. If
    /// that fails, the first alphanumeric token is tried on its own so that
    /// headers carrying units (`"Hb (g/dL)"`) still resolve, while distinct
    /// analytes that merely share a prefix (`"MCHC"` vs `mch`) do not.
    fn from_header(header: &str) -> Option<Self> {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            return None;
        }

        let exact = Self::all()
            .iter()
            .copied()
            .find(|field| field.aliases().contains(&normalized.as_str()));
        if exact.is_some() {
            return exact;
        }

        let token = first_token(header)?;
        Self::all()
            .iter()
            .copied()
            .find(|field| field.aliases().contains(&token.as_str()))
    }
}

/// Normalize a header: lower-case ASCII alphanumerics only
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn first_token(header: &str) -> Option<String> {
    header
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Whether a header names the identifier column
#[must_use]
pub fn is_id_header(header: &str) -> bool {
    let normalized = normalize_header(header);
    ID_ALIASES.contains(&normalized.as_str())
        || first_token(header).is_some_and(|t| ID_ALIASES.contains(&t.as_str()))
}

/// Numeric laboratory fields (the quasi-identifiers of the panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, PanelField)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    /// Hemoglobin concentration
    #[panel(column = "hb", label = "Hemoglobin (g/dL)", alias = "hgb", alias = "hemoglobin", alias = "haemoglobin")]
    Hb,
    /// Mean corpuscular volume
    #[panel(column = "mcv", label = "MCV (fL)", alias = "mean_cell_volume", alias = "mean_corpuscular_volume")]
    Mcv,
    /// Mean corpuscular hemoglobin
    #[panel(column = "mch", label = "MCH (pg)", alias = "mean_cell_hemoglobin", alias = "mean_corpuscular_hemoglobin")]
    Mch,
    /// Hemoglobin A2 fraction
    #[panel(column = "hba2", label = "HbA2 (%)", alias = "hb_a2", alias = "hemoglobin_a2")]
    HbA2,
    /// Serum ferritin
    #[panel(column = "ferritin", label = "Ferritin (ng/mL)", alias = "serum_ferritin")]
    Ferritin,
}

impl NumericField {
    /// Decimal places synthetic values are rounded to
    ///
    /// Large-magnitude analytes are kept coarse, ratio-like ones fine.
    #[must_use]
    pub const fn precision(self) -> u32 {
        match self {
            Self::Hb | Self::Mcv | Self::Mch => 1,
            Self::HbA2 => 2,
            Self::Ferritin => 0,
        }
    }
}

/// Free-text categorical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, PanelField)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalField {
    /// Recorded sex
    #[panel(column = "sex", label = "Sex", alias = "gender")]
    Sex,
    /// Ethnic background
    #[panel(column = "ethnicity", label = "Ethnicity", alias = "ethnic_group", alias = "ethnic", alias = "race", alias = "origin")]
    Ethnicity,
}
