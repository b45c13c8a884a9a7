//! Row cleaning and header reconciliation
//!
//! Source files name their columns inconsistently and contain blanks, "NA"
//! markers and stray text. Cleaning never rejects a row: missing categorical
//! values become `Unknown`, missing numbers become absent, and identifiers
//! are generated or de-duplicated so every cleaned row has a unique, non-empty id.

use log::{debug, warn};
use rustc_hash::FxHashSet;

use super::fields::{is_id_header, CategoricalField, NumericField, PanelField};
use super::measurement::Measurement;
use super::record::PanelRecord;

/// What a source column is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Row identifier
    Id,
    /// A categorical field
    Categorical(CategoricalField),
    /// A numeric field
    Numeric(NumericField),
    /// Not part of the panel
    Ignored,
}

/// Role of every column in a source table, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    roles: Vec<ColumnRole>,
}

impl ColumnMapping {
    /// Resolve column roles from source headers
    ///
    /// When two headers resolve to the same canonical field the first one wins
    /// and later ones are ignored.
    #[must_use]
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut claimed: Vec<ColumnRole> = Vec::new();
        let roles = headers
            .iter()
            .map(|header| {
                let header = header.as_ref();
                let role = if is_id_header(header) {
                    ColumnRole::Id
                } else if let Some(field) = NumericField::from_header(header) {
                    ColumnRole::Numeric(field)
                } else if let Some(field) = CategoricalField::from_header(header) {
                    ColumnRole::Categorical(field)
                } else {
                    ColumnRole::Ignored
                };

                if role == ColumnRole::Ignored {
                    debug!("Ignoring column '{header}': not a panel field");
                    return role;
                }
                if claimed.contains(&role) {
                    warn!("Column '{header}' duplicates an earlier {role:?} column, ignoring it");
                    return ColumnRole::Ignored;
                }
                claimed.push(role);
                debug!("Column '{header}' mapped to {role:?}");
                role
            })
            .collect();

        Self { roles }
    }

    /// Column roles in source order
    #[must_use]
    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    /// Whether a role was found among the headers
    #[must_use]
    pub fn has(&self, role: ColumnRole) -> bool {
        self.roles.contains(&role)
    }

    /// Numeric fields with no source column
    #[must_use]
    pub fn missing_numeric(&self) -> Vec<NumericField> {
        NumericField::ALL
            .into_iter()
            .filter(|f| !self.has(ColumnRole::Numeric(*f)))
            .collect()
    }
}

/// Turns raw text rows into cleaned [`PanelRecord`]s
#[derive(Debug, Default)]
pub struct RecordCleaner {
    seen_ids: FxHashSet<String>,
    rows_cleaned: usize,
}

impl RecordCleaner {
    /// Create a cleaner with no identifiers seen yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean one row of cells laid out according to `mapping`
    ///
    /// Cells beyond the mapping are ignored; missing cells are treated as blank.
    pub fn clean_row<S: AsRef<str>>(&mut self, mapping: &ColumnMapping, cells: &[S]) -> PanelRecord {
        self.rows_cleaned += 1;
        let mut record = PanelRecord::new(String::new());
        let mut raw_id = String::new();

        for (role, cell) in mapping.roles().iter().zip(cells.iter()) {
            let cell = cell.as_ref();
            match role {
                ColumnRole::Id => raw_id = cell.trim().to_string(),
                ColumnRole::Categorical(field) => {
                    let value = cell.trim();
                    if !value.is_empty() {
                        record.set_category(*field, value);
                    }
                }
                ColumnRole::Numeric(field) => {
                    let value = Measurement::coerce(cell);
                    if let Measurement::Raw(text) = &value {
                        debug!("Row {}: non-numeric {field} value '{text}'", self.rows_cleaned);
                    }
                    record.set_measurement(*field, value);
                }
                ColumnRole::Ignored => {}
            }
        }

        let id = self.unique_id(raw_id);
        record.set_id(id);
        record
    }

    /// Clean a whole table
    pub fn clean_rows<H: AsRef<str>, S: AsRef<str>>(
        &mut self,
        headers: &[H],
        rows: &[Vec<S>],
    ) -> Vec<PanelRecord> {
        let mapping = ColumnMapping::from_headers(headers);
        rows.iter().map(|row| self.clean_row(&mapping, row)).collect()
    }

    fn unique_id(&mut self, raw_id: String) -> String {
        let base = if raw_id.is_empty() {
            format!("ROW-{}", self.rows_cleaned)
        } else {
            raw_id
        };

        if self.seen_ids.insert(base.clone()) {
            return base;
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.seen_ids.insert(candidate.clone()) {
                warn!("Duplicate identifier '{base}' renamed to '{candidate}'");
                return candidate;
            }
            suffix += 1;
        }
    }
}
