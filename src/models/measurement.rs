//! Numeric measurement values
//!
//! Laboratory values arrive as text from spreadsheets and CSV exports. They
//! are coerced once into [`Measurement`] so the rest of the crate can tell an
//! absent value apart from a zero and from an unparseable entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single numeric field value after coercion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    /// Empty cell or an explicit "NA"
    #[default]
    Absent,
    /// A parsed number
    Value(f64),
    /// Text that could not be parsed as a number, kept verbatim
    Raw(String),
}

impl Measurement {
    /// Coerce a raw cell value
    ///
    /// Trims the input; empty text and `na` (any case) become [`Measurement::Absent`],
    /// anything that parses as a number becomes [`Measurement::Value`], and the
    /// rest is kept as [`Measurement::Raw`].
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") {
            return Self::Absent;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Self::Value(value),
            Err(_) => Self::Raw(trimmed.to_string()),
        }
    }

    /// The value as a finite number, if it is one
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Whether the measurement holds a usable number
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Whether the measurement is the explicit absent marker
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Value)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Value(v) => write!(f, "{v}"),
            Self::Raw(s) => f.write_str(s),
        }
    }
}
