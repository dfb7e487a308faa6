use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single cell read back from the ingestion table.
///
/// Serialized untagged, so a row renders as plain JSON scalars:
/// `{"CompanyId": 101, "PolicyNumber": "P001", "Remarks": null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

/// A persisted table row keyed by database column name.
pub type StoredRow = BTreeMap<String, CellValue>;
