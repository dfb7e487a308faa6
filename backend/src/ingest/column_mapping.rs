//! Fixed mapping from CSV header variants to the canonical columns of the ingestion table.
//!
//! Headers are matched on a normalized key: UTF-8 BOM stripped, trimmed, lowercased, and
//! with spaces, `-` and `_` removed. So `Company Id`, `company-id` and `COMPANY_ID` all
//! land on `CompanyId`. The table is checked once when the service starts; a collision
//! between two canonical columns is a startup error, never a per-request surprise.

use crate::config::is_identifier;
use std::collections::HashMap;
use thiserror::Error;

/// Column that receives the company identifier sent with every upload.
pub const COMPANY_ID: &str = "CompanyId";

#[derive(Debug, Clone, Copy)]
pub struct CanonicalColumn {
    pub name: &'static str,
    /// Accepted header spellings besides `name` itself.
    pub variants: &'static [&'static str],
}

/// Every column here is nullable or defaulted in the target table, so a file that
/// carries only some of them still inserts.
pub const STANDARD_COLUMNS: &[CanonicalColumn] = &[
    CanonicalColumn {
        name: "BusInformationId",
        variants: &["bus_id", "bus information id"],
    },
    CanonicalColumn {
        name: COMPANY_ID,
        variants: &["company"],
    },
    CanonicalColumn {
        name: "InsuranceProvider",
        variants: &["insurer", "provider"],
    },
    CanonicalColumn {
        name: "PolicyNumber",
        variants: &["policy_no", "policy"],
    },
    CanonicalColumn {
        name: "InsuranceType",
        variants: &["coverage_type"],
    },
    CanonicalColumn {
        name: "PolicyStartDate",
        variants: &["start_date", "valid_from"],
    },
    CanonicalColumn {
        name: "PolicyEndDate",
        variants: &["end_date", "expiry_date", "valid_to"],
    },
    CanonicalColumn {
        name: "PremiumAmount",
        variants: &["premium"],
    },
    CanonicalColumn {
        name: "SumInsured",
        variants: &["insured_value"],
    },
    CanonicalColumn {
        name: "Remarks",
        variants: &["notes", "comments"],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("canonical column '{0}' is not a valid SQL identifier")]
    InvalidColumnName(&'static str),

    #[error("canonical column '{0}' has an empty header variant")]
    EmptyVariant(&'static str),

    #[error("header key '{key}' maps to both '{first}' and '{second}'")]
    Ambiguous {
        key: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("mapping has no '{0}' column")]
    MissingColumn(&'static str),
}

#[derive(Debug)]
pub struct ColumnMapping {
    columns: &'static [CanonicalColumn],
    by_key: HashMap<String, &'static str>,
}

impl ColumnMapping {
    pub fn standard() -> Result<Self, MappingError> {
        Self::from_columns(STANDARD_COLUMNS)
    }

    pub fn from_columns(columns: &'static [CanonicalColumn]) -> Result<Self, MappingError> {
        let mut by_key: HashMap<String, &'static str> = HashMap::new();

        for column in columns {
            if !is_identifier(column.name) {
                return Err(MappingError::InvalidColumnName(column.name));
            }
            let spellings = std::iter::once(column.name).chain(column.variants.iter().copied());
            for spelling in spellings {
                let key = normalize_header(spelling);
                if key.is_empty() {
                    return Err(MappingError::EmptyVariant(column.name));
                }
                match by_key.get(&key) {
                    Some(&first) if first != column.name => {
                        return Err(MappingError::Ambiguous {
                            key,
                            first,
                            second: column.name,
                        });
                    }
                    Some(_) => {}
                    None => {
                        by_key.insert(key, column.name);
                    }
                }
            }
        }

        if !columns.iter().any(|c| c.name == COMPANY_ID) {
            return Err(MappingError::MissingColumn(COMPANY_ID));
        }

        Ok(ColumnMapping { columns, by_key })
    }

    /// Canonical column for a raw CSV header, if any.
    pub fn resolve(&self, header: &str) -> Option<&'static str> {
        self.by_key.get(&normalize_header(header)).copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

/// Matching key for a header: BOM stripped, trimmed, lowercased, separators removed.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
