use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of a successful `POST /upload-csv/`.
///
/// A failed upload never produces one of these: the batch is atomic, so the
/// client either gets the full count or an error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Identifier of the insert batch, also present in the server log lines for it.
    pub batch_id: String,
    pub filename: String,
    pub company_id: i64,
    pub inserted_count: usize,
    /// Canonical database columns written for every row, in insert order.
    pub columns: Vec<String>,
    /// CSV header (as sent) to canonical column.
    pub column_mapping: BTreeMap<String, String>,
    /// CSV headers that matched no canonical column and were dropped.
    pub unmapped_columns: Vec<String>,
    /// Hex MD5 of the uploaded bytes.
    pub file_md5: String,
}
