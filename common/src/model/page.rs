use crate::model::stored_row::StoredRow;
use serde::{Deserialize, Serialize};

/// One page of a paginated listing plus the metadata a client needs to walk the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Column names in table order, present even when `data` is empty.
    pub columns: Vec<String>,
    /// 1-based. Any positive page is valid; past the end it simply has no `data`.
    pub page: u64,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Response of `GET /upload-csv`: a page of stored rows, optionally narrowed to one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRows {
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub page: Page<StoredRow>,
}
