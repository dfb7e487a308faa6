//! Filtered, paginated reads over the ingestion table.
//!
//! Filter values and the LIMIT/OFFSET pair are always bound parameters; the only
//! spliced text is the validated table name and the fixed `CompanyId` column.

use crate::config::{DatabaseConfig, PageLimits};
use crate::database::{quote_ident, ScopedConnection};
use crate::error::ApiError;
use crate::ingest::column_mapping::COMPANY_ID;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::model::page::Page;
use common::model::stored_row::{CellValue, StoredRow};
use log::debug;
use rusqlite::params_from_iter;
use rusqlite::types::{Value, ValueRef};

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u32,
}

impl Pagination {
    pub fn from_request(
        page: Option<i64>,
        page_size: Option<i64>,
        limits: &PageLimits,
    ) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(i64::from(limits.default_page_size));

        if page < 1 {
            return Err(ApiError::InvalidPaginationParameters(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if page_size < 1 || page_size > i64::from(limits.max_page_size) {
            return Err(ApiError::InvalidPaginationParameters(format!(
                "page_size must be between 1 and {}, got {page_size}",
                limits.max_page_size
            )));
        }

        Ok(Pagination {
            page: page as u64,
            page_size: page_size as u32,
        })
    }

    /// Rows to skip, or `None` when that count does not fit SQLite's integer range.
    /// Such a page is necessarily past the end of any table.
    fn offset(&self) -> Option<i64> {
        i64::try_from(self.page - 1)
            .ok()?
            .checked_mul(i64::from(self.page_size))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowFilter {
    pub company_id: Option<i64>,
}

impl RowFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        match self.company_id {
            Some(id) => (
                format!(" WHERE {} = ?1", quote_ident(COMPANY_ID)),
                vec![Value::Integer(id)],
            ),
            None => (String::new(), Vec::new()),
        }
    }
}

/// Reads one page of rows matching `filter`, plus the totals for the whole match.
///
/// The count and the page come from the same read transaction, so a batch committed
/// in between cannot make them disagree. A page past the end is not an error: it
/// comes back with empty `data`.
pub fn fetch_page(
    db: &DatabaseConfig,
    filter: &RowFilter,
    pagination: Pagination,
) -> Result<Page<StoredRow>, ApiError> {
    let mut conn = ScopedConnection::acquire(db, "fetch_page")?;
    let tx = conn.transaction()?;
    let table = quote_ident(&db.table);
    let (where_sql, mut params) = filter.where_clause();

    let total: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {table}{where_sql}"),
        params_from_iter(params.iter()),
        |row| row.get(0),
    )?;
    let total = total.max(0) as u64;

    let n = params.len();
    let select = format!(
        "SELECT * FROM {table}{where_sql} ORDER BY rowid LIMIT ?{} OFFSET ?{}",
        n + 1,
        n + 2
    );
    debug!("{select}");

    let mut data = Vec::new();
    let columns: Vec<String>;
    {
        let mut stmt = tx.prepare(&select)?;
        columns = stmt.column_names().into_iter().map(String::from).collect();

        if let Some(offset) = pagination.offset().filter(|&o| (o as u64) < total) {
            params.push(Value::Integer(i64::from(pagination.page_size)));
            params.push(Value::Integer(offset));
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            while let Some(row) = rows.next()? {
                let mut stored = StoredRow::new();
                for (i, name) in columns.iter().enumerate() {
                    stored.insert(name.clone(), cell_value(row.get_ref(i)?));
                }
                data.push(stored);
            }
        }
    }
    tx.commit()?;

    let page_size = u64::from(pagination.page_size);
    let total_pages = total.div_ceil(page_size);
    Ok(Page {
        data,
        columns,
        page: pagination.page,
        page_size: pagination.page_size,
        total_records: total,
        total_pages,
        has_next: pagination.page < total_pages,
        has_previous: pagination.page > 1,
    })
}

fn cell_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Integer(v),
        ValueRef::Real(v) => CellValue::Real(v),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(BASE64.encode(bytes)),
    }
}
