//! Atomic insert of one upload into the ingestion table.
//!
//! A batch is written inside a single transaction on a scoped connection. Either every
//! record commits or none does: the first failing row aborts the loop, the uncommitted
//! transaction rolls back when it drops, and the connection closes right after.

use crate::config::DatabaseConfig;
use crate::database::{quote_ident, ScopedConnection};
use crate::error::ApiError;
use crate::ingest::column_mapping::COMPANY_ID;
use crate::ingest::parser::{ParsedUpload, UploadRecord};
use log::{debug, info};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::time::Instant;
use uuid::Uuid;

/// Cell texts stored as SQL `NULL` instead of as strings.
const NULL_MARKERS: &[&str] = &["", "NULL", "null"];

#[derive(Debug)]
pub struct InsertBatch {
    pub batch_id: Uuid,
    pub company_id: i64,
    /// Canonical columns in statement order; `CompanyId` is always last.
    columns: Vec<&'static str>,
    records: Vec<UploadRecord>,
}

impl InsertBatch {
    /// Takes the parsed upload and the company it belongs to. The request's company
    /// identifier wins over any `CompanyId` column present in the file.
    pub fn new(company_id: i64, parsed: ParsedUpload) -> Self {
        let mut columns: Vec<&'static str> = parsed
            .columns
            .iter()
            .map(|c| c.canonical)
            .filter(|c| *c != COMPANY_ID)
            .collect();
        columns.push(COMPANY_ID);

        InsertBatch {
            batch_id: Uuid::new_v4(),
            company_id,
            columns,
            records: parsed.records,
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn row_values(&self, record: &UploadRecord) -> Vec<Value> {
        self.columns
            .iter()
            .map(|&column| {
                if column == COMPANY_ID {
                    return Value::Integer(self.company_id);
                }
                match record.get(column) {
                    Some(cell) if !NULL_MARKERS.contains(&cell) => Value::Text(cell.to_string()),
                    _ => Value::Null,
                }
            })
            .collect()
    }
}

/// Renders the parameterized insert for `columns`. Only identifiers reach the SQL text;
/// every value is a numbered placeholder.
pub fn insert_statement(table: &str, columns: &[&str]) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names,
        placeholders
    )
}

/// Inserts the whole batch or nothing. Returns the number of rows written.
pub fn insert_batch(db: &DatabaseConfig, batch: &InsertBatch) -> Result<usize, ApiError> {
    if batch.is_empty() {
        return Ok(0);
    }

    let start = Instant::now();
    let sql = insert_statement(&db.table, batch.columns());
    debug!("[batch {}] {}", batch.batch_id, sql);

    let mut conn = ScopedConnection::acquire(db, "insert_batch")?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for (i, record) in batch.records.iter().enumerate() {
            let values = batch.row_values(record);
            stmt.execute(params_from_iter(values.iter()))
                .map_err(|e| ApiError::from(e).context(format!("data row {}", i + 1)))?;
        }
    }
    tx.commit()?;

    info!(
        "[batch {}] inserted {} rows for company {} in {:.2?}",
        batch.batch_id,
        batch.len(),
        batch.company_id,
        start.elapsed()
    );
    Ok(batch.len())
}
