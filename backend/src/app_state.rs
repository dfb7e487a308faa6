//! Read-only state shared by every handler.
//!
//! Built once in `main` (or by a test) and handed to actix as `web::Data`. It holds no
//! mutable data: the only per-request resources are the scoped database connections
//! opened inside each handler.

use crate::config::AppConfig;
use crate::ingest::column_mapping::{ColumnMapping, MappingError};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Validated startup configuration.
    pub config: Arc<AppConfig>,
    /// CSV header variants to canonical database column, checked at construction.
    pub mapping: Arc<ColumnMapping>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, MappingError> {
        Ok(AppState {
            config: Arc::new(config),
            mapping: Arc::new(ColumnMapping::standard()?),
        })
    }
}
