use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub database: DatabaseSummary,
    /// Canonical columns an uploaded CSV can fill.
    pub columns: Vec<String>,
    /// Route to a short description of what it does.
    pub endpoints: BTreeMap<String, String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    /// `healthy` or `unhealthy: <reason>`.
    pub database: String,
    pub configuration: DatabaseSummary,
    pub table_exists: bool,
}

/// Where the service writes: database name, server and target table. Never carries
/// credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    pub name: String,
    pub server: String,
    pub table: String,
}
