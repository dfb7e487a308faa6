use crate::app_state::AppState;
use crate::database::{ping, run_blocking, table_exists};
use actix_web::{web, HttpResponse, Responder};
use common::model::status::{HealthReport, ServiceInfo};
use std::collections::BTreeMap;

/// `GET /`: welcome message and a map of the API.
pub async fn root(state: web::Data<AppState>) -> impl Responder {
    let endpoints = [
        ("/upload-csv/ (POST)", "Upload a CSV file for a company; requires credentials"),
        ("/upload-csv (GET)", "Stored rows, optionally filtered by company_id; requires credentials"),
        ("/database/all-data (GET)", "Paginated browse of all stored rows; requires credentials"),
        ("/health (GET)", "Service and database health"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect::<BTreeMap<_, _>>();

    HttpResponse::Ok().json(ServiceInfo {
        message: "CSV Upload API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: state.config.database.summary(),
        columns: state.mapping.column_names().map(String::from).collect(),
        endpoints,
    })
}

/// `GET /health`: always `200` while the process is serving; the database state is
/// reported in the body rather than through the status code.
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let db = state.config.database.clone();
    let probe = run_blocking(move || {
        ping(&db)?;
        table_exists(&db)
    })
    .await;

    let (database, table_exists) = match probe {
        Ok(exists) => ("healthy".to_string(), exists),
        Err(e) => (format!("unhealthy: {}", e), false),
    };

    HttpResponse::Ok().json(HealthReport {
        status: "healthy".to_string(),
        database,
        configuration: state.config.database.summary(),
        table_exists,
    })
}
