mod app_state;
mod auth;
mod config;
mod database;
mod error;
mod ingest;
mod query;
mod services;
#[cfg(test)]
mod test_support;

use crate::app_state::AppState;
use crate::config::{AppConfig, DatabaseConfig};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::io;

/// Checks the database once before serving. Problems are logged, not fatal: the API
/// starts anyway and reports the failure per request and on `/health`.
async fn check_database(db: &DatabaseConfig) {
    let probe = db.clone();
    let result = database::run_blocking(move || {
        database::ping(&probe)?;
        database::table_exists(&probe)
    })
    .await;

    match result {
        Ok(true) => info!("Database connection successful, table '{}' exists", db.table),
        Ok(false) => warn!(
            "Table '{}' does not exist in database; uploads will fail until it is created",
            db.table
        ),
        Err(e) => warn!("Database check failed: {}. API will start but database operations will fail", e),
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("{}", e);
        io::Error::other(e)
    })?;
    info!("Database configuration loaded: {}", config.database);

    let state = AppState::new(config).map_err(|e| {
        error!("Invalid column mapping: {}", e);
        io::Error::other(e)
    })?;

    check_database(&state.config.database).await;

    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(services::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
