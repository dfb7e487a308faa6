//! HTTP surface of the service.
//!
//! - `GET /` and `GET /health`: unauthenticated liveness endpoints (`status`).
//! - `POST /upload-csv/` and `GET /upload-csv`: ingest a CSV file for a company, and read
//!   stored rows back filtered by company (`upload_csv`).
//! - `GET /database/all-data`: paginated browse of the whole table (`database`).
//!
//! Every failure leaves as an `ApiError` JSON body, including query strings that do not
//! deserialize. Protected handlers read their query string only after the credential
//! check, so an unauthenticated caller learns nothing about its parameters.

mod database;
mod status;
mod upload_csv;

use crate::error::ApiError;
use actix_web::{web, HttpRequest};
use serde::de::DeserializeOwned;

/// Registers every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status::root))
    .route("/health", web::get().to(status::health))
    .service(upload_csv::configure_routes())
    .service(database::configure_routes());
}

/// Deserializes the request's query string into `T`.
pub(crate) fn parse_query<T: DeserializeOwned>(req: &HttpRequest) -> Result<T, ApiError> {
    web::Query::<T>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))
}
