//! CSV ingestion endpoints.
//!
//! - `POST /upload-csv/`: multipart upload. Expects a `file` part with the CSV data and
//!   a `company_id` (form field or query parameter). Credentials travel as headers
//!   (`Authorization: Basic`, or `X-Username`/`X-Password`) or as `username`/`password`
//!   form fields. The file is parsed, its headers mapped onto the canonical columns, and
//!   every row inserted in one transaction. The response reports how many rows landed.
//!
//! - `GET /upload-csv`: stored rows, optionally narrowed with `company_id`, paginated with
//!   `page`/`page_size`. Credentials as headers.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get;
mod upload;

const API_PATH: &str = "/upload-csv";

/// Configures and returns the Actix scope for the CSV routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Route to upload a CSV file into the table.
        .route("/", post().to(upload::process))
        // Route to read stored rows back, by company.
        .route("", get().to(get::process))
}
