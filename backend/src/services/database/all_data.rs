//! `GET /database/all-data`: the whole ingestion table, one page at a time.
//!
//! Query parameters `page` (1-based, default 1) and `page_size` (default and upper bound
//! from configuration). Asking for a page past the end returns an empty `data` array with
//! the real totals, not an error.

use crate::app_state::AppState;
use crate::auth;
use crate::database::run_blocking;
use crate::error::ApiError;
use crate::query::{fetch_page, Pagination, RowFilter};
use crate::services::parse_query;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::page::Page;
use common::model::stored_row::StoredRow;
use common::requests::PageRequest;
use log::error;

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> impl Responder {
    match browse_all(&req, &state).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("all-data failed: {}", e);
            }
            e.error_response()
        }
    }
}

async fn browse_all(
    req: &HttpRequest,
    state: &AppState,
) -> Result<Page<StoredRow>, ApiError> {
    auth::require(&state.config.auth, auth::from_request(req).as_ref())?;
    let query: PageRequest = parse_query(req)?;
    let pagination = Pagination::from_request(query.page, query.page_size, &state.config.pages)?;

    let db = state.config.database.clone();
    run_blocking(move || fetch_page(&db, &RowFilter::default(), pagination)).await
}
