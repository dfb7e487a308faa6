//! # Stored Row Retrieval
//!
//! Backs `GET /upload-csv`. Reads rows back from the ingestion table, narrowed to one
//! company when `company_id` is given, one page at a time.
//!
//! The response always carries the pagination totals. When a company filter matched
//! nothing, `message` says so and `data` is empty; that is still a `200 OK`.

use crate::app_state::AppState;
use crate::auth;
use crate::database::run_blocking;
use crate::error::ApiError;
use crate::query::{fetch_page, Pagination, RowFilter};
use crate::services::parse_query;
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::page::CompanyRows;
use common::requests::CompanyRowsRequest;
use log::error;

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> impl Responder {
    match get_company_rows(&req, &state).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("company lookup failed: {}", e);
            }
            e.error_response()
        }
    }
}

async fn get_company_rows(
    req: &HttpRequest,
    state: &AppState,
) -> Result<CompanyRows, ApiError> {
    auth::require(&state.config.auth, auth::from_request(req).as_ref())?;
    let query: CompanyRowsRequest = parse_query(req)?;
    let pagination = Pagination::from_request(query.page, query.page_size, &state.config.pages)?;

    let filter = RowFilter {
        company_id: query.company_id,
    };
    let db = state.config.database.clone();
    let page = run_blocking(move || fetch_page(&db, &filter, pagination)).await?;

    let message = match query.company_id {
        Some(id) if page.total_records == 0 => {
            Some(format!("No records found for company_id: {}", id))
        }
        _ => None,
    };

    Ok(CompanyRows {
        company_id: query.company_id,
        message,
        page,
    })
}
