use crate::app_state::AppState;
use crate::auth::{self, Credentials};
use crate::database::run_blocking;
use crate::error::ApiError;
use crate::ingest::batch::{insert_batch, InsertBatch};
use crate::ingest::parser::{ensure_csv_content_type, ensure_csv_filename, parse_upload};
use crate::services::parse_query;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use common::model::upload::UploadSummary;
use common::requests::UploadRequest;
use futures_util::StreamExt;
use log::{error, info, warn};
use md5::Context;

/// Upper bound for the plain form fields (`company_id`, `username`, `password`).
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
    md5: String,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    company_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl UploadForm {
    fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            username: self.username.clone()?,
            password: self.password.clone()?,
        })
    }
}

/// HTTP handler wrapper that converts the internal result to an `HttpResponse`.
///
/// - On success: `200 OK` with an `UploadSummary`.
/// - On failure: the `ApiError` status and JSON body. Nothing was written.
pub async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Multipart,
) -> impl Responder {
    match upload_csv(&req, &state, payload).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("upload failed: {}", e);
            } else {
                warn!("upload rejected: {}", e);
            }
            e.error_response()
        }
    }
}

/// Validates the request in order (credentials, company, file type, content) and then
/// inserts every row of the file as one batch.
async fn upload_csv(
    req: &HttpRequest,
    state: &AppState,
    payload: Multipart,
) -> Result<UploadSummary, ApiError> {
    let config = &state.config;

    // Header credentials can be refused before the body is read.
    let header_credentials = auth::from_request(req);
    if header_credentials.is_some() {
        auth::require(&config.auth, header_credentials.as_ref())?;
    }

    let form = read_form(payload, config.server.max_upload_bytes).await?;
    if header_credentials.is_none() {
        auth::require(&config.auth, form.credentials().as_ref())?;
    }
    let query: UploadRequest = parse_query(req)?;

    let company_id = match (form.company_id.as_deref(), query.company_id) {
        (Some(raw), _) => raw.trim().parse::<i64>().map_err(|_| {
            ApiError::InvalidRequest(format!("company_id '{raw}' is not an integer"))
        })?,
        (None, Some(id)) => id,
        (None, None) => return Err(ApiError::InvalidRequest("company_id is required".into())),
    };

    let file = form
        .file
        .ok_or_else(|| ApiError::InvalidRequest("file is required".into()))?;
    ensure_csv_filename(&file.filename)?;
    ensure_csv_content_type(file.content_type.as_deref())?;

    info!(
        "upload of '{}' ({} bytes, md5 {}) for company {}",
        file.filename,
        file.bytes.len(),
        file.md5,
        company_id
    );

    let mapping = state.mapping.clone();
    let db = config.database.clone();
    run_blocking(move || {
        let parsed = parse_upload(&file.bytes, &mapping)?;
        if !parsed.unmapped.is_empty() {
            warn!(
                "'{}': dropping unrecognised columns {:?}",
                file.filename, parsed.unmapped
            );
        }
        let column_mapping = parsed
            .columns
            .iter()
            .map(|c| (c.source.clone(), c.canonical.to_string()))
            .collect();
        let unmapped_columns = parsed.unmapped.clone();

        let batch = InsertBatch::new(company_id, parsed);
        let inserted_count = insert_batch(&db, &batch)?;

        Ok(UploadSummary {
            batch_id: batch.batch_id.to_string(),
            filename: file.filename,
            company_id,
            inserted_count,
            columns: batch.columns().iter().map(|c| c.to_string()).collect(),
            column_mapping,
            unmapped_columns,
            file_md5: file.md5,
        })
    })
    .await
}

/// Drains the multipart stream into an `UploadForm`. The file is capped at `max_bytes`.
async fn read_form(mut payload: Multipart, max_bytes: usize) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                if form.file.is_some() {
                    return Err(ApiError::InvalidRequest(
                        "only one file may be uploaded per request".into(),
                    ));
                }
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let content_type = field.content_type().map(|m| m.to_string());

                let mut md5_hasher = Context::new();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk?;
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge { limit: max_bytes });
                    }
                    md5_hasher.consume(&chunk);
                    bytes.extend_from_slice(&chunk);
                }

                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                    md5: format!("{:x}", md5_hasher.finalize()),
                });
            }
            Some("company_id") => form.company_id = Some(read_text(&mut field, "company_id").await?),
            Some("username") => form.username = Some(read_text(&mut field, "username").await?),
            Some("password") => form.password = Some(read_text(&mut field, "password").await?),
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
        }
    }

    Ok(form)
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        bytes.extend_from_slice(&chunk?);
        if bytes.len() > MAX_TEXT_FIELD_BYTES {
            return Err(ApiError::InvalidRequest(format!("field '{name}' is too long")));
        }
    }
    String::from_utf8(bytes)
        .map_err(|_| ApiError::InvalidRequest(format!("field '{name}' is not valid UTF-8")))
}
