use serde::Deserialize;

/// Query string of `GET /database/all-data`.
///
/// Page numbers are 1-based. Values are kept signed so that `page=-1` reaches
/// validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query string of `GET /upload-csv`.
#[derive(Debug, Default, Deserialize)]
pub struct CompanyRowsRequest {
    pub company_id: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query string accepted by `POST /upload-csv/` alongside the multipart body.
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    pub company_id: Option<i64>,
}
