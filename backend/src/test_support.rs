//! Fixtures shared by the test modules: a throwaway SQLite database built from
//! `schema.sql`, a matching `AppConfig`, and a multipart body builder.

use crate::app_state::AppState;
use crate::config::AppConfig;
use rusqlite::{params, Connection};
use std::path::Path;
use tempfile::TempDir;

pub const TABLE: &str = "MTN_BusInsurance";
pub const USERNAME: &str = "InsuranceHead";
pub const PASSWORD: &str = "insurance@123";
pub const BOUNDARY: &str = "----csv-upload-test-boundary";

pub struct TestDb {
    dir: TempDir,
}

impl TestDb {
    /// Fresh database with the expected schema and buses 1..=10 registered.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("insurance.db")).unwrap();
        conn.execute_batch(include_str!("../schema.sql")).unwrap();
        for id in 1..=10 {
            conn.execute(
                "INSERT INTO MTN_BusInformation (BusInformationId, RegistrationNumber) VALUES (?1, ?2)",
                params![id, format!("KA-01-{id:04}")],
            )
            .unwrap();
        }
        TestDb { dir }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> AppConfig {
        let db_path = self.dir.path().join("insurance.db");
        let db_path = db_path.to_string_lossy().into_owned();
        AppConfig::from_lookup(move |key| {
            let value = match key {
                "DB_NAME" => db_path.as_str(),
                "TABLE_NAME" => TABLE,
                "API_USERNAME" => USERNAME,
                "API_PASSWORD" => PASSWORD,
                "MAX_UPLOAD_BYTES" => "1048576",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.config()).unwrap()
    }

    pub fn connection(&self) -> Connection {
        Connection::open(self.dir.path().join("insurance.db")).unwrap()
    }

    pub fn count_rows(&self) -> i64 {
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    pub fn count_company(&self, company_id: i64) -> i64 {
        self.connection()
            .query_row(
                &format!("SELECT COUNT(*) FROM {TABLE} WHERE CompanyId = ?1"),
                params![company_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    /// Inserts `n` rows for `company_id` directly, bypassing the service.
    pub fn seed_rows(&self, company_id: i64, n: usize) {
        let mut conn = self.connection();
        let tx = conn.transaction().unwrap();
        for i in 0..n {
            tx.execute(
                &format!(
                    "INSERT INTO {TABLE} (BusInformationId, CompanyId, PolicyNumber) VALUES (?1, ?2, ?3)"
                ),
                params![(i % 10 + 1) as i64, company_id, format!("P{i:05}")],
            )
            .unwrap();
        }
        tx.commit().unwrap();
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn csv_file<'a>(filename: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "file",
        filename,
        content_type: "text/csv",
        bytes,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
