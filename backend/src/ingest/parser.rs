//! Decoding and normalization of an uploaded CSV file.
//!
//! Parsing goes through the `csv` crate, so quoted fields with embedded commas, quotes
//! and newlines come out exactly as authored. Records are read one at a time into a
//! reused buffer and only the mapped cells are kept.

use crate::error::ApiError;
use crate::ingest::column_mapping::ColumnMapping;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;

/// MIME types a CSV part may declare. Browsers send `application/vnd.ms-excel` for
/// `.csv` on some platforms.
const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "application/csv",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

/// One data row of the upload, keyed by canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRecord {
    cells: BTreeMap<&'static str, String>,
}

impl UploadRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// A CSV header that resolved to a canonical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    /// Header as it appeared in the file, trimmed.
    pub source: String,
    pub canonical: &'static str,
    index: usize,
}

#[derive(Debug, Default)]
pub struct ParsedUpload {
    pub columns: Vec<MappedColumn>,
    /// Headers that matched nothing (or repeated an already-mapped column).
    pub unmapped: Vec<String>,
    pub records: Vec<UploadRecord>,
}

pub fn ensure_csv_filename(filename: &str) -> Result<(), ApiError> {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(ApiError::InvalidFileType(format!(
            "'{filename}' does not end with .csv"
        )))
    }
}

/// Checks the MIME type a multipart part declared for the file, when it declared one.
pub fn ensure_csv_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    let Some(raw) = content_type else {
        return Ok(());
    };
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.starts_with("text/") || ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(ApiError::InvalidFileType(format!(
            "content type '{raw}' is not a CSV type"
        )))
    }
}

/// Decodes `bytes` as CSV and maps its columns onto the canonical schema.
///
/// An empty body or a header-only file yields zero records. Data rows with no
/// recognized header at all are refused, since nothing of them could be stored.
pub fn parse_upload(bytes: &[u8], mapping: &ColumnMapping) -> Result<ParsedUpload, ApiError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let (columns, unmapped) = map_headers(&headers, mapping);

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while reader.read_record(&mut row)? {
        if columns.is_empty() {
            return Err(ApiError::UnreadableContent(format!(
                "none of the columns {:?} is recognised",
                unmapped
            )));
        }
        let cells = columns
            .iter()
            .map(|c| (c.canonical, row.get(c.index).unwrap_or_default().to_string()))
            .collect();
        records.push(UploadRecord { cells });
    }

    Ok(ParsedUpload {
        columns,
        unmapped,
        records,
    })
}

fn map_headers(headers: &StringRecord, mapping: &ColumnMapping) -> (Vec<MappedColumn>, Vec<String>) {
    let mut columns: Vec<MappedColumn> = Vec::new();
    let mut unmapped = Vec::new();

    for (index, raw) in headers.iter().enumerate() {
        let source = raw.trim_start_matches('\u{feff}').trim().to_string();
        match mapping.resolve(&source) {
            Some(canonical) if !columns.iter().any(|c| c.canonical == canonical) => {
                columns.push(MappedColumn {
                    source,
                    canonical,
                    index,
                });
            }
            _ => unmapped.push(source),
        }
    }
    (columns, unmapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> ColumnMapping {
        ColumnMapping::standard().unwrap()
    }

    #[test]
    fn filename_suffix_is_checked_case_insensitively() {
        assert!(ensure_csv_filename("policies.csv").is_ok());
        assert!(ensure_csv_filename("POLICIES.CSV").is_ok());
        for bad in ["policies.txt", "policies.csv.exe", "csv", "", "policies.xlsx"] {
            assert!(
                matches!(ensure_csv_filename(bad), Err(ApiError::InvalidFileType(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn declared_content_types() {
        assert!(ensure_csv_content_type(None).is_ok());
        assert!(ensure_csv_content_type(Some("text/csv")).is_ok());
        assert!(ensure_csv_content_type(Some("text/plain; charset=utf-8")).is_ok());
        assert!(ensure_csv_content_type(Some("application/vnd.ms-excel")).is_ok());
        assert!(matches!(
            ensure_csv_content_type(Some("image/png")),
            Err(ApiError::InvalidFileType(_))
        ));
    }

    #[test]
    fn headers_are_normalized_and_unknown_columns_dropped() {
        let csv = "Bus Information Id , Company Id,Insurance-Provider,Policy_Number,Driver Name\n\
                   1,101,Acme Mutual,P001,Ravi\n";
        let parsed = parse_upload(csv.as_bytes(), &mapping()).unwrap();

        let canonical: Vec<_> = parsed.columns.iter().map(|c| c.canonical).collect();
        assert_eq!(
            canonical,
            ["BusInformationId", "CompanyId", "InsuranceProvider", "PolicyNumber"]
        );
        assert_eq!(parsed.columns[0].source, "Bus Information Id");
        assert_eq!(parsed.unmapped, ["Driver Name"]);

        let record = &parsed.records[0];
        assert_eq!(record.get("BusInformationId"), Some("1"));
        assert_eq!(record.get("InsuranceProvider"), Some("Acme Mutual"));
        assert_eq!(record.get("Driver Name"), None);
    }

    #[test]
    fn quoted_cells_round_trip_exactly() {
        let authored = "Route 7, \"express\"\nsecond line, ünïcødé";
        let quoted = authored.replace('"', "\"\"");
        let csv = format!("PolicyNumber,Remarks\r\nP001,\"{quoted}\"\r\n");

        let parsed = parse_upload(csv.as_bytes(), &mapping()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].get("Remarks"), Some(authored));
    }

    #[test]
    fn cell_whitespace_is_preserved() {
        let csv = "PolicyNumber,Remarks\nP001,  padded  \n";
        let parsed = parse_upload(csv.as_bytes(), &mapping()).unwrap();
        assert_eq!(parsed.records[0].get("Remarks"), Some("  padded  "));
    }

    #[test]
    fn empty_and_header_only_files_have_no_records() {
        let parsed = parse_upload(b"", &mapping()).unwrap();
        assert!(parsed.records.is_empty());

        let parsed = parse_upload(b"BusInformationId,CompanyId\n", &mapping()).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.columns.len(), 2);
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let mut bytes = b"PolicyNumber,Remarks\nP001,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0x41]);
        bytes.push(b'\n');
        let err = parse_upload(&bytes, &mapping()).unwrap_err();
        assert!(matches!(err, ApiError::UnreadableContent(_)), "{err:?}");
    }

    #[test]
    fn ragged_rows_are_unreadable() {
        let csv = "PolicyNumber,Remarks\nP001,ok\nP002,too,many\n";
        let err = parse_upload(csv.as_bytes(), &mapping()).unwrap_err();
        let ApiError::UnreadableContent(message) = err else {
            panic!("expected UnreadableContent");
        };
        assert!(message.contains("line 3"), "{message}");
    }

    #[test]
    fn rows_without_any_recognised_column_are_refused() {
        let csv = "Driver,Depot\nRavi,North\n";
        let err = parse_upload(csv.as_bytes(), &mapping()).unwrap_err();
        assert!(matches!(err, ApiError::UnreadableContent(_)));
    }

    #[test]
    fn repeated_canonical_column_keeps_first_occurrence() {
        let csv = "PolicyNumber,Policy No\nP001,IGNORED\n";
        let parsed = parse_upload(csv.as_bytes(), &mapping()).unwrap();
        assert_eq!(parsed.columns.len(), 1);
        assert_eq!(parsed.unmapped, ["Policy No"]);
        assert_eq!(parsed.records[0].get("PolicyNumber"), Some("P001"));
    }
}
