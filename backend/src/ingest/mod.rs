//! CSV ingestion: header mapping, parsing, and the atomic batch insert.

pub mod batch;
pub mod column_mapping;
pub mod parser;
