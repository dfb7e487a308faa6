pub mod error;
pub mod page;
pub mod status;
pub mod stored_row;
pub mod upload;
