//! Request and response models shared between the CSV upload service and its clients.

pub mod model;
pub mod requests;
