use serde::{Deserialize, Serialize};

/// JSON body returned with every error response.
///
/// `kind` is stable and machine-readable (`InvalidFileType`, `AuthenticationFailed`, ...),
/// `message` is meant for humans and may change between releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}
