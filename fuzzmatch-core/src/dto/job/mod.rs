//! Job DTOs for the match service API

use serde::{Deserialize, Serialize};

/// Error body returned by the service on non-2xx responses
///
/// The service is not consistent about the key it uses, so all of the
/// common ones are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Extracts a human-readable message from a raw response body
    ///
    /// Falls back to the trimmed body text when it is not a recognized JSON
    /// error object.
    pub fn message_from(body: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error.or(parsed.detail).or(parsed.message))
            .unwrap_or_else(|| body.trim().to_string())
    }
}
