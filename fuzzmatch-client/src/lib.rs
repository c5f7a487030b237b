//! Fuzzmatch HTTP Client
//!
//! A small, type-safe HTTP client for the remote fuzzy-match service.
//!
//! The service owns the matching algorithm; this crate only starts jobs,
//! reads their whole-state status snapshots, and streams report downloads.
//!
//! # Example
//!
//! ```no_run
//! use fuzzmatch_client::MatchServiceClient;
//! use fuzzmatch_core::domain::job::JobConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = MatchServiceClient::new("http://localhost:8080");
//!
//!     client.start_job(&JobConfig::default()).await?;
//!     let state = client.job_status().await?;
//!
//!     println!("Progress: {}", state.progress);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod service;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use jobs::validate_report_handle;
pub use service::MatchService;

use fuzzmatch_core::dto::job::ApiErrorBody;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Path prefix of every match service endpoint
pub const API_PREFIX: &str = "/api/fuzzy-match";

/// HTTP client for the fuzzy-match service API
#[derive(Debug, Clone)]
pub struct MatchServiceClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl MatchServiceClient {
    /// Create a new match service client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use fuzzmatch_client::MatchServiceClient;
    ///
    /// let client = MatchServiceClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new match service client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use fuzzmatch_client::MatchServiceClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = MatchServiceClient::with_client("http://localhost:8080", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL of an endpoint below the API prefix
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is ignored
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }

    /// Turn a non-2xx response into an `ApiError`, passing successful ones through
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let mut message = ApiErrorBody::message_from(&error_text);
        if message.is_empty() {
            message = status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string();
        }

        Err(ClientError::api_error(status.as_u16(), message))
    }
}
