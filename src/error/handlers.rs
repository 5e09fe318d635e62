//! Standardized error mapping for catalog HTTP calls

use crate::error::MirrorError;
use reqwest::StatusCode;

/// Standard error handler for catalog HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Map a non-success catalog response to a `Catalog` error
    pub fn handle_catalog_error(url: &str, status: StatusCode, error_text: &str) -> MirrorError {
        let message = match status.as_u16() {
            401 => format!("Unauthorized - check registry credentials: {}", error_text),
            403 => format!("Forbidden: insufficient permissions: {}", error_text),
            404 => format!("Project or repository not found: {}", error_text),
            429 => format!("Rate limited by catalog: {}", error_text),
            500 => format!("Catalog server error: {}", error_text),
            502 | 503 => format!("Catalog unavailable: {}", error_text),
            _ => format!("{}: {}", status, error_text),
        };

        MirrorError::catalog(url, Some(status.as_u16()), message.trim_end_matches(": ").to_string())
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize transport failures with helpful context
    pub fn handle_network_error(url: &str, error: &reqwest::Error) -> MirrorError {
        let message = if error.is_timeout() {
            format!("request timed out: {}", error)
        } else if error.is_connect() {
            format!("connection error: {}", error)
        } else if error.is_decode() {
            format!("failed to decode response: {}", error)
        } else if error.to_string().contains("certificate") {
            format!("TLS certificate error (mark the registry insecure to skip verification): {}", error)
        } else {
            format!("network error: {}", error)
        };

        MirrorError::catalog(url, error.status().map(|s| s.as_u16()), message)
    }
}
