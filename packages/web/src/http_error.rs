//! HTTP error handling
//!
//! Application failures carry a stable code (`E-1xx` validation, `E-2xx`
//! access/control, `E-500` internal); the code picks the response status and
//! the error renders as a regular page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use onebase_core::services::ServiceError;

use crate::render;

/// A coded application error rendered as an HTML error page.
#[derive(Debug)]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Stable application error code
    pub code: String,
    /// Optional detail for the log line
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details.
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    /// Shorthand for a 404-coded error.
    pub fn not_found(what: &str, ident: &str) -> Self {
        Self::new(format!("{} not found: {}", what, ident), "E-206")
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        Self {
            message: err.to_string(),
            code: err.error_code().to_string(),
            details: None,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "E-206" => StatusCode::NOT_FOUND,
            "E-201" => StatusCode::FORBIDDEN,
            "E-202" | "E-203" => StatusCode::UNAUTHORIZED,
            "E-500" => StatusCode::INTERNAL_SERVER_ERROR,
            code if code.starts_with("E-1") || code.starts_with("E-2") || code.starts_with("E-4") => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let Some(details) = &self.details {
            tracing::error!(code = %self.code, details = %details, "{}", self.message);
        } else {
            tracing::error!(code = %self.code, "{}", self.message);
        }

        (status, Html(render::error_page(&self.code, &self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_mapping() {
        let err = HttpError::from(ServiceError::MissingPath);
        assert_eq!(err.code, "E-207");

        let err = HttpError::from(ServiceError::not_found("Node", "x"));
        assert_eq!(err.code, "E-206");
    }
}
