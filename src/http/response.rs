//! Error responses.
//!
//! # Responsibilities
//! - Render every failure as the same JSON shape
//! - Map validation faults to 400, transport faults to 502/504
//! - Turn handler panics into a 500 instead of a dropped connection
//!
//! # Design Decisions
//! - Bodies carry enough detail (code, message, target) to diagnose without
//!   server logs, but never stack traces or internal paths

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::relay::{RelayError, ValidationError};

const TARGET_SUGGESTION: &str = "make sure the target URL starts with http:// or https://";

/// JSON error body returned by the relay.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code: None,
            target_url: None,
            suggestion: None,
            usage: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_url = Some(target.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Rejection for a path that resolved to no valid target.
    pub fn validation(err: &ValidationError, prefix: &str) -> Self {
        let body = ErrorBody::new("invalid target", err.to_string())
            .with_code(err.code())
            .with_target(err.target());

        match err {
            ValidationError::MissingTarget => body
                .with_suggestion("append the target URL to the relay path")
                .with_usage(format!("{}<target-url>", prefix)),
            _ => body.with_suggestion(TARGET_SUGGESTION),
        }
    }

    pub fn relay(err: &RelayError) -> Self {
        ErrorBody::new("relay failed", err.message())
            .with_code(err.code().as_str())
            .with_target(err.target())
            .with_suggestion(err.suggestion())
    }

    pub fn at_capacity(target: &str, max_in_flight: usize) -> Self {
        ErrorBody::new(
            "relay at capacity",
            format!("{} relay operations already in flight", max_in_flight),
        )
        .with_code("at_capacity")
        .with_target(target)
        .with_suggestion("retry shortly")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ErrorBody::new("internal server error", message).with_code("internal_error")
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        ErrorBody::relay(&self).into_response_with(status)
    }
}

/// `CatchPanicLayer` hook: surface the panic message as a 500.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(message = %message, "Handler panicked");
    ErrorBody::internal(message).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}
