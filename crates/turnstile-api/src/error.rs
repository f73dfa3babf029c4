//! # Gate Error Types
//!
//! Maps pipeline outcomes to HTTP responses. Validation failures carry the
//! full violation list for the failing partition; internal faults are
//! logged with detail server-side and answered with a generic body so no
//! diagnostic internals reach the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use turnstile_schema::{Partition, ResolveError, Violation};

/// Rejection payload returned with HTTP 400.
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectionBody {
    /// The partition whose validation failed.
    pub partition: Partition,
    /// Every violation found in that partition, in schema traversal order.
    pub errors: Vec<Violation>,
}

/// Internal-failure payload returned with HTTP 500.
#[derive(Debug, Serialize, Deserialize)]
pub struct InternalErrorBody {
    /// Generic message. Never carries violation or fault internals.
    pub error: String,
}

/// Terminal failure states of the validation pipeline.
#[derive(Error, Debug)]
pub enum GateError {
    /// Caller-supplied data violated the schema for one partition (400).
    #[error("request {partition} failed schema validation")]
    Validation {
        /// The failing partition.
        partition: Partition,
        /// All violations for that partition.
        violations: Vec<Violation>,
    },

    /// Unexpected fault while resolving or validating (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ResolveError> for GateError {
    fn from(err: ResolveError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation {
                partition,
                violations,
            } => {
                tracing::info!(
                    %partition,
                    violations = violations.len(),
                    "request rejected by schema validation"
                );
                let body = RejectionBody {
                    partition,
                    errors: violations,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "validation pipeline fault");
                let body = InternalErrorBody {
                    error: "An internal error occurred".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
