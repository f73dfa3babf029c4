//! # Validation Middleware
//!
//! Buffers the request body under the gate's cap, evaluates the partition
//! pipeline, and either replays the request downstream or short-circuits
//! with the structured rejection.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use turnstile_schema::{Partition, Violation};

use crate::error::GateError;
use crate::gate::{Decision, ValidationGate};

/// Request-validation middleware.
///
/// Attach with [`axum::middleware::from_fn`] beneath an
/// `Extension(ValidationGate)` layer:
///
/// ```ignore
/// router
///     .layer(from_fn(validate_request))
///     .layer(Extension(gate))
/// ```
///
/// The body is consumed, validated, and reconstructed, so downstream
/// extractors observe it unchanged.
pub async fn validate_request(
    Extension(gate): Extension<ValidationGate>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let ctx = gate.context(&parts);

    let bytes = match to_bytes(body, gate.config().max_body_bytes()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "request body unreadable or over the configured cap");
            return GateError::Validation {
                partition: Partition::Body,
                violations: vec![Violation {
                    keyword: "body".to_string(),
                    path: String::new(),
                    message: "request body could not be read or exceeds the size limit"
                        .to_string(),
                }],
            }
            .into_response();
        }
    };

    match gate.evaluate(&ctx, &bytes) {
        Ok(Decision::Proceed) => {
            let request = Request::from_parts(parts, Body::from(bytes));
            next.run(request).await
        }
        Ok(Decision::Reject {
            partition,
            violations,
        }) => GateError::Validation {
            partition,
            violations,
        }
        .into_response(),
        Err(err) => GateError::from(err).into_response(),
    }
}
