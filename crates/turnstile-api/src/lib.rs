//! # turnstile-api — Axum Request Validation Gate
//!
//! The HTTP-facing half of turnstile. A [`ValidationGate`] is attached as
//! middleware in front of a router group; for every inbound request it
//! derives which schemas govern the endpoint, validates the body, query,
//! and path-parameter partitions in that order, and either hands the
//! request to the next handler or short-circuits with a structured
//! rejection.
//!
//! ## Wiring
//!
//! One gate per mounted router group, sharing a process-wide
//! [`ValidatorCache`](turnstile_schema::ValidatorCache):
//!
//! ```ignore
//! let cache = Arc::new(ValidatorCache::new(Arc::new(FsSchemaStore::new("schemas"))));
//! let gate = ValidationGate::new(cache, GateConfig::new("/api/v1/admin/users"));
//!
//! let app = Router::new()
//!     .route("/api/v1/admin/users/claims", post(grant_claim))
//!     .layer(from_fn(middleware::validate_request))
//!     .layer(Extension(gate));
//! ```
//!
//! ## Responses
//!
//! - Pass or no schema: the request proceeds unchanged (the buffered body
//!   is replayed for downstream extractors).
//! - Validation failure: `400` with `{"partition": ..., "errors": [...]}`,
//!   every violation for the failing partition included.
//! - Unexpected fault: `500` with a generic body; detail is logged, never
//!   returned.

pub mod error;
pub mod gate;
pub mod middleware;
pub mod route;

pub use error::{GateError, InternalErrorBody, RejectionBody};
pub use gate::{Decision, GateConfig, ValidationGate};
pub use route::RouteContext;
