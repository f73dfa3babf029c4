//! # Middleware
//!
//! The Axum entry point of the gate: [`validate::validate_request`] runs
//! the validation pipeline in front of the wrapped routes.

pub mod validate;

pub use validate::validate_request;
