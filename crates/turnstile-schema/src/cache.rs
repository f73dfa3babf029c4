//! # Validator Cache + Compiler
//!
//! Turns schema definitions into compiled validators exactly once per
//! process and remembers where no definition exists at all, so the
//! storage lookup cost is paid once per identifier rather than once per
//! request.
//!
//! ## Degrade Policy
//!
//! A definition that does not parse or compile is an operator problem,
//! not a caller problem: it is logged at error level, counted on
//! `turnstile_schema_compile_failures_total`, and cached as absent. The
//! affected endpoint is served without validation; unrelated endpoints
//! are untouched.
//!
//! ## Locking
//!
//! Reads take a `parking_lot` read lock and nothing else. Loading and
//! compiling happen with no lock held, so concurrent first requests for
//! the same identifier may compile redundantly; the first entry written
//! wins and later compilations are dropped. Compiling the same definition
//! twice yields equivalent validators, so redundancy is harmless and
//! steady-state reads never wait on I/O.

use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::Validator;
use metrics::counter;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::locator::SchemaId;
use crate::store::{SchemaStore, StoreError};

/// Counter bumped each time a schema definition fails to parse or compile.
pub const COMPILE_FAILURES_COUNTER: &str = "turnstile_schema_compile_failures_total";

/// Outcome of resolving an identifier: a usable validator, or the cached
/// knowledge that no schema governs that identifier.
#[derive(Clone)]
pub enum Resolved {
    /// A compiled validator, shared across all requests for its identifier.
    Validator(Arc<Validator>),
    /// No schema exists (or the definition was unusable and degraded).
    Absent,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validator(_) => f.write_str("Resolved::Validator(..)"),
            Self::Absent => f.write_str("Resolved::Absent"),
        }
    }
}

impl Resolved {
    /// Whether this resolution carries no validator.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Error during resolution that is not expressible as absence.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The schema store failed; surfaced to the caller as an internal
    /// fault, never as a validation verdict.
    #[error("schema store failure: {0}")]
    Store(#[from] StoreError),
}

/// Process-lifetime mapping from schema identifier to compiled validator.
///
/// Constructed once at service startup around a [`SchemaStore`] and shared
/// by reference. Entries are created lazily on first lookup and never
/// evicted; the identifier space is bounded by the endpoints and
/// partitions the service exposes.
pub struct ValidatorCache {
    store: Arc<dyn SchemaStore>,
    entries: RwLock<HashMap<SchemaId, Resolved>>,
}

impl std::fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

impl ValidatorCache {
    /// Create an empty cache over `store`.
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of resolved identifiers (validators and cached absences).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolve `id` to a compiled validator or an absence marker.
    ///
    /// The first resolution for an identifier loads and compiles; every
    /// later one is an in-memory read. Parse and compile failures degrade
    /// to [`Resolved::Absent`] after being logged and counted. Only a
    /// storage fault escapes as an error.
    pub fn resolve(&self, id: &SchemaId) -> Result<Resolved, ResolveError> {
        if let Some(resolved) = self.entries.read().get(id) {
            return Ok(resolved.clone());
        }

        let resolved = match self.store.load(id) {
            Ok(Some(schema)) => match compile(&schema) {
                Ok(validator) => {
                    tracing::debug!(%id, "compiled schema validator");
                    Resolved::Validator(Arc::new(validator))
                }
                Err(reason) => {
                    tracing::error!(
                        %id,
                        %reason,
                        "schema definition failed to compile; endpoint will be served without validation"
                    );
                    counter!(COMPILE_FAILURES_COUNTER).increment(1);
                    Resolved::Absent
                }
            },
            Ok(None) => {
                tracing::debug!(%id, "no schema registered");
                Resolved::Absent
            }
            Err(StoreError::InvalidDocument { ref reason, .. }) => {
                tracing::error!(
                    %id,
                    %reason,
                    "schema definition is not valid JSON; endpoint will be served without validation"
                );
                counter!(COMPILE_FAILURES_COUNTER).increment(1);
                Resolved::Absent
            }
            Err(err) => return Err(err.into()),
        };

        // First writer wins. A concurrent request may have resolved the
        // same identifier while we were loading; keep its entry so the
        // identifier maps to one validator for the process lifetime.
        let mut entries = self.entries.write();
        Ok(entries.entry(id.clone()).or_insert(resolved).clone())
    }
}

/// Compile a schema definition into a validator.
///
/// Draft 2020-12 semantics with format assertions enabled, so `email`,
/// `date-time`, and `uri` constraints are enforced rather than annotated.
pub(crate) fn compile(schema: &Value) -> Result<Validator, String> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.should_validate_formats(true);
    opts.build(schema).map_err(|e| e.to_string())
}
