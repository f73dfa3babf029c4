//! # Schema Stores
//!
//! The lookup seam between schema identifiers and schema definitions.
//! The cache only ever sees the [`SchemaStore`] trait, so the namespace
//! can be backed by a directory tree, embedded documents, or anything
//! else that can answer a lookup-by-identifier.
//!
//! Absence is an answer, not an error: `Ok(None)` means no schema governs
//! that (endpoint, partition) and the caller applies skip semantics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::locator::SchemaId;

/// Suffix appended to identifiers by the filesystem store.
const SCHEMA_SUFFIX: &str = ".schema.json";

/// Error while loading a schema definition.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The definition exists but is not parseable JSON. The cache degrades
    /// this to absence after logging it for the operator.
    #[error("schema '{id}' is not valid JSON: {reason}")]
    InvalidDocument {
        /// Identifier of the unparseable definition.
        id: String,
        /// Parser message.
        reason: String,
    },

    /// The backing storage failed in a way that is not "not found".
    #[error("io error reading schema '{id}': {source}")]
    Io {
        /// Identifier whose lookup failed.
        id: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Lookup-by-identifier over a schema namespace.
pub trait SchemaStore: Send + Sync {
    /// Load the definition for `id`, or `None` if no schema exists there.
    fn load(&self, id: &SchemaId) -> Result<Option<Value>, StoreError>;
}

/// Directory-backed schema store.
///
/// An identifier `api/v1/users/POST_claims_body` resolves to
/// `<root>/api/v1/users/POST_claims_body.schema.json`. Identifiers
/// containing `.` or `..` segments are refused and answered as absent so
/// request-derived identifiers can never escape the schema root.
#[derive(Debug, Clone)]
pub struct FsSchemaStore {
    root: PathBuf,
}

impl FsSchemaStore {
    /// Create a store rooted at `root`. The directory does not have to
    /// exist yet; lookups against a missing tree simply answer absent.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The schema root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &SchemaId) -> Option<PathBuf> {
        if id.as_str().split('/').any(|s| s == "." || s == "..") {
            return None;
        }
        let mut path = self.root.clone();
        path.push(format!("{}{SCHEMA_SUFFIX}", id.as_str()));
        Some(path)
    }
}

impl SchemaStore for FsSchemaStore {
    fn load(&self, id: &SchemaId) -> Result<Option<Value>, StoreError> {
        let Some(path) = self.path_for(id) else {
            tracing::warn!(%id, "refused schema lookup with traversal segments");
            return Ok(None);
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    id: id.to_string(),
                    source: e,
                })
            }
        };

        let value = serde_json::from_str(&content).map_err(|e| StoreError::InvalidDocument {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }
}

/// In-memory schema store.
///
/// Backs embedded schema sets and tests. Keys are identifier strings as
/// produced by [`SchemaId::derive`].
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaStore {
    schemas: HashMap<String, Value>,
}

impl StaticSchemaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under `id`, returning the store for chaining.
    pub fn with(mut self, id: &str, schema: Value) -> Self {
        self.schemas.insert(id.to_string(), schema);
        self
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaStore for StaticSchemaStore {
    fn load(&self, id: &SchemaId) -> Result<Option<Value>, StoreError> {
        Ok(self.schemas.get(id.as_str()).cloned())
    }
}
