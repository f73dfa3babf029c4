//! # Schema Locator
//!
//! Derives the identifier of the schema that governs one partition of one
//! endpoint. The derivation is pure and deterministic: the same
//! (method, route, final segment, partition) always yields the same
//! identifier, which is what makes the validator cache correct.
//!
//! Identifiers mirror the storage namespace: the mounted route segments
//! become directories and the leaf name follows the
//! `<METHOD>_<final>_<partition>` convention, e.g.
//! `api/v1/admin/users/POST_claims_body`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three independently validated parts of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// The parsed request body.
    Body,
    /// The query-string key-value pairs.
    Query,
    /// The path parameters captured by the router.
    Params,
}

impl Partition {
    /// Evaluation order per request. Fixed: body, then query, then params.
    pub const ALL: [Partition; 3] = [Partition::Body, Partition::Query, Partition::Params];

    /// The partition token used in identifiers and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic key locating the schema definition for one
/// (endpoint, partition) pair.
///
/// The inner string is a relative, `/`-separated path into the schema
/// namespace. It never starts with `/` and never contains empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaId(String);

impl SchemaId {
    /// Derive the identifier for `(method, route, final_segment, partition)`.
    ///
    /// `method` is upper-cased; empty route segments are dropped. An empty
    /// `final_segment` (endpoint mounted at the route root) is legal and
    /// produces the empty token, e.g. `POST__body`, so the identifier stays
    /// well-defined without colliding with any real path segment.
    pub fn derive<S: AsRef<str>>(
        method: &str,
        route: &[S],
        final_segment: &str,
        partition: Partition,
    ) -> Self {
        let mut path = String::new();
        for segment in route {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            path.push_str(segment);
            path.push('/');
        }
        path.push_str(&method.to_ascii_uppercase());
        path.push('_');
        path.push_str(final_segment);
        path.push('_');
        path.push_str(partition.as_str());
        Self(path)
    }

    /// The identifier as a relative path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
