//! # Validation Gate
//!
//! One gate guards one mounted router group. It owns the group's mount
//! segments and a handle to the process-wide validator cache, and walks
//! the three request partitions in their fixed order, stopping at the
//! first failure.

use std::sync::Arc;

use serde_json::{Map, Value};
use turnstile_schema::{
    check, Partition, PartitionReport, ResolveError, SchemaId, ValidatorCache, Violation,
};

use crate::route::RouteContext;

/// Configuration for one gate instance.
#[derive(Debug, Clone)]
pub struct GateConfig {
    mount: Vec<String>,
    max_body_bytes: usize,
}

impl GateConfig {
    /// Default request-body cap. Oversized bodies are rejected before
    /// validation to bound memory per request.
    pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

    /// Configure a gate mounted at `mount`, e.g. `"/api/v1/admin/users"`.
    /// The mount segments name both the path prefix stripped from incoming
    /// requests and the directory prefix of the group's schemas.
    pub fn new(mount: &str) -> Self {
        Self {
            mount: mount
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Override the request-body cap.
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// The mount segments.
    pub fn mount(&self) -> &[String] {
        &self.mount
    }

    /// The request-body cap in bytes.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

/// Verdict of one pipeline evaluation.
#[derive(Debug)]
pub enum Decision {
    /// Every governed partition passed (or no schema applied); hand the
    /// request to the next handler.
    Proceed,
    /// A partition failed; remaining partitions were not evaluated.
    Reject {
        /// The failing partition.
        partition: Partition,
        /// All violations for that partition.
        violations: Vec<Violation>,
    },
}

/// Request-validation gate for one router group.
///
/// Cheap to clone; gates for different groups share one
/// [`ValidatorCache`] so schema compilation is paid once per process.
#[derive(Debug, Clone)]
pub struct ValidationGate {
    cache: Arc<ValidatorCache>,
    config: GateConfig,
}

impl ValidationGate {
    /// Create a gate over a shared cache.
    pub fn new(cache: Arc<ValidatorCache>, config: GateConfig) -> Self {
        Self { cache, config }
    }

    /// The gate's configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Derive the routing context for a request hitting this gate.
    pub fn context(&self, parts: &axum::http::request::Parts) -> RouteContext {
        RouteContext::of(parts, self.config.mount())
    }

    /// Walk the partitions in order (body, query, params), resolving and
    /// applying each partition's schema. Stops at the first failing
    /// partition. Partition data is only materialized when a schema
    /// actually governs it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] only for storage faults; absence and
    /// malformed definitions are handled inside the cache.
    pub fn evaluate(&self, ctx: &RouteContext, body: &[u8]) -> Result<Decision, ResolveError> {
        for partition in Partition::ALL {
            let id = SchemaId::derive(
                &ctx.method,
                self.config.mount(),
                &ctx.final_segment,
                partition,
            );
            let resolved = self.cache.resolve(&id)?;
            if resolved.is_absent() {
                tracing::debug!(%id, %partition, "no schema for partition, skipping");
                continue;
            }

            let data = match partition {
                Partition::Body => match body_value(body) {
                    Ok(value) => value,
                    Err(violation) => {
                        return Ok(Decision::Reject {
                            partition,
                            violations: vec![violation],
                        })
                    }
                },
                Partition::Query => query_value(ctx.raw_query.as_deref()),
                Partition::Params => params_value(&ctx.params),
            };

            match check(&resolved, &data) {
                PartitionReport::Skipped | PartitionReport::Passed => {}
                PartitionReport::Failed(violations) => {
                    return Ok(Decision::Reject {
                        partition,
                        violations,
                    })
                }
            }
        }
        Ok(Decision::Proceed)
    }
}

/// Parse the buffered body for validation. An empty body validates as an
/// empty object, matching what the surrounding framework hands a handler
/// when no body was sent. Unparseable JSON is a caller error expressed as
/// a violation, not a fault.
fn body_value(body: &[u8]) -> Result<Value, Violation> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| Violation {
        keyword: "body".to_string(),
        path: String::new(),
        message: format!("request body is not valid JSON: {e}"),
    })
}

/// Decode the query string into an object. All scalar values are strings;
/// a key repeated in the query collects its values into an array.
fn query_value(raw: Option<&str>) -> Value {
    let mut map = Map::new();
    let Some(raw) = raw else {
        return Value::Object(map);
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            None => {
                map.insert(key, Value::String(value));
            }
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Value::Object(map)
}

/// Captured path parameters as a string-valued object.
fn params_value(params: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (name, value) in params {
        map.insert(name.clone(), Value::String(value.clone()));
    }
    Value::Object(map)
}
