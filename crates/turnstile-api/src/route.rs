//! # Route Context
//!
//! Extracts the routing facts the gate consumes from a request: method,
//! the final segment of the path remainder beneath the gate's mount, the
//! raw query string, and the path parameters captured by the router.
//!
//! Path parameters are recovered by aligning the matched route pattern
//! (`/api/v1/users/{userId}/claims`) with the concrete request path, so
//! the gate needs nothing from the router beyond the [`MatchedPath`]
//! extension Axum already records.

use axum::extract::MatchedPath;
use axum::http::request::Parts;

/// Routing facts for one request, as consumed by [`crate::ValidationGate`].
#[derive(Debug, Clone)]
pub struct RouteContext {
    /// HTTP method token, e.g. `POST`.
    pub method: String,
    /// Last non-empty path segment beneath the mount, or empty for an
    /// endpoint at the mount root.
    pub final_segment: String,
    /// Raw query string, if any.
    pub raw_query: Option<String>,
    /// Path parameters in route order: (name, concrete value).
    pub params: Vec<(String, String)>,
}

impl RouteContext {
    /// Derive the context from request parts, relative to `mount`.
    pub fn of(parts: &Parts, mount: &[String]) -> Self {
        let path = parts.uri.path();
        let segments = path_segments(path);
        let remainder = strip_mount(&segments, mount);
        let final_segment = remainder.last().copied().unwrap_or("").to_string();

        let params = parts
            .extensions
            .get::<MatchedPath>()
            .map(|matched| capture_params(matched.as_str(), path))
            .unwrap_or_default();

        Self {
            method: parts.method.as_str().to_string(),
            final_segment,
            raw_query: parts.uri.query().map(str::to_string),
            params,
        }
    }
}

/// Non-empty segments of a path.
fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Drop the mount prefix from the concrete path segments. A path outside
/// the mount is returned whole, so a misconfigured gate still derives a
/// well-defined (if never-matching) identifier instead of panicking.
fn strip_mount<'a>(segments: &[&'a str], mount: &[String]) -> Vec<&'a str> {
    let under_mount =
        mount.len() <= segments.len() && mount.iter().zip(segments).all(|(m, s)| m == s);
    if under_mount {
        segments[mount.len()..].to_vec()
    } else {
        segments.to_vec()
    }
}

/// Align `{name}` segments of the matched route pattern with the concrete
/// path to recover parameter names and values.
fn capture_params(pattern: &str, path: &str) -> Vec<(String, String)> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .zip(path.split('/').filter(|s| !s.is_empty()))
        .filter_map(|(pattern_segment, concrete)| {
            let name = pattern_segment.strip_prefix('{')?.strip_suffix('}')?;
            let name = name.strip_prefix('*').unwrap_or(name);
            Some((name.to_string(), concrete.to_string()))
        })
        .collect()
}
