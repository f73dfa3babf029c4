//! # turnstile-schema — Schema Resolution & Validation Core
//!
//! The framework-independent half of the turnstile request gate. Derives
//! deterministic schema identifiers from routing facts, loads schema
//! definitions from a pluggable store, compiles them once into reusable
//! validators, and checks one partition of request data at a time.
//!
//! ## Components
//!
//! - [`locator`] — [`SchemaId`] derivation from
//!   (method, route segments, final segment, partition). Pure, no I/O.
//! - [`store`] — the [`SchemaStore`] lookup seam with filesystem-backed
//!   and in-memory implementations.
//! - [`cache`] — [`ValidatorCache`], the process-lifetime memoization of
//!   identifier to compiled validator (or an explicit absence marker).
//! - [`check`] — runs one resolved validator over one partition value and
//!   collects every violation, not just the first.
//!
//! ## Degrade Policy
//!
//! A schema definition that fails to parse or compile is logged as an
//! operator error, counted on `turnstile_schema_compile_failures_total`,
//! and cached as absent. One broken schema file must never take down the
//! endpoints around it; the counter exists so the condition cannot go
//! unnoticed.
//!
//! ## Crate Policy
//!
//! - No HTTP types. Everything here operates on strings, paths, and
//!   `serde_json::Value`.
//! - The cache is the only shared mutable state, and its lock is never
//!   held across schema loading or compilation.

pub mod cache;
pub mod check;
pub mod locator;
pub mod store;

pub use cache::{Resolved, ResolveError, ValidatorCache};
pub use check::{check, PartitionReport, Violation};
pub use locator::{Partition, SchemaId};
pub use store::{FsSchemaStore, SchemaStore, StaticSchemaStore, StoreError};
