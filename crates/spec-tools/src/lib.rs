//! OpenAPI/Swagger document registry and query engine.
//!
//! This crate is the transport-free core of speclens:
//! - [`registry`] holds loaded documents under caller-chosen names.
//! - [`query`] answers structured read-only questions about one document
//!   (routes, schemas, security), smoothing over the OpenAPI 3.x / Swagger 2.0
//!   dialect differences.
//! - [`loader`] is the ingestion boundary: it fetches, validates and
//!   dereferences a document before it ever reaches the registry.
//!
//! It intentionally contains **no** MCP or HTTP-serving logic; that lives in
//! `speclens-server`.

pub mod document;
pub mod error;
pub mod loader;
pub mod query;
pub mod registry;
