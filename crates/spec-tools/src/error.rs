//! Error types for `speclens-spec-tools`.
//!
//! Two separate taxonomies on purpose: [`QueryError`] covers the query
//! engine's not-found outcomes, [`LoadError`] covers ingestion. A caller must
//! be able to tell "the document has no such route" apart from "the document
//! never made it into the registry".

use thiserror::Error;

/// Query engine failures. Every variant names the registry entry (and the
/// path, method or scheme) involved so the rendered message is self-contained.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The given registry name has no resolved document.
    #[error("No API spec found with name: {name}")]
    DocumentNotFound { name: String },

    /// The path is absent from the document's `paths` mapping.
    #[error("Path '{path}' not found in spec: {name}")]
    PathNotFound { name: String, path: String },

    /// The path exists but does not define the requested HTTP method.
    #[error("Method '{method}' not found for path '{path}' in spec: {name}")]
    MethodNotFound {
        name: String,
        path: String,
        method: String,
    },

    /// The addressed operation has no request body.
    #[error("No request body defined for {method} {path} in {name}")]
    NoRequestBody {
        name: String,
        path: String,
        method: String,
    },

    /// The addressed operation has no (or an empty) responses mapping.
    #[error("No responses defined for {method} {path} in {name}")]
    NoResponses {
        name: String,
        path: String,
        method: String,
    },

    /// The document has no `components.schemas` section.
    #[error("No schemas (components.schemas) found in spec: {name}")]
    NoSchemas { name: String },

    /// The named schema is absent from `components.schemas`.
    #[error("No schema found with name: {schema} in spec: {name}")]
    SchemaNotFound { name: String, schema: String },

    /// None of the three security locations is present on the document.
    #[error("No security information found in spec: {name}")]
    NoSecurityInfo { name: String },

    /// The named scheme is absent from both dialect locations.
    #[error("No security scheme found with name: {scheme} in spec: {name}")]
    SecuritySchemeNotFound { name: String, scheme: String },
}

/// Result type alias for query engine operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Ingestion boundary failures. Raised only by [`crate::loader`]; the registry
/// is never populated when one of these occurs.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The spec URL could not be fetched, or the server answered non-2xx.
    #[error("failed to fetch spec from '{url}': {message}")]
    Fetch { url: String, message: String },

    /// The response body could not be read.
    #[error("failed to read spec body from '{url}': {message}")]
    ReadBody { url: String, message: String },

    /// The spec file could not be read.
    #[error("failed to read spec file '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not valid YAML/JSON at all.
    #[error("failed to parse spec from '{location}': {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parses but does not look like OpenAPI 3.x or Swagger 2.0.
    /// Carries the full list of grammar violations.
    #[error("invalid OpenAPI/Swagger document from '{location}': {}", .errors.join("; "))]
    Invalid {
        location: String,
        errors: Vec<String>,
    },

    /// A `$ref` that the boundary cannot inline (external target, dangling
    /// pointer, or reference cycle).
    #[error("cannot dereference '{reference}' in '{location}': {message}")]
    UnresolvedRef {
        location: String,
        reference: String,
        message: String,
    },

    /// The dereferenced value does not fit the canonical document model.
    #[error("spec from '{location}' does not match the document model: {source}")]
    Shape {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for ingestion operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
