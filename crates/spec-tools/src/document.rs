//! Canonical in-memory document model.
//!
//! A [`Document`] is one loaded, validated, fully-dereferenced API description
//! (OpenAPI 3.x or Swagger 2.0). The model is typed only where the query
//! engine needs structure; schema nodes, responses, parameters and security
//! schemes stay `serde_json::Value` and pass through queries untouched.
//!
//! Every struct carries a flattened catch-all map so fields the engine never
//! looks at (info, tags, vendor extensions, Swagger 2.0 `definitions`, ...)
//! survive a serialize round-trip byte-identical, in document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One loaded API description. Read-only once registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Version marker for OpenAPI 3.x documents (e.g. "3.0.3").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    /// Version marker for Swagger 2.0 documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,

    /// Base-URL descriptors (3.x only). Opaque to the query engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Value>>,

    /// Path template -> path item, in document order.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Reusable components (3.x).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// Security scheme definitions (Swagger 2.0 location).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_definitions: Option<IndexMap<String, Value>>,

    /// Top-level security requirements (dialect-independent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,

    /// Everything else (info, tags, definitions, x-* extensions, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The `components` section of an OpenAPI 3.x document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Reusable data shapes, keyed by schema name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemas: Option<IndexMap<String, Value>>,

    /// Security scheme definitions (3.x location).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<IndexMap<String, Value>>,

    /// Other component kinds (responses, parameters, examples, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The set of HTTP-method operations defined for one path template.
///
/// Method keys in the wire format are always lowercase; callers go through
/// [`PathItem::operation`] with a parsed [`HttpMethod`] instead of string keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation on this path. Opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Value>>,

    /// Path-level summary/description/servers and extensions.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PathItem {
    /// The operation for one method, if the path defines it.
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Methods present on this path item, in canonical listing order.
    pub fn methods(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .iter()
            .filter_map(|m| self.operation(*m).map(|op| (*m, op)))
    }
}

/// The full description of one HTTP method on one path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Ordered parameter sequence. Opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Value>>,
    /// Request body fragment (3.x). Opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Status code (or `default`) -> response fragment, in document order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, Value>>,
    /// Operation-level security requirements. Opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// operationId, externalDocs, callbacks, extensions, ...
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// HTTP method tokens a path item can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// All methods in the fixed route-listing order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Case-insensitive parse of a caller-supplied method string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    /// The lowercase token used as a path-item key.
    #[must_use]
    pub fn as_lower(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// The uppercase rendering used in query results.
    #[must_use]
    pub fn as_upper(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_upper())
    }
}
