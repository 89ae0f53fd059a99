//! Read-only queries over registered documents.
//!
//! Every operation resolves the registry name first and answers with a typed
//! [`QueryError`] instead of panicking or bubbling an opaque fault. Operations
//! never mutate a document; payload fragments (schemas, responses, security
//! schemes) are selected, not transformed.
//!
//! Dialect handling: security lookups probe the OpenAPI 3.x location
//! (`components.securitySchemes`) before the Swagger 2.0 location
//! (`securityDefinitions`). Schema lookups read `components.schemas` only;
//! Swagger 2.0 `definitions` deliberately get no such fallback.

use crate::document::{Document, HttpMethod, Operation};
use crate::error::{QueryError, QueryResult};
use crate::registry::SpecRegistry;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One entry in a route listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub http_method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full detail for one operation, with absent optional fields omitted when
/// rendered. The struct is always fully populated; omission happens at
/// serialization time only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetail {
    pub path: String,
    /// Uppercase method token.
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    pub responses: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub deprecated: bool,
}

/// Request body fragment for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSchema {
    pub path: String,
    pub method: String,
    pub request_body: Value,
}

/// Responses mapping for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSchemas {
    pub path: String,
    pub method: String,
    pub responses: IndexMap<String, Value>,
}

/// Union projection of a document's security information.
///
/// Deliberately not normalized to one shape: the two dialects are structurally
/// different and callers must handle both. A field is present only when the
/// document defines it non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<IndexMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_definitions: Option<IndexMap<String, Value>>,
}

fn resolve_doc(registry: &SpecRegistry, name: &str) -> QueryResult<Arc<Document>> {
    registry.resolve(name).ok_or_else(|| {
        tracing::debug!(spec = %name, "query against unknown spec");
        QueryError::DocumentNotFound {
            name: name.to_string(),
        }
    })
}

/// Resolve `path` + caller-supplied `method` down to one operation.
///
/// The method string is case-folded before lookup; an unrecognized token is
/// reported the same way as a recognized-but-absent one, so the caller can
/// always distinguish "no such path" from "path exists, wrong verb".
fn resolve_operation<'a>(
    doc: &'a Document,
    name: &str,
    path: &str,
    method: &str,
) -> QueryResult<(HttpMethod, &'a Operation)> {
    let item = doc.paths.get(path).ok_or_else(|| QueryError::PathNotFound {
        name: name.to_string(),
        path: path.to_string(),
    })?;

    let method_not_found = || QueryError::MethodNotFound {
        name: name.to_string(),
        path: path.to_string(),
        method: method.to_string(),
    };
    let parsed = HttpMethod::parse(method).ok_or_else(method_not_found)?;
    let operation = item.operation(parsed).ok_or_else(method_not_found)?;
    Ok((parsed, operation))
}

/// List every route the document defines, in path-then-method order.
///
/// Paths come out in document order; within a path, methods follow the fixed
/// order `get, put, post, delete, options, head, patch, trace`. A path with no
/// methods contributes nothing.
pub fn list_routes(registry: &SpecRegistry, name: &str) -> QueryResult<Vec<RouteSummary>> {
    let doc = resolve_doc(registry, name)?;

    let mut routes = Vec::new();
    for (path, item) in &doc.paths {
        for (method, operation) in item.methods() {
            routes.push(RouteSummary {
                http_method: method.as_upper().to_string(),
                path: path.clone(),
                summary: operation.summary.clone(),
                description: operation.description.clone(),
            });
        }
    }
    Ok(routes)
}

/// Retrieve the full detail of one route.
pub fn retrieve_route(
    registry: &SpecRegistry,
    name: &str,
    path: &str,
    method: &str,
) -> QueryResult<RouteDetail> {
    let doc = resolve_doc(registry, name)?;
    let (parsed, operation) = resolve_operation(&doc, name, path, method)?;

    Ok(RouteDetail {
        path: path.to_string(),
        method: parsed.as_upper().to_string(),
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        parameters: operation.parameters.clone().unwrap_or_default(),
        request_body: operation.request_body.clone(),
        responses: operation.responses.clone().unwrap_or_default(),
        security: operation.security.clone(),
        tags: operation.tags.clone(),
        deprecated: operation.deprecated.unwrap_or(false),
    })
}

/// Retrieve the request body fragment of one route.
pub fn retrieve_request_schema(
    registry: &SpecRegistry,
    name: &str,
    path: &str,
    method: &str,
) -> QueryResult<RequestSchema> {
    let doc = resolve_doc(registry, name)?;
    let (parsed, operation) = resolve_operation(&doc, name, path, method)?;

    let request_body = operation
        .request_body
        .clone()
        .ok_or_else(|| QueryError::NoRequestBody {
            name: name.to_string(),
            path: path.to_string(),
            method: parsed.as_upper().to_string(),
        })?;

    Ok(RequestSchema {
        path: path.to_string(),
        method: parsed.as_upper().to_string(),
        request_body,
    })
}

/// Retrieve the responses mapping of one route.
pub fn retrieve_response_schema(
    registry: &SpecRegistry,
    name: &str,
    path: &str,
    method: &str,
) -> QueryResult<ResponseSchemas> {
    let doc = resolve_doc(registry, name)?;
    let (parsed, operation) = resolve_operation(&doc, name, path, method)?;

    let responses = operation
        .responses
        .clone()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| QueryError::NoResponses {
            name: name.to_string(),
            path: path.to_string(),
            method: parsed.as_upper().to_string(),
        })?;

    Ok(ResponseSchemas {
        path: path.to_string(),
        method: parsed.as_upper().to_string(),
        responses,
    })
}

fn schemas(doc: &Document) -> Option<&IndexMap<String, Value>> {
    doc.components.as_ref()?.schemas.as_ref()
}

/// List the names of the document's reusable schemas, in document order.
pub fn list_schemas(registry: &SpecRegistry, name: &str) -> QueryResult<Vec<String>> {
    let doc = resolve_doc(registry, name)?;
    let schemas = schemas(&doc).ok_or_else(|| QueryError::NoSchemas {
        name: name.to_string(),
    })?;
    Ok(schemas.keys().cloned().collect())
}

/// Retrieve one reusable schema by name.
pub fn retrieve_schema(
    registry: &SpecRegistry,
    name: &str,
    schema_name: &str,
) -> QueryResult<Value> {
    let doc = resolve_doc(registry, name)?;
    schemas(&doc)
        .and_then(|s| s.get(schema_name))
        .cloned()
        .ok_or_else(|| QueryError::SchemaNotFound {
            name: name.to_string(),
            schema: schema_name.to_string(),
        })
}

/// Gather the document's security information across both dialects.
pub fn list_security(registry: &SpecRegistry, name: &str) -> QueryResult<SecurityOverview> {
    let doc = resolve_doc(registry, name)?;

    let overview = SecurityOverview {
        security: doc.security.clone().filter(|s| !s.is_empty()),
        security_schemes: doc
            .components
            .as_ref()
            .and_then(|c| c.security_schemes.clone())
            .filter(|s| !s.is_empty()),
        security_definitions: doc.security_definitions.clone().filter(|s| !s.is_empty()),
    };

    if overview == SecurityOverview::default() {
        return Err(QueryError::NoSecurityInfo {
            name: name.to_string(),
        });
    }
    Ok(overview)
}

/// Retrieve one security scheme by name.
///
/// Probe order is fixed: `components.securitySchemes` (3.x) first, then
/// `securityDefinitions` (Swagger 2.0). A malformed document defining the same
/// name in both places resolves to the 3.x value.
pub fn retrieve_security_scheme(
    registry: &SpecRegistry,
    name: &str,
    scheme_name: &str,
) -> QueryResult<Value> {
    let doc = resolve_doc(registry, name)?;

    let probes = [
        doc.components
            .as_ref()
            .and_then(|c| c.security_schemes.as_ref()),
        doc.security_definitions.as_ref(),
    ];
    probes
        .into_iter()
        .flatten()
        .find_map(|location| location.get(scheme_name))
        .cloned()
        .ok_or_else(|| QueryError::SecuritySchemeNotFound {
            name: name.to_string(),
            scheme: scheme_name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with(name: &str, doc: Value) -> SpecRegistry {
        let registry = SpecRegistry::new();
        registry.register(name, serde_json::from_value(doc).unwrap());
        registry
    }

    fn petstore() -> SpecRegistry {
        registry_with(
            "petstore",
            json!({
                "openapi": "3.0.3",
                "info": { "title": "Pets", "version": "1.0.0" },
                "paths": {
                    "/pets": {
                        "get": {
                            "summary": "List pets",
                            "responses": { "200": { "description": "ok" } }
                        },
                        "post": {
                            "requestBody": {
                                "content": { "application/json": { "schema": { "type": "object" } } }
                            },
                            "responses": { "201": { "description": "created" } }
                        }
                    },
                    "/pets/{id}": {
                        "get": {
                            "deprecated": true,
                            "tags": ["pets"],
                            "parameters": [ { "name": "id", "in": "path", "required": true } ],
                            "responses": { "200": { "description": "one pet" } }
                        }
                    }
                },
                "components": {
                    "schemas": {
                        "Pet": { "type": "object", "properties": { "name": { "type": "string" } } }
                    },
                    "securitySchemes": {
                        "bearer": { "type": "http", "scheme": "bearer" }
                    }
                }
            }),
        )
    }

    #[test]
    fn test_unknown_spec_is_document_not_found() {
        let registry = petstore();
        let err = list_routes(&registry, "nope").unwrap_err();
        assert!(matches!(err, QueryError::DocumentNotFound { .. }));
        assert_eq!(err.to_string(), "No API spec found with name: nope");
    }

    #[test]
    fn test_list_routes_path_then_method_order() {
        let registry = petstore();
        let routes = list_routes(&registry, "petstore").unwrap();
        let rendered: Vec<String> = routes
            .iter()
            .map(|r| format!("{} {}", r.http_method, r.path))
            .collect();
        assert_eq!(rendered, vec!["GET /pets", "POST /pets", "GET /pets/{id}"]);
        assert_eq!(routes[0].summary.as_deref(), Some("List pets"));
    }

    #[test]
    fn test_list_routes_skips_pathless_methods() {
        let registry = registry_with(
            "empty",
            json!({
                "openapi": "3.0.0",
                "paths": { "/nothing": { "parameters": [] } }
            }),
        );
        assert!(list_routes(&registry, "empty").unwrap().is_empty());
    }

    #[test]
    fn test_retrieve_route_is_method_case_insensitive() {
        let registry = petstore();
        let lower = retrieve_route(&registry, "petstore", "/pets", "get").unwrap();
        let upper = retrieve_route(&registry, "petstore", "/pets", "GET").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.method, "GET");
    }

    #[test]
    fn test_retrieve_route_defaults() {
        let registry = petstore();
        let detail = retrieve_route(&registry, "petstore", "/pets", "get").unwrap();
        assert!(detail.parameters.is_empty());
        assert!(!detail.deprecated);

        let deprecated = retrieve_route(&registry, "petstore", "/pets/{id}", "get").unwrap();
        assert!(deprecated.deprecated);
        assert_eq!(deprecated.tags.as_deref(), Some(&["pets".to_string()][..]));
    }

    #[test]
    fn test_retrieve_route_omits_absent_fields_when_rendered() {
        let registry = petstore();
        let detail = retrieve_route(&registry, "petstore", "/pets", "get").unwrap();
        let rendered = serde_json::to_value(&detail).unwrap();

        let keys: Vec<&str> = rendered
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert!(keys.contains(&"summary"));
        assert!(!keys.contains(&"requestBody"));
        assert!(!keys.contains(&"security"));
        assert!(!keys.contains(&"tags"));
        // Defaults stay present even when the source omitted them.
        assert!(keys.contains(&"parameters"));
        assert!(keys.contains(&"deprecated"));
    }

    #[test]
    fn test_path_and_method_misses_are_distinct() {
        let registry = petstore();
        assert!(matches!(
            retrieve_route(&registry, "petstore", "/cats", "get"),
            Err(QueryError::PathNotFound { .. })
        ));
        assert!(matches!(
            retrieve_route(&registry, "petstore", "/pets", "delete"),
            Err(QueryError::MethodNotFound { .. })
        ));
        // An unrecognized verb is a method miss on an existing path, not a fault.
        assert!(matches!(
            retrieve_route(&registry, "petstore", "/pets", "fetch"),
            Err(QueryError::MethodNotFound { .. })
        ));
    }

    #[test]
    fn test_retrieve_request_schema() {
        let registry = petstore();
        let req = retrieve_request_schema(&registry, "petstore", "/pets", "POST").unwrap();
        assert_eq!(req.method, "POST");
        assert!(req.request_body.get("content").is_some());

        assert!(matches!(
            retrieve_request_schema(&registry, "petstore", "/pets", "get"),
            Err(QueryError::NoRequestBody { .. })
        ));
    }

    #[test]
    fn test_retrieve_response_schema() {
        let registry = petstore();
        let resp = retrieve_response_schema(&registry, "petstore", "/pets", "get").unwrap();
        assert_eq!(resp.responses.len(), 1);
        assert!(resp.responses.contains_key("200"));
    }

    #[test]
    fn test_empty_responses_mapping_is_no_responses() {
        let registry = registry_with(
            "bare",
            json!({
                "openapi": "3.0.0",
                "paths": { "/x": { "get": { "responses": {} } } }
            }),
        );
        assert!(matches!(
            retrieve_response_schema(&registry, "bare", "/x", "get"),
            Err(QueryError::NoResponses { .. })
        ));
    }

    #[test]
    fn test_list_and_retrieve_schemas() {
        let registry = petstore();
        assert_eq!(list_schemas(&registry, "petstore").unwrap(), vec!["Pet"]);

        let err = retrieve_schema(&registry, "petstore", "Missing").unwrap_err();
        assert!(matches!(err, QueryError::SchemaNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "No schema found with name: Missing in spec: petstore"
        );
    }

    #[test]
    fn test_schema_round_trips_untouched() {
        let fragment = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "integer", "minimum": 0 }
            }
        });
        let registry = registry_with(
            "spec",
            json!({
                "openapi": "3.0.0",
                "paths": {},
                "components": { "schemas": { "Pet": fragment } }
            }),
        );

        let retrieved = retrieve_schema(&registry, "spec", "Pet").unwrap();
        assert_eq!(
            serde_json::to_string(&retrieved).unwrap(),
            serde_json::to_string(&fragment).unwrap()
        );
    }

    #[test]
    fn test_no_schema_section_is_no_schemas() {
        let registry = registry_with(
            "bare",
            json!({ "openapi": "3.0.0", "paths": {} }),
        );
        assert!(matches!(
            list_schemas(&registry, "bare"),
            Err(QueryError::NoSchemas { .. })
        ));
        // Retrieval through the same gap reports the schema, not the section.
        assert!(matches!(
            retrieve_schema(&registry, "bare", "Pet"),
            Err(QueryError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_swagger_definitions_get_no_schema_fallback() {
        // Swagger 2.0 keeps reusable shapes under `definitions`; schema lookups
        // intentionally do not probe it.
        let registry = registry_with(
            "legacy",
            json!({
                "swagger": "2.0",
                "paths": {},
                "definitions": { "Pet": { "type": "object" } }
            }),
        );
        assert!(matches!(
            list_schemas(&registry, "legacy"),
            Err(QueryError::NoSchemas { .. })
        ));
    }

    #[test]
    fn test_list_security_swagger_only() {
        let registry = registry_with(
            "legacy",
            json!({
                "swagger": "2.0",
                "paths": {},
                "securityDefinitions": { "api_key": { "type": "apiKey", "in": "header", "name": "X-Key" } }
            }),
        );

        let overview = list_security(&registry, "legacy").unwrap();
        assert!(overview.security.is_none());
        assert!(overview.security_schemes.is_none());
        let defs = overview.security_definitions.unwrap();
        assert!(defs.contains_key("api_key"));
    }

    #[test]
    fn test_list_security_ignores_empty_sections() {
        let registry = registry_with(
            "hollow",
            json!({
                "openapi": "3.0.0",
                "paths": {},
                "security": [],
                "components": { "securitySchemes": {} }
            }),
        );
        assert!(matches!(
            list_security(&registry, "hollow"),
            Err(QueryError::NoSecurityInfo { .. })
        ));
    }

    #[test]
    fn test_security_scheme_probe_prefers_openapi3_location() {
        let registry = registry_with(
            "both",
            json!({
                "openapi": "3.0.0",
                "paths": {},
                "components": {
                    "securitySchemes": { "auth": { "type": "http", "scheme": "bearer" } }
                },
                "securityDefinitions": { "auth": { "type": "basic" } }
            }),
        );

        let scheme = retrieve_security_scheme(&registry, "both", "auth").unwrap();
        assert_eq!(scheme["type"], json!("http"));
    }

    #[test]
    fn test_security_scheme_falls_back_to_swagger_location() {
        let registry = registry_with(
            "legacy",
            json!({
                "swagger": "2.0",
                "paths": {},
                "securityDefinitions": { "basic": { "type": "basic" } }
            }),
        );

        let scheme = retrieve_security_scheme(&registry, "legacy", "basic").unwrap();
        assert_eq!(scheme["type"], json!("basic"));

        assert!(matches!(
            retrieve_security_scheme(&registry, "legacy", "oauth"),
            Err(QueryError::SecuritySchemeNotFound { .. })
        ));
    }
}
