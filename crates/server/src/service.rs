//! The MCP tool surface.
//!
//! Ten tools over one registry: add/list specs, then route, schema and
//! security queries against a named spec. Query failures are normal tool
//! outcomes (`is_error` results carrying the taxonomy message), never protocol
//! faults; a wrong path or a missing schema must not look like a crashed
//! server to the client.

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use speclens_spec_tools::error::{LoadError, QueryResult};
use speclens_spec_tools::loader;
use speclens_spec_tools::query;
use speclens_spec_tools::registry::SpecRegistry;
use std::sync::Arc;

const SPECS_ADD: &str = "openapi:specs:add";
const SPECS_LIST: &str = "openapi:specs:list";
const ROUTES_LIST: &str = "openapi:routes:list";
const ROUTES_RETRIEVE: &str = "openapi:routes:retrieve";
const REQUESTS_RETRIEVE: &str = "openapi:requests:retrieve";
const RESPONSES_RETRIEVE: &str = "openapi:responses:retrieve";
const SCHEMAS_LIST: &str = "openapi:schemas:list";
const SCHEMAS_RETRIEVE: &str = "openapi:schemas:retrieve";
const SECURITY_LIST: &str = "openapi:security:list";
const SECURITY_RETRIEVE: &str = "openapi:security:retrieve";

/// MCP server state: the document registry plus the HTTP client the ingestion
/// boundary uses for URL sources.
#[derive(Clone)]
pub struct SpecServer {
    registry: Arc<SpecRegistry>,
    client: reqwest::Client,
}

impl Default for SpecServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SpecRegistry::new()),
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    /// Load a spec from `source` and register it under `name`.
    ///
    /// # Errors
    ///
    /// Returns the ingestion failure; the registry is left untouched.
    pub async fn load_and_register(&self, name: &str, source: &str) -> Result<(), LoadError> {
        let doc = loader::load_document(&self.client, source).await?;
        self.registry.register(name, doc);
        Ok(())
    }

    async fn dispatch(&self, name: &str, args: JsonObject) -> Result<CallToolResult, ErrorData> {
        match name {
            SPECS_ADD => {
                let args: AddSpecArgs = parse_args(args)?;
                if args.name.is_empty() {
                    return Ok(tool_failure("Spec name must not be empty"));
                }
                match self.load_and_register(&args.name, &args.source).await {
                    Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                        "Successfully loaded API spec '{}' from {}",
                        args.name, args.source
                    ))])),
                    Err(e) => Ok(tool_failure(e.to_string())),
                }
            }
            SPECS_LIST => render(&self.registry.names()),
            ROUTES_LIST => {
                let args: SpecArgs = parse_args(args)?;
                reply(query::list_routes(&self.registry, &args.specs_name))
            }
            ROUTES_RETRIEVE => {
                let args: RouteArgs = parse_args(args)?;
                reply(query::retrieve_route(
                    &self.registry,
                    &args.specs_name,
                    &args.path,
                    &args.method,
                ))
            }
            REQUESTS_RETRIEVE => {
                let args: RouteArgs = parse_args(args)?;
                reply(query::retrieve_request_schema(
                    &self.registry,
                    &args.specs_name,
                    &args.path,
                    &args.method,
                ))
            }
            RESPONSES_RETRIEVE => {
                let args: RouteArgs = parse_args(args)?;
                reply(query::retrieve_response_schema(
                    &self.registry,
                    &args.specs_name,
                    &args.path,
                    &args.method,
                ))
            }
            SCHEMAS_LIST => {
                let args: SpecArgs = parse_args(args)?;
                reply(query::list_schemas(&self.registry, &args.specs_name))
            }
            SCHEMAS_RETRIEVE => {
                let args: SchemaArgs = parse_args(args)?;
                reply(query::retrieve_schema(
                    &self.registry,
                    &args.specs_name,
                    &args.schema_name,
                ))
            }
            SECURITY_LIST => {
                let args: SpecArgs = parse_args(args)?;
                reply(query::list_security(&self.registry, &args.specs_name))
            }
            SECURITY_RETRIEVE => {
                let args: SecurityArgs = parse_args(args)?;
                reply(query::retrieve_security_scheme(
                    &self.registry,
                    &args.specs_name,
                    &args.security_name,
                ))
            }
            other => Err(ErrorData::invalid_params(
                format!("Unknown tool: {other}"),
                None,
            )),
        }
    }
}

#[derive(Deserialize)]
struct AddSpecArgs {
    name: String,
    source: String,
}

#[derive(Deserialize)]
struct SpecArgs {
    specs_name: String,
}

#[derive(Deserialize)]
struct RouteArgs {
    specs_name: String,
    path: String,
    method: String,
}

#[derive(Deserialize)]
struct SchemaArgs {
    specs_name: String,
    schema_name: String,
}

#[derive(Deserialize)]
struct SecurityArgs {
    specs_name: String,
    security_name: String,
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: JsonObject) -> Result<T, ErrorData> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ErrorData::invalid_params(format!("Invalid arguments: {e}"), None))
}

/// Render a successful query result as pretty-printed JSON (two-space
/// indentation, the rendering existing callers rely on).
fn render<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn tool_failure(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

fn reply<T: Serialize>(outcome: QueryResult<T>) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Ok(value) => render(&value),
        Err(e) => Ok(tool_failure(e.to_string())),
    }
}

fn schema(value: Value) -> Arc<JsonObject> {
    let Value::Object(object) = value else {
        return Arc::new(JsonObject::new());
    };
    Arc::new(object)
}

fn spec_name_property() -> Value {
    json!({ "type": "string", "description": "Name of the registered API spec" })
}

fn route_args_schema() -> Arc<JsonObject> {
    schema(json!({
        "type": "object",
        "properties": {
            "specs_name": spec_name_property(),
            "path": {
                "type": "string",
                "description": "Path of the route (e.g., /users, /pets/{petId})"
            },
            "method": {
                "type": "string",
                "description": "HTTP method of the route (GET, POST, PUT, DELETE, ...)"
            }
        },
        "required": ["specs_name", "path", "method"]
    }))
}

fn catalog() -> Vec<Tool> {
    vec![
        Tool::new(
            SPECS_ADD,
            "Load an OpenAPI/Swagger spec (JSON or YAML) from a path or URL and register it under a name.",
            schema(json!({
                "type": "object",
                "properties": {
                    "source": { "type": "string", "description": "Path or URL of the spec file" },
                    "name": { "type": "string", "description": "Unique name to store the spec under" }
                },
                "required": ["source", "name"]
            })),
        ),
        Tool::new(
            SPECS_LIST,
            "List the specs loaded in the registry and ready to inspect.",
            schema(json!({ "type": "object", "properties": {} })),
        ),
        Tool::new(
            ROUTES_LIST,
            "List all routes with their HTTP methods from the named spec.",
            schema(json!({
                "type": "object",
                "properties": { "specs_name": spec_name_property() },
                "required": ["specs_name"]
            })),
        ),
        Tool::new(
            ROUTES_RETRIEVE,
            "Retrieve detailed information about one route from the named spec.",
            route_args_schema(),
        ),
        Tool::new(
            REQUESTS_RETRIEVE,
            "Retrieve the request body schema for one route from the named spec.",
            route_args_schema(),
        ),
        Tool::new(
            RESPONSES_RETRIEVE,
            "Retrieve the response schemas for one route from the named spec.",
            route_args_schema(),
        ),
        Tool::new(
            SCHEMAS_LIST,
            "List all reusable schema names from the named spec.",
            schema(json!({
                "type": "object",
                "properties": { "specs_name": spec_name_property() },
                "required": ["specs_name"]
            })),
        ),
        Tool::new(
            SCHEMAS_RETRIEVE,
            "Retrieve one reusable schema from the named spec.",
            schema(json!({
                "type": "object",
                "properties": {
                    "specs_name": spec_name_property(),
                    "schema_name": { "type": "string", "description": "Name of the schema to retrieve" }
                },
                "required": ["specs_name", "schema_name"]
            })),
        ),
        Tool::new(
            SECURITY_LIST,
            "Get all security requirements, schemes and definitions from the named spec.",
            schema(json!({
                "type": "object",
                "properties": { "specs_name": spec_name_property() },
                "required": ["specs_name"]
            })),
        ),
        Tool::new(
            SECURITY_RETRIEVE,
            "Retrieve one security scheme from the named spec (OpenAPI 3.x schemes take precedence over Swagger 2.0 definitions).",
            schema(json!({
                "type": "object",
                "properties": {
                    "specs_name": spec_name_property(),
                    "security_name": { "type": "string", "description": "Name of the security scheme to retrieve" }
                },
                "required": ["specs_name", "security_name"]
            })),
        ),
    ]
}

impl ServerHandler for SpecServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "speclens".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::default()
            },
            instructions: Some(
                "Register OpenAPI/Swagger specs with openapi:specs:add, then query their \
                 routes, schemas and security definitions with the other tools."
                    .into(),
            ),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: catalog(),
            ..ListToolsResult::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        tracing::debug!(tool = %request.name, "tool call");
        self.dispatch(&request.name, request.arguments.unwrap_or_default())
            .await
    }
}
