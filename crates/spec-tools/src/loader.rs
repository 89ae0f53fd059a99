//! Ingestion boundary: fetch, validate and dereference API descriptions.
//!
//! The registry only ever sees documents that came through [`load_document`]:
//! raw bytes are retrieved from a file path or an `http(s)` URL, checked
//! against the OpenAPI/Swagger grammar envelope, and internal `$ref` pointers
//! are inlined so queries never have to chase references.

use crate::document::Document;
use crate::error::{LoadError, LoadResult};
use serde_json::Value;
use std::time::Duration;

/// Whole-request timeout for URL sources. A stalled spec server must fail the
/// tool call, not hang it.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a fetched spec body. Real specs are a few megabytes at most.
const MAX_SPEC_BYTES: usize = 10 * 1024 * 1024;

/// Retrieve, validate and dereference a document from `source`.
pub async fn load_document(client: &reqwest::Client, source: &str) -> LoadResult<Document> {
    let text = load_source(client, source).await?;
    parse_document(source, &text)
}

/// Retrieve the raw spec text from a local path or an `http(s)` URL.
///
/// URL fetches carry a request-level timeout and a bounded body read, so they
/// always terminate with a [`LoadError`] instead of blocking or buffering
/// without limit.
pub async fn load_source(client: &reqwest::Client, source: &str) -> LoadResult<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!(url = %source, "fetching spec");
        let response = client
            .get(source)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| LoadError::Fetch {
                url: source.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch {
                url: source.to_string(),
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown status")
                ),
            });
        }

        read_body_limited(response, source).await
    } else {
        tracing::info!(path = %source, "reading spec file");
        std::fs::read_to_string(source).map_err(|e| LoadError::ReadFile {
            path: source.to_string(),
            source: e,
        })
    }
}

/// Read a response body, streaming in chunks and refusing anything over
/// [`MAX_SPEC_BYTES`].
async fn read_body_limited(mut response: reqwest::Response, url: &str) -> LoadResult<String> {
    let read_error = |message: String| LoadError::ReadBody {
        url: url.to_string(),
        message,
    };

    // Reject up front when the server declares an oversized body.
    if let Some(len) = response.content_length() {
        if len > MAX_SPEC_BYTES as u64 {
            return Err(read_error(format!(
                "spec body of {len} bytes exceeds the {MAX_SPEC_BYTES} byte limit"
            )));
        }
    }

    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| read_error(e.to_string()))?
    {
        if bytes.len() + chunk.len() > MAX_SPEC_BYTES {
            return Err(read_error(format!(
                "spec body exceeds the {MAX_SPEC_BYTES} byte limit"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|e| read_error(e.to_string()))
}

/// Parse, validate and dereference spec text into a [`Document`].
///
/// `location` is only used in error messages.
pub fn parse_document(location: &str, text: &str) -> LoadResult<Document> {
    // JSON is a valid subset of YAML, so serde_yaml alone is enough.
    let raw: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| LoadError::Parse {
            location: location.to_string(),
            source: e,
        })?;
    let value = yaml_to_json(raw);

    validate(location, &value)?;
    let inlined = dereference(location, &value)?;

    serde_json::from_value(inlined).map_err(|e| LoadError::Shape {
        location: location.to_string(),
        source: e,
    })
}

/// Convert a YAML value into JSON, stringifying non-string mapping keys.
/// OpenAPI specs written in YAML routinely use bare status codes (`200:`) as
/// response keys.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().and_then(serde_json::Number::from_f64).map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = serde_json::Map::new();
            for (key, val) in mapping {
                object.insert(yaml_key_to_string(&key), yaml_to_json(val));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Check the OpenAPI/Swagger grammar envelope, collecting every violation.
fn validate(location: &str, value: &Value) -> LoadResult<()> {
    let Some(root) = value.as_object() else {
        return Err(LoadError::Invalid {
            location: location.to_string(),
            errors: vec!["document is not a mapping".to_string()],
        });
    };

    let mut errors = Vec::new();

    match (root.get("openapi"), root.get("swagger")) {
        (Some(Value::String(v)), _) if v.starts_with("3.") => {}
        (Some(v), _) => errors.push(format!(
            "'openapi' must be a 3.x version string, got {v}"
        )),
        (None, Some(Value::String(v))) if v == "2.0" => {}
        (None, Some(v)) => errors.push(format!("'swagger' must be \"2.0\", got {v}")),
        (None, None) => {
            errors.push("missing version marker: expected 'openapi: 3.x' or 'swagger: 2.0'".to_string());
        }
    }

    match root.get("paths") {
        Some(Value::Object(_)) => {}
        Some(_) => errors.push("'paths' is not a mapping".to_string()),
        None => errors.push("missing 'paths' mapping".to_string()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Invalid {
            location: location.to_string(),
            errors,
        })
    }
}

/// Inline every internal `#/...` reference in the document.
///
/// Resolution walks the tree depth-first; the stack of in-flight references
/// catches cycles, and anything that is not an internal pointer (external
/// files, URLs, dangling targets) is an error rather than a silently kept
/// `$ref`: the boundary promises a fully inlined document.
fn dereference(location: &str, root: &Value) -> LoadResult<Value> {
    let mut stack = Vec::new();
    inline(location, root, root, &mut stack)
}

fn inline(
    location: &str,
    root: &Value,
    value: &Value,
    stack: &mut Vec<String>,
) -> LoadResult<Value> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let target = lookup_ref(location, root, reference)?;
                if stack.iter().any(|r| r == reference) {
                    return Err(LoadError::UnresolvedRef {
                        location: location.to_string(),
                        reference: reference.clone(),
                        message: "reference cycle".to_string(),
                    });
                }
                stack.push(reference.clone());
                let resolved = inline(location, root, target, stack)?;
                stack.pop();
                return Ok(resolved);
            }

            let mut object = serde_json::Map::new();
            for (key, val) in map {
                object.insert(key.clone(), inline(location, root, val, stack)?);
            }
            Ok(Value::Object(object))
        }
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .map(|item| inline(location, root, item, stack))
                .collect::<LoadResult<_>>()?,
        )),
        other => Ok(other.clone()),
    }
}

fn lookup_ref<'a>(location: &str, root: &'a Value, reference: &str) -> LoadResult<&'a Value> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(LoadError::UnresolvedRef {
            location: location.to_string(),
            reference: reference.to_string(),
            message: "only internal '#/...' references can be inlined".to_string(),
        });
    };

    root.pointer(pointer).ok_or_else(|| LoadError::UnresolvedRef {
        location: location.to_string(),
        reference: reference.to_string(),
        message: "pointer target does not exist".to_string(),
    })
}
