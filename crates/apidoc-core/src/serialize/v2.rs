//! Swagger 2.0 rendition of an [`ApiDocument`].

use apidoc_host::{
    ApiDocument, HttpMethod, Info, MediaType, Operation, ParameterLocation, RequestBody, Tag,
    COMPONENT_SCHEMA_REF_PREFIX,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Version written to the `swagger` field.
pub const SWAGGER_VERSION: &str = "2.0";

const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";

const FORM_MEDIA_TYPES: &[&str] = &["application/x-www-form-urlencoded", "multipart/form-data"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    pub swagger: &'static str,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    pub paths: BTreeMap<String, BTreeMap<HttpMethod, SwaggerOperation>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerOperation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<SwaggerParameter>,
    pub responses: BTreeMap<String, SwaggerResponse>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// A parameter. Body parameters carry `schema`; all others carry their
/// type inline (`type`, `format`, `items`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwaggerParameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(flatten)]
    pub inline: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwaggerResponse {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl SwaggerDocument {
    pub fn from_document(document: &ApiDocument) -> Self {
        let converter = Converter {
            schemas: &document.components.schemas,
        };

        let (scheme, host, base_path) = document
            .servers
            .first()
            .map(|server| split_server_url(&server.url))
            .unwrap_or_default();

        let mut paths = BTreeMap::new();
        for (path, item) in &document.paths {
            let operations: BTreeMap<HttpMethod, SwaggerOperation> = item
                .iter()
                .filter(|(method, operation)| {
                    let supported = **method != HttpMethod::Trace;
                    if !supported {
                        warn!(
                            path = %path,
                            operation_id = operation.operation_id.as_deref().unwrap_or(""),
                            "Swagger 2.0 has no trace operations; operation omitted"
                        );
                    }
                    supported
                })
                .map(|(method, operation)| (*method, converter.operation(operation)))
                .collect();
            if !operations.is_empty() {
                paths.insert(path.clone(), operations);
            }
        }

        let consumes = hoist(&mut paths, |op| &mut op.consumes);
        let produces = hoist(&mut paths, |op| &mut op.produces);

        Self {
            swagger: SWAGGER_VERSION,
            info: document.info.clone(),
            host,
            base_path,
            schemes: scheme.into_iter().collect(),
            consumes,
            produces,
            paths,
            definitions: document
                .components
                .schemas
                .iter()
                .map(|(name, schema)| (name.clone(), rewrite_schema(schema)))
                .collect(),
            tags: document.tags.clone(),
        }
    }
}

/// Split a server URL into scheme, host and base path.
///
/// `https://api.example.com/v1` gives all three, `api.example.com` only a
/// host and `/v1` only a base path.
pub fn split_server_url(url: &str) -> (Option<String>, Option<String>, Option<String>) {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
        None => (None, url),
    };
    let (host, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };

    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    (scheme, non_empty(host), non_empty(path))
}

/// Move media types to the document level when every operation declares the
/// same non-empty set. Document-level types apply to every operation, so a
/// single operation without them keeps all sets where they are.
fn hoist<F>(paths: &mut BTreeMap<String, BTreeMap<HttpMethod, SwaggerOperation>>, field: F) -> Vec<String>
where
    F: Fn(&mut SwaggerOperation) -> &mut Vec<String>,
{
    let mut sets = paths
        .values_mut()
        .flat_map(|item| item.values_mut())
        .map(|op| field(op).clone());

    let Some(first) = sets.next() else {
        return Vec::new();
    };
    if first.is_empty() || !sets.all(|types| types == first) {
        return Vec::new();
    }

    for op in paths.values_mut().flat_map(|item| item.values_mut()) {
        field(op).clear();
    }
    first
}

struct Converter<'a> {
    schemas: &'a BTreeMap<String, Value>,
}

impl Converter<'_> {
    fn operation(&self, operation: &Operation) -> SwaggerOperation {
        let mut parameters: Vec<SwaggerParameter> = operation
            .parameters
            .iter()
            .map(|parameter| {
                let schema = parameter.schema.as_ref().map(|schema| self.resolve(schema));
                SwaggerParameter {
                    name: parameter.name.clone(),
                    location: location_name(parameter.location),
                    required: parameter.required,
                    description: parameter.description.clone(),
                    schema: None,
                    inline: inline_schema(schema.as_ref()),
                }
            })
            .collect();

        let mut consumes = Vec::new();
        if let Some(body) = &operation.request_body {
            consumes = body.content.keys().cloned().collect();
            parameters.extend(self.body_parameters(body));
        }

        let produces: BTreeSet<String> = operation
            .responses
            .values()
            .flat_map(|response| response.content.keys().cloned())
            .collect();

        let responses = operation
            .responses
            .iter()
            .map(|(status, response)| {
                let schema = preferred_media_type(&response.content)
                    .and_then(|media| media.schema.as_ref())
                    .map(rewrite_schema);
                (
                    status.clone(),
                    SwaggerResponse {
                        description: response.description.clone(),
                        schema,
                    },
                )
            })
            .collect();

        SwaggerOperation {
            tags: operation.tags.clone(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            operation_id: operation.operation_id.clone(),
            consumes,
            produces: produces.into_iter().collect(),
            parameters,
            responses,
            deprecated: operation.deprecated,
        }
    }

    /// A request body becomes one `body` parameter, or one `formData`
    /// parameter per property when the body is a form.
    fn body_parameters(&self, body: &RequestBody) -> Vec<SwaggerParameter> {
        let form = FORM_MEDIA_TYPES
            .iter()
            .find_map(|media_type| body.content.get(*media_type))
            .and_then(|media| media.schema.as_ref())
            .map(|schema| self.resolve(schema));

        if let Some(Value::Object(form)) = &form {
            if let Some(Value::Object(properties)) = form.get("properties") {
                let required: BTreeSet<&str> = form
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| names.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();

                return properties
                    .iter()
                    .map(|(name, schema)| {
                        let schema = self.resolve(schema);
                        SwaggerParameter {
                            name: name.clone(),
                            location: "formData",
                            required: required.contains(name.as_str()),
                            description: schema
                                .get("description")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            schema: None,
                            inline: inline_schema(Some(&schema)),
                        }
                    })
                    .collect();
            }
        }

        let schema = preferred_media_type(&body.content)
            .and_then(|media| media.schema.as_ref())
            .map(rewrite_schema);
        vec![SwaggerParameter {
            name: "body".to_string(),
            location: "body",
            required: body.required,
            description: body.description.clone(),
            schema,
            inline: Map::new(),
        }]
    }

    /// Follow a component reference, since inline parameters cannot
    /// reference definitions.
    fn resolve(&self, schema: &Value) -> Value {
        schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| reference.strip_prefix(COMPONENT_SCHEMA_REF_PREFIX))
            .and_then(|name| self.schemas.get(name))
            .unwrap_or(schema)
            .clone()
    }
}

fn location_name(location: ParameterLocation) -> &'static str {
    match location {
        ParameterLocation::Query => "query",
        ParameterLocation::Header => "header",
        ParameterLocation::Path => "path",
        // Swagger 2 has no cookie parameters; the closest carrier is a header.
        ParameterLocation::Cookie => "header",
    }
}

fn inline_schema(schema: Option<&Value>) -> Map<String, Value> {
    match schema.map(rewrite_schema) {
        Some(Value::Object(mut fields)) => {
            fields.remove("description");
            fields
        }
        _ => Map::new(),
    }
}

fn preferred_media_type(content: &BTreeMap<String, MediaType>) -> Option<&MediaType> {
    content
        .get("application/json")
        .or_else(|| content.values().next())
}

/// Rewrite a schema for Swagger 2: component references point at
/// `#/definitions/` and the `nullable` keyword becomes `x-nullable`.
///
/// Only keyword positions are rewritten. Property names and the values of
/// `example`, `default` and `enum` pass through untouched.
pub fn rewrite_schema(schema: &Value) -> Value {
    let Value::Object(fields) = schema else {
        return schema.clone();
    };

    Value::Object(
        fields
            .iter()
            .map(|(key, value)| match key.as_str() {
                "$ref" => (key.clone(), rewrite_reference(value)),
                "nullable" => ("x-nullable".to_string(), value.clone()),
                "properties" | "patternProperties" | "definitions" => {
                    (key.clone(), rewrite_schema_map(value))
                }
                "items" | "additionalProperties" | "not" | "allOf" | "anyOf" | "oneOf" => {
                    (key.clone(), rewrite_subschemas(value))
                }
                _ => (key.clone(), value.clone()),
            })
            .collect(),
    )
}

fn rewrite_reference(reference: &Value) -> Value {
    match reference
        .as_str()
        .and_then(|reference| reference.strip_prefix(COMPONENT_SCHEMA_REF_PREFIX))
    {
        Some(name) => Value::String(format!("{DEFINITIONS_REF_PREFIX}{name}")),
        None => reference.clone(),
    }
}

/// A single schema or an array of schemas (`allOf`, tuple `items`).
fn rewrite_subschemas(value: &Value) -> Value {
    match value {
        Value::Array(schemas) => Value::Array(schemas.iter().map(rewrite_schema).collect()),
        schema => rewrite_schema(schema),
    }
}

/// A map from names to schemas; the names are kept as they are.
fn rewrite_schema_map(value: &Value) -> Value {
    match value {
        Value::Object(schemas) => Value::Object(
            schemas
                .iter()
                .map(|(name, schema)| (name.clone(), rewrite_schema(schema)))
                .collect(),
        ),
        other => other.clone(),
    }
}
