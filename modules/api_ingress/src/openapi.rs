//! OpenAPI 3.1 document assembled from the operations and schemas modules
//! reported during the REST phase.

use std::collections::BTreeMap;

use modkit::api::{OperationSpec, ParamLocation};
use serde_json::{json, Map, Value};
use utoipa::openapi::{schema::Schema, RefOr};

#[derive(Debug, Clone, Default)]
pub struct ComponentsRegistry {
    pub schemas: BTreeMap<String, RefOr<Schema>>,
}

#[derive(serde::Serialize)]
pub struct OpenApi {
    pub openapi: &'static str,
    pub info: OpenApiInfo,
    pub paths: Value,
    pub components: OpenApiComponents,
}

#[derive(serde::Serialize)]
pub struct OpenApiInfo {
    pub title: &'static str,
    pub version: String,
    pub description: Option<&'static str>,
}

#[derive(serde::Serialize, Default)]
pub struct OpenApiComponents {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Value>,
    #[serde(rename = "securitySchemes")]
    pub security_schemes: BTreeMap<String, Value>,
}

pub const BEARER_SCHEME: &str = "bearerAuth";

fn make_schema(components: &ComponentsRegistry, content_type: &str, name: Option<&str>) -> Value {
    if let Some(name) = name.filter(|n| components.schemas.contains_key(*n)) {
        return json!({ "$ref": format!("#/components/schemas/{name}") });
    }
    match content_type {
        "application/json" => json!({ "type": "object" }),
        "text/plain" | "text/html" => json!({ "type": "string" }),
        _ => json!({}),
    }
}

fn make_content(components: &ComponentsRegistry, content_type: &str, name: Option<&str>) -> Value {
    json!({ content_type: { "schema": make_schema(components, content_type, name) } })
}

fn operation_object(components: &ComponentsRegistry, spec: &OperationSpec) -> Value {
    let mut op = Map::new();
    let op_id = spec
        .operation_id
        .clone()
        .unwrap_or_else(|| spec.handler_id.clone());
    op.insert("operationId".into(), Value::String(op_id));
    if let Some(summary) = &spec.summary {
        op.insert("summary".into(), Value::String(summary.clone()));
    }
    if let Some(description) = &spec.description {
        op.insert("description".into(), Value::String(description.clone()));
    }
    if !spec.tags.is_empty() {
        op.insert("tags".into(), json!(spec.tags));
    }

    if !spec.params.is_empty() {
        let params: Vec<Value> = spec
            .params
            .iter()
            .map(|p| {
                let (location, required) = match p.location {
                    ParamLocation::Path => ("path", true),
                    ParamLocation::Query => ("query", p.required),
                };
                let mut param = json!({
                    "name": p.name,
                    "in": location,
                    "required": required,
                    "schema": { "type": p.param_type },
                });
                if let Some(d) = &p.description {
                    param["description"] = Value::String(d.clone());
                }
                param
            })
            .collect();
        op.insert("parameters".into(), Value::Array(params));
    }

    if let Some(req) = &spec.request_body {
        let mut rb = json!({
            "required": req.required,
            "content": make_content(components, req.content_type, req.schema_name.as_deref()),
        });
        if let Some(d) = &req.description {
            rb["description"] = Value::String(d.clone());
        }
        op.insert("requestBody".into(), rb);
    }

    let mut responses = Map::new();
    for r in &spec.responses {
        responses.insert(
            r.status.to_string(),
            json!({
                "description": r.description,
                "content": make_content(components, r.content_type, r.schema_name.as_deref()),
            }),
        );
    }
    op.insert("responses".into(), Value::Object(responses));

    if spec.authenticated {
        op.insert("security".into(), json!([{ BEARER_SCHEME: [] }]));
    }
    Value::Object(op)
}

pub fn build<'a>(
    components: &ComponentsRegistry,
    operations: impl IntoIterator<Item = &'a OperationSpec>,
) -> anyhow::Result<OpenApi> {
    let mut paths: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    for spec in operations {
        paths
            .entry(spec.path.clone())
            .or_default()
            .insert(spec.method.as_str().to_lowercase(), operation_object(components, spec));
    }

    let mut out = OpenApiComponents::default();
    for (name, schema) in &components.schemas {
        out.schemas.insert(name.clone(), serde_json::to_value(schema)?);
    }
    out.security_schemes.insert(
        BEARER_SCHEME.to_string(),
        json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }),
    );

    Ok(OpenApi {
        openapi: "3.1.0",
        info: OpenApiInfo {
            title: "InternEase API",
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Student opportunity platform"),
        },
        paths: serde_json::to_value(paths)?,
        components: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use modkit::api::{ParamSpec, ResponseSpec};

    fn spec(authenticated: bool) -> OperationSpec {
        OperationSpec {
            method: Method::GET,
            path: "/api/notes/{id}".into(),
            operation_id: Some("notes.get".into()),
            summary: Some("Get a note".into()),
            description: None,
            tags: vec!["Notes".into()],
            params: vec![ParamSpec {
                name: "id".into(),
                location: ParamLocation::Path,
                required: false,
                description: None,
                param_type: "string".into(),
            }],
            request_body: None,
            responses: vec![ResponseSpec {
                status: 200,
                content_type: "application/json",
                description: "ok".into(),
                schema_name: Some("NoteDto".into()),
            }],
            authenticated,
            handler_id: "get_api_notes_id".into(),
        }
    }

    #[test]
    fn emits_security_and_path_params() {
        let s = spec(true);
        let doc = build(&ComponentsRegistry::default(), [&s]).unwrap();
        let v = serde_json::to_value(&doc).unwrap();
        let op = &v["paths"]["/api/notes/{id}"]["get"];
        assert_eq!(op["operationId"], "notes.get");
        assert_eq!(op["parameters"][0]["required"], true);
        assert_eq!(op["security"][0]["bearerAuth"], json!([]));
        // unknown schema falls back to an inline object
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["type"],
            "object"
        );
        assert_eq!(v["components"]["securitySchemes"]["bearerAuth"]["scheme"], "bearer");
    }

    #[test]
    fn public_operations_have_no_security() {
        let s = spec(false);
        let v = serde_json::to_value(build(&ComponentsRegistry::default(), [&s]).unwrap()).unwrap();
        assert!(v["paths"]["/api/notes/{id}"]["get"].get("security").is_none());
    }
}
