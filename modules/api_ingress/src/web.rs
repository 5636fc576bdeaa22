use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, Json},
};
use modkit_db::DbHandle;
use runtime::Environment;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct HealthState {
    pub db: Option<Arc<DbHandle>>,
    pub environment: Environment,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<Value> {
    let connected = match &state.db {
        Some(db) => db.ping().await,
        None => false,
    };
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": if connected { "connected" } else { "disconnected" },
        "environment": state.environment.as_str(),
    }))
}

pub async fn serve_docs() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>InternEase API</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="/openapi.json" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#,
    )
}
