use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Error body shared by every endpoint.
///
/// RFC 9457 fields plus the `success: false` / `message` pair of the response envelope,
/// so clients can treat success and failure bodies uniformly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    title = "Problem",
    description = "RFC 9457 Problem Details carrying the response envelope fields"
)]
pub struct Problem {
    /// Always `false`.
    pub success: bool,
    /// Human-readable explanation of this occurrence.
    pub message: String,
    /// URI reference identifying the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// Short summary of the problem type.
    pub title: String,
    pub status: u16,
    /// Machine-readable error code.
    pub code: String,
    /// Path of the request that failed.
    pub instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Field-level validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
    /// Internal error chain. Removed before leaving the process in production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(title = "ValidationError")]
pub struct ValidationError {
    pub detail: String,
    /// JSON Pointer to the invalid location (e.g., "/email").
    pub pointer: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            code: String::new(),
            instance: String::new(),
            request_id: None,
            trace_id: None,
            errors: None,
            debug: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Axum response wrapper that renders `Problem` with correct status & content type.
///
/// A copy of the problem travels in the response extensions so the ingress can
/// fill `instance`/`request_id` and redact `debug` without re-parsing the body.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let mut resp = axum::Json(&self.0).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp.extensions_mut().insert(self.0);
        resp
    }
}

/// Build a problem response, stamping the current span id as `trace_id`.
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    message: impl Into<String>,
) -> ProblemResponse {
    let mut p = Problem::new(status, title, message).with_code(code);
    if let Some(id) = tracing::Span::current().id() {
        p = p.with_trace_id(id.into_u64().to_string());
    }
    ProblemResponse(p)
}

pub fn bad_request(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::BAD_REQUEST, "VALIDATION", "Bad Request", message)
}

pub fn unauthorized(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized", message)
}

pub fn forbidden(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden", message)
}

pub fn not_found(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::NOT_FOUND, "NOT_FOUND", "Not Found", message)
}

pub fn conflict(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::CONFLICT, "CONFLICT", "Conflict", message)
}

/// Unsupported request shape; reported as a client error.
pub fn not_implemented(message: impl Into<String>) -> ProblemResponse {
    from_parts(StatusCode::BAD_REQUEST, "NOT_IMPLEMENTED", "Not Implemented", message)
}

/// 500 with a generic message; `debug` carries the real cause.
pub fn internal_error(debug: impl Into<String>) -> ProblemResponse {
    let mut r = from_parts(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "Internal Server Error",
        "Server Error",
    );
    r.0.debug = Some(debug.into());
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "Note not found")
            .with_code("NOT_FOUND")
            .with_instance("/notes/42")
            .with_request_id("req-1");

        assert!(!p.success);
        assert_eq!(p.status, 404);
        assert_eq!(p.message, "Note not found");
        assert_eq!(p.instance, "/notes/42");
        assert_eq!(p.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn serializes_envelope_fields() {
        let v = serde_json::to_value(Problem::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "Please add all required fields",
        ))
        .unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Please add all required fields");
        assert_eq!(v["type"], "about:blank");
        assert!(v.get("debug").is_none());
        assert!(v.get("errors").is_none());
    }

    #[test]
    fn response_carries_status_content_type_and_extension() {
        let resp = conflict("User already exists").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            resp.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            APPLICATION_PROBLEM_JSON
        );
        let p = resp.extensions().get::<Problem>().unwrap();
        assert_eq!(p.code, "CONFLICT");
    }

    #[test]
    fn internal_error_hides_cause_in_message() {
        let r = internal_error("disk I/O error");
        assert_eq!(r.0.status, 500);
        assert_eq!(r.0.message, "Server Error");
        assert_eq!(r.0.debug.as_deref(), Some("disk I/O error"));
    }

    #[test]
    fn not_implemented_is_a_client_error() {
        assert_eq!(not_implemented("x").0.status, 400);
    }
}
