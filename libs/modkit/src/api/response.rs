//! Success envelope: `{ success, data?, count?, message? }`.
//!
//! Handlers return [`ApiResult`] and build bodies with the helpers below; errors
//! go out as [`Problem`](crate::api::problem::Problem), which carries the same
//! `success`/`message` fields.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::problem::ProblemResponse;

pub type ApiResult<T = Response> = Result<T, ProblemResponse>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            success: true,
            data: Some(items),
            count: Some(count),
            message: None,
        }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: Some(message.into()),
        }
    }
}

fn render<T: Serialize>(status: StatusCode, body: Envelope<T>) -> Response {
    (status, Json(body)).into_response()
}

/// 200 `{success, data}`
pub fn ok_json<T: Serialize>(data: T) -> Response {
    render(StatusCode::OK, Envelope::data(data))
}

/// 200 `{success, count, data}`
pub fn ok_list<T: Serialize>(items: Vec<T>) -> Response {
    render(StatusCode::OK, Envelope::list(items))
}

/// 201 `{success, data}`
pub fn created_json<T: Serialize>(data: T) -> Response {
    render(StatusCode::CREATED, Envelope::data(data))
}

/// 201 `{success, message, data}`
pub fn created_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    render(StatusCode::CREATED, Envelope::data(data).with_message(message))
}

/// 200 `{success, message, data}`
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    render(StatusCode::OK, Envelope::data(data).with_message(message))
}

/// 200 `{success, message}`
pub fn ok_message(message: impl Into<String>) -> Response {
    render(StatusCode::OK, Envelope::message(message))
}

/// Any status with a full envelope, for bodies that don't fit the helpers.
pub fn with_status<T: Serialize>(status: StatusCode, body: Envelope<T>) -> Response {
    render(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_counts_items() {
        let v = serde_json::to_value(Envelope::list(vec![1, 2, 3])).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["count"], 3);
        assert_eq!(v["data"], serde_json::json!([1, 2, 3]));
        assert!(v.get("message").is_none());
    }

    #[test]
    fn message_only_envelope_omits_data() {
        let v = serde_json::to_value(Envelope::message("Note deleted successfully")).unwrap();
        assert_eq!(v, serde_json::json!({"success": true, "message": "Note deleted successfully"}));
    }

    #[test]
    fn helpers_set_status() {
        assert_eq!(created_json("x").status(), StatusCode::CREATED);
        assert_eq!(ok_message("done").status(), StatusCode::OK);
    }
}
