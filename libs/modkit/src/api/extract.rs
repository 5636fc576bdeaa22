//! Body and query extractors whose rejections render as [`Problem`](super::Problem).

use axum::extract::{FromRequest, FromRequestParts, Request};
use http::request::Parts;
use serde::de::DeserializeOwned;

use super::problem::{self, ProblemResponse};

/// `axum::Json` with a 400 problem body on malformed input.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(problem::bad_request(rejection.body_text()))
            }
        }
    }
}

/// `axum::extract::Query` with a 400 problem body on unknown or malformed parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(problem::bad_request(rejection.body_text())),
        }
    }
}

/// `axum::extract::Path` whose rejection is a 404 problem: an id that cannot
/// parse cannot name an existing resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected path parameter");
                Err(problem::not_found("Resource not found"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Filter {
        #[allow(dead_code)]
        search: Option<String>,
    }

    async fn echo(JsonBody(v): JsonBody<serde_json::Value>) -> String {
        v.to_string()
    }

    async fn filtered(QueryParams(_f): QueryParams<Filter>) -> &'static str {
        "ok"
    }

    #[tokio::test]
    async fn malformed_json_is_a_problem() {
        let app = Router::new().route("/", post(echo));
        let resp = app
            .oneshot(
                http::Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            problem::APPLICATION_PROBLEM_JSON
        );
    }

    #[tokio::test]
    async fn unknown_query_keys_are_rejected() {
        let app = Router::new().route("/", axum::routing::get(filtered));
        let ok = app
            .clone()
            .oneshot(http::Request::get("/?search=x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);

        let bad = app
            .oneshot(http::Request::get("/?price[gt]=3").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(bad.status(), 400);
    }

    async fn by_id(PathParam(id): PathParam<uuid::Uuid>) -> String {
        id.to_string()
    }

    #[tokio::test]
    async fn unparsable_path_id_is_not_found() {
        let app = Router::new().route("/items/{id}", axum::routing::get(by_id));
        let resp = app
            .oneshot(http::Request::get("/items/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Resource not found");
    }
}
