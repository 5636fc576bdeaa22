//! Final touch on error bodies before they leave the process.
//!
//! Handlers render [`Problem`] without knowing the request path or id. This layer
//! fills `instance` and `request_id` from the request and, in production, drops the
//! `debug` field that carries internal error chains.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use modkit::{Problem, ProblemResponse};
use runtime::Environment;

use crate::request_id::XRequestId;

pub async fn finalize_problem(
    State(environment): State<Environment>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let rid = req.extensions().get::<XRequestId>().map(|r| r.0.clone());

    let resp = next.run(req).await;
    let Some(problem) = resp.extensions().get::<Problem>().cloned() else {
        return resp;
    };

    let problem = enrich(problem, &path, rid, environment);
    let (parts, _) = resp.into_parts();
    let mut out = ProblemResponse(problem).into_response();
    for (name, value) in parts.headers.iter() {
        if name != axum::http::header::CONTENT_LENGTH && !out.headers().contains_key(name) {
            out.headers_mut().insert(name.clone(), value.clone());
        }
    }
    out
}

fn enrich(mut p: Problem, path: &str, rid: Option<String>, env: Environment) -> Problem {
    if p.instance.is_empty() {
        p.instance = path.to_owned();
    }
    if p.request_id.is_none() {
        p.request_id = rid;
    }
    if p.status >= 500 {
        if let Some(detail) = &p.debug {
            tracing::error!(status = p.status, code = %p.code, error = %detail, "request failed");
        }
    }
    if env.is_production() {
        p.debug = None;
    }
    p
}
