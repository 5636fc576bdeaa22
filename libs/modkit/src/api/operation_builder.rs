//! Type-safe API operation builder.
//!
//! Type-state guarantees:
//! - `register()` needs a handler (`H = Present`);
//! - `register()` needs at least one declared response (`R = Present`);
//! - descriptive methods (tags, params, auth marker) are available at any stage.
//!
//! Each registered operation is reported to the [`OpenApiRegistry`] and mounted on
//! the axum `Router`, so docs and routing cannot drift apart.

use axum::{handler::Handler, routing::MethodRouter, Router};
use http::Method;
use std::marker::PhantomData;

use crate::api::problem;

pub type SchemaCollection = Vec<(
    String,
    utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
)>;

/// Type-state markers
pub mod state {
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

mod sealed {
    pub trait Sealed {}
}

/// Maps the handler state to the router slot: nothing while `Missing`,
/// a `MethodRouter<S>` once `Present`.
pub trait HandlerSlot<S>: sealed::Sealed {
    type Slot;
}

impl sealed::Sealed for Missing {}
impl sealed::Sealed for Present {}

impl<S> HandlerSlot<S> for Missing {
    type Slot = ();
}
impl<S> HandlerSlot<S> for Present {
    type Slot = MethodRouter<S>;
}

pub use state::{Missing, Present};

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    /// JSON Schema type (string, integer, ...)
    pub param_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
}

#[derive(Clone, Debug)]
pub struct RequestBodySpec {
    pub content_type: &'static str,
    pub description: Option<String>,
    /// Component schema referenced by `$ref`.
    pub schema_name: Option<String>,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct ResponseSpec {
    pub status: u16,
    pub content_type: &'static str,
    pub description: String,
    pub schema_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub params: Vec<ParamSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<ResponseSpec>,
    /// Operation requires `Authorization: Bearer <token>`.
    pub authenticated: bool,
    pub handler_id: String,
}

/// Registry trait for OpenAPI operations and schemas
pub trait OpenApiRegistry {
    fn register_operation(&self, spec: &OperationSpec);

    /// Register the named schema and its dependencies under components;
    /// returns the component name for `$ref`.
    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Register `T` (and every schema it references) and return its component name.
pub fn ensure_schema<T: utoipa::ToSchema + utoipa::PartialSchema + 'static>(
    registry: &dyn OpenApiRegistry,
) -> String {
    use utoipa::PartialSchema;

    let root_name = T::name().to_string();
    // T's own schema goes first so the component is the object, not a self-ref.
    let mut collected: SchemaCollection = vec![(root_name.clone(), <T as PartialSchema>::schema())];
    T::schemas(&mut collected);
    registry.ensure_schema_raw(&root_name, collected)
}

/// Generic parameters:
/// - `H`: handler state (Missing | Present)
/// - `R`: response state (Missing | Present)
/// - `S`: router state type
pub struct OperationBuilder<H, R, S = ()>
where
    H: HandlerSlot<S>,
{
    spec: OperationSpec,
    method_router: <H as HandlerSlot<S>>::Slot,
    _has_handler: PhantomData<H>,
    _has_response: PhantomData<R>,
    _state: PhantomData<fn() -> S>,
}

impl<S> OperationBuilder<Missing, Missing, S> {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let handler_id = format!(
            "{}:{}",
            method.as_str().to_lowercase(),
            path.replace(['/', '{', '}'], "_")
        );

        Self {
            spec: OperationSpec {
                method,
                path,
                operation_id: None,
                summary: None,
                description: None,
                tags: Vec::new(),
                params: Vec::new(),
                request_body: None,
                responses: Vec::new(),
                authenticated: false,
                handler_id,
            },
            method_router: (),
            _has_handler: PhantomData,
            _has_response: PhantomData,
            _state: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }
}

impl<H, R, S> OperationBuilder<H, R, S>
where
    H: HandlerSlot<S>,
{
    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.spec.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.spec.summary = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.spec.description = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.spec.tags.push(tag.into());
        self
    }

    /// Mark the operation as requiring a bearer token (documented as `bearerAuth`).
    pub fn require_auth(mut self) -> Self {
        self.spec.authenticated = true;
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.into(),
            location: ParamLocation::Path,
            required: true,
            description: Some(description.into()),
            param_type: "string".to_string(),
        });
        self
    }

    pub fn query_param(
        self,
        name: impl Into<String>,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.query_param_typed(name, required, description, "string")
    }

    pub fn query_param_typed(
        mut self,
        name: impl Into<String>,
        required: bool,
        description: impl Into<String>,
        param_type: impl Into<String>,
    ) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.into(),
            location: ParamLocation::Query,
            required,
            description: Some(description.into()),
            param_type: param_type.into(),
        });
        self
    }

    /// Required JSON body; the schema of `T` is registered in components.
    pub fn json_request<T>(mut self, registry: &dyn OpenApiRegistry, desc: impl Into<String>) -> Self
    where
        T: utoipa::ToSchema + utoipa::PartialSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.spec.request_body = Some(RequestBodySpec {
            content_type: "application/json",
            description: Some(desc.into()),
            schema_name: Some(name),
            required: true,
        });
        self
    }

    pub fn request_optional(mut self) -> Self {
        if let Some(rb) = &mut self.spec.request_body {
            rb.required = false;
        }
        self
    }
}

impl<R, S> OperationBuilder<Missing, R, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Attach the handler; routed by the operation's method.
    pub fn handler<F, T>(self, h: F) -> OperationBuilder<Present, R, S>
    where
        F: Handler<T, S> + Clone + Send + 'static,
        T: 'static,
    {
        let method_router = match self.spec.method {
            Method::GET => axum::routing::get(h),
            Method::POST => axum::routing::post(h),
            Method::PUT => axum::routing::put(h),
            Method::DELETE => axum::routing::delete(h),
            Method::PATCH => axum::routing::patch(h),
            _ => axum::routing::any(|| async { axum::http::StatusCode::METHOD_NOT_ALLOWED }),
        };

        OperationBuilder {
            spec: self.spec,
            method_router,
            _has_handler: PhantomData::<Present>,
            _has_response: self._has_response,
            _state: self._state,
        }
    }
}

impl<H, S> OperationBuilder<H, Missing, S>
where
    H: HandlerSlot<S>,
{
    fn first_response(mut self, resp: ResponseSpec) -> OperationBuilder<H, Present, S> {
        self.spec.responses.push(resp);
        OperationBuilder {
            spec: self.spec,
            method_router: self.method_router,
            _has_handler: self._has_handler,
            _has_response: PhantomData::<Present>,
            _state: self._state,
        }
    }

    pub fn json_response(
        self,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        self.first_response(json_spec(status, description, None))
    }

    pub fn json_response_with_schema<T>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S>
    where
        T: utoipa::ToSchema + utoipa::PartialSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.first_response(json_spec(status, description, Some(name)))
    }
}

impl<H, S> OperationBuilder<H, Present, S>
where
    H: HandlerSlot<S>,
{
    pub fn json_response(mut self, status: u16, description: impl Into<String>) -> Self {
        self.spec
            .responses
            .push(json_spec(status, description, None));
        self
    }

    pub fn json_response_with_schema<T>(
        mut self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> Self
    where
        T: utoipa::ToSchema + utoipa::PartialSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.spec
            .responses
            .push(json_spec(status, description, Some(name)));
        self
    }

    /// `application/problem+json` response referencing the shared `Problem` schema.
    pub fn problem_response(
        mut self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> Self {
        let problem_name = ensure_schema::<problem::Problem>(registry);
        self.spec.responses.push(ResponseSpec {
            status,
            content_type: problem::APPLICATION_PROBLEM_JSON,
            description: description.into(),
            schema_name: Some(problem_name),
        });
        self
    }

    /// 400 and 500, plus 401 and 403 when the operation requires auth.
    /// Declare `require_auth()` before calling this.
    pub fn standard_errors(self, registry: &dyn OpenApiRegistry) -> Self {
        let auth = self.spec.authenticated;
        let mut b = self.problem_response(registry, 400, "Bad Request");
        if auth {
            b = b
                .problem_response(registry, 401, "Unauthorized")
                .problem_response(registry, 403, "Forbidden");
        }
        b.problem_response(registry, 500, "Internal Server Error")
    }
}

fn json_spec(status: u16, description: impl Into<String>, schema: Option<String>) -> ResponseSpec {
    ResponseSpec {
        status,
        content_type: "application/json",
        description: description.into(),
        schema_name: schema,
    }
}

impl<S> OperationBuilder<Present, Present, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Report the operation to the registry and mount it on the router.
    pub fn register(self, router: Router<S>, openapi: &dyn OpenApiRegistry) -> Router<S> {
        openapi.register_operation(&self.spec);
        router.route(&self.spec.path, self.method_router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use std::sync::Mutex;

    struct MockRegistry {
        operations: Mutex<Vec<OperationSpec>>,
        schemas: Mutex<Vec<String>>,
    }

    impl MockRegistry {
        fn new() -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                schemas: Mutex::new(Vec::new()),
            }
        }
    }

    impl OpenApiRegistry for MockRegistry {
        fn register_operation(&self, spec: &OperationSpec) {
            self.operations.lock().unwrap().push(spec.clone());
        }

        fn ensure_schema_raw(&self, name: &str, _schemas: SchemaCollection) -> String {
            self.schemas.lock().unwrap().push(name.to_string());
            name.to_string()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[derive(serde::Deserialize, utoipa::ToSchema)]
    #[allow(dead_code)]
    struct CreateNoteReq {
        title: String,
    }

    async fn handler() -> Json<serde_json::Value> {
        Json(serde_json::json!({"success": true}))
    }

    #[test]
    fn descriptive_methods_fill_the_spec() {
        let b = OperationBuilder::<Missing, Missing, ()>::get("/notes/{id}")
            .operation_id("notes.get")
            .summary("Get note")
            .description("Fetch one of the caller's notes")
            .tag("notes")
            .require_auth()
            .path_param("id", "Note id");

        let spec = b.spec();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.path, "/notes/{id}");
        assert_eq!(spec.operation_id.as_deref(), Some("notes.get"));
        assert_eq!(spec.tags, vec!["notes"]);
        assert!(spec.authenticated);
        assert_eq!(spec.params[0].location, ParamLocation::Path);
        assert_eq!(spec.handler_id, "get:_notes__id_");
    }

    #[tokio::test]
    async fn register_reports_operation_and_schemas() {
        let registry = MockRegistry::new();

        let _router = OperationBuilder::<Missing, Missing, ()>::post("/notes")
            .json_request::<CreateNoteReq>(&registry, "Note to create")
            .handler(handler)
            .json_response(201, "Created")
            .register(Router::new(), &registry);

        let ops = registry.operations.lock().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].method, Method::POST);
        assert!(ops[0].request_body.as_ref().unwrap().required);
        assert_eq!(
            registry.schemas.lock().unwrap().as_slice(),
            &["CreateNoteReq".to_string()]
        );
    }

    #[test]
    fn standard_errors_follow_auth_marker() {
        let registry = MockRegistry::new();
        let public = OperationBuilder::<Missing, Missing, ()>::get("/external-courses")
            .handler(handler)
            .json_response(200, "OK")
            .standard_errors(&registry);
        let statuses: Vec<u16> = public.spec().responses.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![200, 400, 500]);

        let private = OperationBuilder::<Missing, Missing, ()>::get("/notes")
            .require_auth()
            .handler(handler)
            .json_response(200, "OK")
            .standard_errors(&registry);
        let statuses: Vec<u16> = private.spec().responses.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![200, 400, 401, 403, 500]);
        assert!(private
            .spec()
            .responses
            .iter()
            .filter(|r| r.status >= 400)
            .all(|r| r.content_type == problem::APPLICATION_PROBLEM_JSON));
    }
}
