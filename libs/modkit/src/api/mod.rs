//! HTTP-facing building blocks: the type-safe operation builder, problem
//! responses and the success envelope.

pub mod extract;
pub mod operation_builder;
pub mod problem;
pub mod response;

pub use operation_builder::{
    ensure_schema, state, Missing, OpenApiRegistry, OperationBuilder, OperationSpec,
    ParamLocation, ParamSpec, Present, RequestBodySpec, ResponseSpec, SchemaCollection,
};
pub use extract::{JsonBody, PathParam, QueryParams};
pub use problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use response::{ApiResult, Envelope};
