//! # ModKit
//!
//! Module system for the InternEase server.
//!
//! - **Contracts**: `Module`, `DbModule`, `RestfulModule`, `RestHostModule`, `StatefulModule`
//! - **Explicit wiring**: the binary fills a [`RegistryBuilder`] with modules and their
//!   dependency edges; the registry topo-sorts them
//! - **Phase-based lifecycle**: init → DB → REST → start → stop
//! - **HTTP kit**: type-safe [`OperationBuilder`], `Problem` errors, success envelope,
//!   bearer-token [`auth::Identity`] extractor

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod contracts;
pub use crate::contracts::*;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod client_hub;
pub mod registry;
pub use client_hub::ClientHub;
pub use registry::{ModuleRegistry, RegistryBuilder};

pub mod api;
pub use api::problem::{
    bad_request, conflict, forbidden, internal_error, not_found, not_implemented, unauthorized,
    Problem, ProblemResponse, ValidationError,
};
pub use api::response::{ApiResult, Envelope};
pub use api::{JsonBody, OpenApiRegistry, OperationBuilder, PathParam, QueryParams};

pub mod auth;
pub use auth::{AuthError, Identity, Role, TokenCodec};

pub mod runtime;
pub use runtime::{run, DbOptions, RunOptions, ShutdownOptions};
