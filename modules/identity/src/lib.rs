// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::IdentityModule;

// === INTERNAL MODULES ===
// Exposed for integration tests and the admin CLI; other modules use `contract` only.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
