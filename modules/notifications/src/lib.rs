// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

/// Transactional insert for other modules' workflows.
pub use infra::storage::insert_notification;

// === MODULE DEFINITION ===
pub mod module;
pub use module::NotificationsModule;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
