pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod repo;
pub mod service;
