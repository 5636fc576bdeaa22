pub mod catalog;
pub mod error;
pub mod repo;
pub mod service;
