pub mod client;
pub mod error;
pub mod model;

pub use client::IdentityApi;
pub use error::IdentityError;
pub use model::{Profile, User};
