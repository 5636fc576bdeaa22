use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{error::IdentityError, model::User};

/// In-process API other modules resolve from the `ClientHub`.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<User, IdentityError>;
}
