use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{client::IdentityApi, error::IdentityError, model::User};
use crate::domain::service::Service;

/// Local implementation of `IdentityApi` that delegates to the domain service
pub struct IdentityLocalClient {
    service: Arc<Service>,
}

impl IdentityLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl IdentityApi for IdentityLocalClient {
    async fn get_user(&self, id: Uuid) -> Result<User, IdentityError> {
        self.service.get_user(id).await.map_err(Into::into)
    }
}
