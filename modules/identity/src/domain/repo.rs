use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::User;

/// A user row including its credential.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Persistence operations the identity service needs.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Fails with a unique-violation `DbErr` in the chain on a duplicate email.
    async fn insert(&self, u: StoredUser) -> anyhow::Result<()>;
    async fn update(&self, u: User) -> anyhow::Result<()>;
    /// Returns false when no row matched.
    async fn set_password_hash(&self, id: Uuid, hash: String) -> anyhow::Result<bool>;
}
