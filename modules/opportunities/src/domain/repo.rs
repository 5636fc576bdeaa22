use async_trait::async_trait;
use notifications::model::NewAddressedNotification;
use uuid::Uuid;

use crate::contract::model::{Application, ApplicationStatus, Posting};
use crate::domain::filter::PostingFilter;

#[async_trait]
pub trait PostingsRepository: Send + Sync {
    /// Active postings matching the filter, in the filter's sort order.
    async fn list_public(&self, filter: &PostingFilter, limit: u64) -> anyhow::Result<Vec<Posting>>;
    async fn list_by_organizer(&self, organizer: Uuid) -> anyhow::Result<Vec<Posting>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Posting>>;
    async fn insert(&self, p: Posting) -> anyhow::Result<()>;
    async fn update(&self, p: Posting) -> anyhow::Result<()>;
    /// Removes the posting, its applicants and its applications together.
    /// Returns false when no posting matched.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool>;
    /// `views = views + 1` in one statement; `None` when the posting is gone.
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
}

#[async_trait]
pub trait ApplicationsRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Application>>;
    async fn find_for(&self, user: Uuid, opportunity: Uuid) -> anyhow::Result<Option<Application>>;
    /// Newest first.
    async fn list_by_user(&self, user: Uuid) -> anyhow::Result<Vec<Application>>;
    /// Newest first.
    async fn list_by_opportunities(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Application>>;
    /// Inserts the application, the applicant row and the organizer's
    /// notification in one transaction. A duplicate (user, opportunity)
    /// surfaces as a unique-violation `DbErr` in the error chain.
    async fn create_with_notice(
        &self,
        app: Application,
        notice: NewAddressedNotification,
    ) -> anyhow::Result<()>;
    /// Updates the status and inserts the student's notification in one
    /// transaction. Returns false when no application matched.
    async fn set_status_with_notice(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notice: NewAddressedNotification,
    ) -> anyhow::Result<bool>;
}
