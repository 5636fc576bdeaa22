use std::sync::Arc;

use chrono::Utc;
use identity::contract::IdentityApi;
use modkit::{Identity, Role};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Audience, NewNotification, Notification};
use crate::domain::error::DomainError;
use crate::domain::repo::NotificationsRepository;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { list_limit: 200 }
    }
}

/// A page of the caller's inbox.
#[derive(Debug, Clone)]
pub struct Inbox {
    pub items: Vec<Notification>,
    pub unread: u64,
}

#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn NotificationsRepository>,
    users: Arc<dyn IdentityApi>,
    config: ServiceConfig,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

impl Service {
    pub fn new(
        repo: Arc<dyn NotificationsRepository>,
        users: Arc<dyn IdentityApi>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            users,
            config,
        }
    }

    #[instrument(name = "notifications.service.list_visible", skip(self), fields(user_id = %who.user_id))]
    pub async fn list_visible(&self, who: Identity) -> Result<Inbox, DomainError> {
        let audience = Audience::for_role(who.role);
        let items = self
            .repo
            .list_visible(who.user_id, audience, self.config.list_limit)
            .await
            .map_err(db_err)?;
        let unread = self
            .repo
            .count_unread(who.user_id, audience)
            .await
            .map_err(db_err)?;
        debug!(count = items.len(), unread, "listed notifications");
        Ok(Inbox { items, unread })
    }

    /// Organizer broadcast to one audience.
    #[instrument(name = "notifications.service.create", skip(self, new), fields(sender_id = %who.user_id))]
    pub async fn create(
        &self,
        who: Identity,
        new: NewNotification,
    ) -> Result<Notification, DomainError> {
        who.require_role(Role::Organizer)?;
        if new.title.trim().is_empty() || new.message.trim().is_empty() {
            return Err(DomainError::validation("Please provide title and message"));
        }
        let audience = match new.audience {
            Some(a) if a.is_broadcast() => a,
            _ => {
                return Err(DomainError::NotImplemented {
                    message: "Specific user targeting not implemented yet".into(),
                })
            }
        };

        let sender = self
            .users
            .get_user(who.user_id)
            .await
            .map_err(|e| DomainError::Sender {
                message: e.to_string(),
            })?;

        let now = Utc::now();
        let n = Notification {
            id: Uuid::new_v4(),
            recipient: None,
            sender_id: who.user_id,
            sender_name: sender.name,
            title: new.title,
            message: new.message,
            kind: new.kind.unwrap_or_default(),
            audience,
            read: false,
            link: new.link,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(n.clone()).await.map_err(db_err)?;
        info!(notification_id = %n.id, audience = %audience, "broadcast sent");
        Ok(n)
    }

    /// The read flag lives on the row, so a broadcast is marked read for its whole audience.
    #[instrument(name = "notifications.service.mark_read", skip(self), fields(user_id = %who.user_id, notification_id = %id))]
    pub async fn mark_read(&self, who: Identity, id: Uuid) -> Result<Notification, DomainError> {
        let mut n = self.load(id).await?;
        if !n.is_visible_to(who.user_id, who.role) {
            warn!("mark_read on a notification outside the caller's inbox");
            return Err(DomainError::not_authorized("Not authorized"));
        }
        if !self.repo.mark_read(id).await.map_err(db_err)? {
            return Err(DomainError::not_found(id));
        }
        n.read = true;
        n.updated_at = Utc::now();
        Ok(n)
    }

    #[instrument(name = "notifications.service.delete", skip(self), fields(user_id = %who.user_id, notification_id = %id))]
    pub async fn delete(&self, who: Identity, id: Uuid) -> Result<(), DomainError> {
        let n = self.load(id).await?;
        if n.sender_id != who.user_id {
            warn!(sender_id = %n.sender_id, "delete by someone other than the sender");
            return Err(DomainError::not_authorized(
                "Not authorized to delete this notification",
            ));
        }
        if !self.repo.delete(id).await.map_err(db_err)? {
            return Err(DomainError::not_found(id));
        }
        info!("notification deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Notification, DomainError> {
        self.repo
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(id))
    }
}
