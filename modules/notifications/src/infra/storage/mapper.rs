use anyhow::anyhow;
use sea_orm::Set;

use crate::contract::model::Notification;
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for Notification {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            recipient: m.recipient,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            title: m.title,
            message: m.message,
            kind: m.kind.parse().map_err(|e: String| anyhow!(e))?,
            audience: m.audience.parse().map_err(|e: String| anyhow!(e))?,
            read: m.read,
            link: m.link,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<Notification> for ActiveModel {
    fn from(n: Notification) -> Self {
        Self {
            id: Set(n.id),
            recipient: Set(n.recipient),
            sender_id: Set(n.sender_id),
            sender_name: Set(n.sender_name),
            title: Set(n.title),
            message: Set(n.message),
            kind: Set(n.kind.as_str().to_owned()),
            audience: Set(n.audience.as_str().to_owned()),
            read: Set(n.read),
            link: Set(n.link),
            created_at: Set(n.created_at),
            updated_at: Set(n.updated_at),
        }
    }
}
