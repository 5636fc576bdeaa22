use anyhow::anyhow;
use sea_orm::Set;

use crate::contract::model::Interaction;
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for Interaction {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            user_id: m.user_id,
            event_id: m.event_id,
            event_title: m.event_title,
            kind: m.kind.parse().map_err(|e: String| anyhow!(e))?,
            event_url: m.event_url,
            location: m.location,
            event_date: m.event_date,
            registered_at: m.registered_at,
            created_at: m.created_at,
        })
    }
}

impl From<Interaction> for ActiveModel {
    fn from(i: Interaction) -> Self {
        Self {
            id: Set(i.id),
            user_id: Set(i.user_id),
            event_id: Set(i.event_id),
            event_title: Set(i.event_title),
            kind: Set(i.kind.as_str().to_owned()),
            event_url: Set(i.event_url),
            location: Set(i.location),
            event_date: Set(i.event_date),
            registered_at: Set(i.registered_at),
            created_at: Set(i.created_at),
        }
    }
}
