use sea_orm::Set;

use crate::contract::model::Note;
use crate::infra::storage::entity::{ActiveModel, Model};

impl From<Model> for Note {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            title: m.title,
            content: m.content,
            tags: m.tags.into(),
            is_pinned: m.is_pinned,
            color: m.color,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<Note> for ActiveModel {
    fn from(n: Note) -> Self {
        Self {
            id: Set(n.id),
            owner_id: Set(n.owner_id),
            title: Set(n.title),
            content: Set(n.content),
            tags: Set(n.tags.into()),
            is_pinned: Set(n.is_pinned),
            color: Set(n.color),
            created_at: Set(n.created_at),
            updated_at: Set(n.updated_at),
        }
    }
}
