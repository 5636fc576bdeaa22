use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{NewNote, Note, NotePatch, NoteQuery};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub id: Uuid,
    /// Owner id.
    pub user: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteDto {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            user: n.owner_id,
            title: n.title,
            content: n.content,
            tags: n.tags,
            is_pinned: n.is_pinned,
            color: n.color,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<NoteDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteReq {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_pinned: Option<bool>,
    /// `#rrggbb`, white when omitted.
    pub color: Option<String>,
}

impl From<CreateNoteReq> for NewNote {
    fn from(r: CreateNoteReq) -> Self {
        Self {
            title: r.title.unwrap_or_default(),
            content: r.content.unwrap_or_default(),
            tags: r.tags,
            is_pinned: r.is_pinned,
            color: r.color,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateNoteReq {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub color: Option<String>,
}

impl From<UpdateNoteReq> for NotePatch {
    fn from(r: UpdateNoteReq) -> Self {
        Self {
            title: r.title,
            content: r.content,
            tags: r.tags,
            is_pinned: r.is_pinned,
            color: r.color,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListNotesQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl From<ListNotesQuery> for NoteQuery {
    fn from(q: ListNotesQuery) -> Self {
        Self {
            search: q.search,
            tag: q.tag,
        }
    }
}
