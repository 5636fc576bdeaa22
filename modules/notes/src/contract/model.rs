use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_COLOR: &str = "#ffffff";

/// A private note. Only its owner can read or change it.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    /// `#rrggbb`
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.owner_id == user
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    /// Case-insensitive substring of title or content.
    pub search: Option<String>,
    pub tag: Option<String>,
}

/// Accepts `#rrggbb` with either hex case.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
