use std::sync::Arc;

use chrono::Utc;
use modkit::Identity;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{is_hex_color, NewNote, Note, NotePatch, NoteQuery, DEFAULT_COLOR};
use crate::domain::error::DomainError;
use crate::domain::repo::NotesRepository;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { list_limit: 500 }
    }
}

#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn NotesRepository>,
    config: ServiceConfig,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_color(color: &str) -> Result<(), DomainError> {
    if is_hex_color(color) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "Invalid color '{color}', expected #rrggbb"
        )))
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Service {
    pub fn new(repo: Arc<dyn NotesRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "notes.service.list", skip(self, query), fields(user_id = %who.user_id))]
    pub async fn list(&self, who: Identity, query: NoteQuery) -> Result<Vec<Note>, DomainError> {
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let notes = self
            .repo
            .list_by_owner(who.user_id, search, query.tag.as_deref(), self.config.list_limit)
            .await
            .map_err(db_err)?;
        debug!(count = notes.len(), "listed notes");
        Ok(notes)
    }

    pub async fn get(&self, who: Identity, id: Uuid) -> Result<Note, DomainError> {
        self.owned(who, id, "Not authorized to access this note").await
    }

    #[instrument(name = "notes.service.create", skip(self, new), fields(user_id = %who.user_id))]
    pub async fn create(&self, who: Identity, new: NewNote) -> Result<Note, DomainError> {
        if blank(&new.title) {
            return Err(DomainError::validation("Please provide a title"));
        }
        if blank(&new.content) {
            return Err(DomainError::validation("Please provide content"));
        }
        let color = new.color.unwrap_or_else(|| DEFAULT_COLOR.to_owned());
        check_color(&color)?;

        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            owner_id: who.user_id,
            title: new.title.trim().to_owned(),
            content: new.content,
            tags: clean_tags(new.tags),
            is_pinned: new.is_pinned.unwrap_or(false),
            color,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(note.clone()).await.map_err(db_err)?;
        info!(note_id = %note.id, "note created");
        Ok(note)
    }

    #[instrument(name = "notes.service.update", skip(self, patch), fields(user_id = %who.user_id, note_id = %id))]
    pub async fn update(&self, who: Identity, id: Uuid, patch: NotePatch) -> Result<Note, DomainError> {
        let mut note = self.owned(who, id, "Not authorized to update this note").await?;

        if let Some(title) = patch.title {
            if blank(&title) {
                return Err(DomainError::validation("Please provide a title"));
            }
            note.title = title.trim().to_owned();
        }
        if let Some(content) = patch.content {
            if blank(&content) {
                return Err(DomainError::validation("Please provide content"));
            }
            note.content = content;
        }
        if let Some(color) = patch.color {
            check_color(&color)?;
            note.color = color;
        }
        if let Some(tags) = patch.tags {
            note.tags = clean_tags(tags);
        }
        if let Some(pinned) = patch.is_pinned {
            note.is_pinned = pinned;
        }
        note.updated_at = Utc::now();

        self.save(note).await
    }

    #[instrument(name = "notes.service.delete", skip(self), fields(user_id = %who.user_id, note_id = %id))]
    pub async fn delete(&self, who: Identity, id: Uuid) -> Result<(), DomainError> {
        self.owned(who, id, "Not authorized to delete this note").await?;
        if !self.repo.delete(id).await.map_err(db_err)? {
            return Err(DomainError::not_found(id));
        }
        info!("note deleted");
        Ok(())
    }

    #[instrument(name = "notes.service.toggle_pin", skip(self), fields(user_id = %who.user_id, note_id = %id))]
    pub async fn toggle_pin(&self, who: Identity, id: Uuid) -> Result<Note, DomainError> {
        let mut note = self.owned(who, id, "Not authorized to modify this note").await?;
        note.is_pinned = !note.is_pinned;
        note.updated_at = Utc::now();
        self.save(note).await
    }

    async fn save(&self, note: Note) -> Result<Note, DomainError> {
        if !self.repo.update(note.clone()).await.map_err(db_err)? {
            return Err(DomainError::not_found(note.id));
        }
        Ok(note)
    }

    async fn owned(&self, who: Identity, id: Uuid, denial: &str) -> Result<Note, DomainError> {
        let note = self
            .repo
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(id))?;
        if !note.is_owned_by(who.user_id) {
            warn!(owner_id = %note.owner_id, "note belongs to another user");
            return Err(DomainError::forbidden(denial));
        }
        Ok(note)
    }
}
