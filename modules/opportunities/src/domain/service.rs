use std::sync::Arc;

use chrono::Utc;
use identity::contract::IdentityApi;
use modkit::{Identity, Role};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{NewPosting, Posting, PostingPatch};
use crate::domain::error::DomainError;
use crate::domain::filter::PostingFilter;
use crate::domain::repo::PostingsRepository;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_location: String,
    pub list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_location: "Remote".into(),
            list_limit: 500,
        }
    }
}

pub(crate) fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Posting store: public reads, owner-scoped writes.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn PostingsRepository>,
    users: Arc<dyn IdentityApi>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        repo: Arc<dyn PostingsRepository>,
        users: Arc<dyn IdentityApi>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            users,
            config,
        }
    }

    #[instrument(name = "opportunities.service.list_public", skip(self, filter))]
    pub async fn list_public(&self, filter: PostingFilter) -> Result<Vec<Posting>, DomainError> {
        let postings = self
            .repo
            .list_public(&filter, self.config.list_limit)
            .await
            .map_err(db_err)?;
        debug!(count = postings.len(), "listed public opportunities");
        Ok(postings)
    }

    #[instrument(name = "opportunities.service.get", skip(self), fields(opportunity_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Posting, DomainError> {
        self.repo
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::posting_not_found(id))
    }

    #[instrument(name = "opportunities.service.create", skip(self, new), fields(organizer_id = %who.user_id))]
    pub async fn create(&self, who: Identity, new: NewPosting) -> Result<Posting, DomainError> {
        who.require_role(Role::Organizer)?;
        let (Some(kind), Some(last_date)) = (new.kind, new.last_date) else {
            return Err(DomainError::validation(
                "Please provide title, description, type and lastDate",
            ));
        };
        if blank(&new.title) || blank(&new.description) {
            return Err(DomainError::validation(
                "Please provide title, description, type and lastDate",
            ));
        }

        let organizer = self.users.get_user(who.user_id).await?;
        if organizer.role() != Role::Organizer {
            warn!("token role disagrees with the stored account");
            return Err(DomainError::not_authorized(
                "Only organizers can create opportunities",
            ));
        }

        let now = Utc::now();
        let posting = Posting {
            id: Uuid::new_v4(),
            kind,
            title: new.title.trim().to_owned(),
            description: new.description,
            company: new.company,
            location: new
                .location
                .filter(|l| !blank(l))
                .unwrap_or_else(|| self.config.default_location.clone()),
            stipend: new.stipend,
            duration: new.duration,
            last_date,
            start_date: new.start_date,
            tags: new.tags,
            skills: new.skills,
            requirements: new.requirements,
            responsibilities: new.responsibilities,
            poster: new.poster,
            organizer_id: who.user_id,
            organizer_name: organizer.name,
            status: new.status.unwrap_or_default(),
            views: 0,
            applicants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(posting.clone()).await.map_err(db_err)?;
        info!(opportunity_id = %posting.id, kind = posting.kind.as_str(), "opportunity created");
        Ok(posting)
    }

    #[instrument(name = "opportunities.service.update", skip(self, patch), fields(user_id = %who.user_id, opportunity_id = %id))]
    pub async fn update(
        &self,
        who: Identity,
        id: Uuid,
        patch: PostingPatch,
    ) -> Result<Posting, DomainError> {
        who.require_role(Role::Organizer)?;
        let mut p = self.get(id).await?;
        if !p.is_owned_by(who.user_id) {
            warn!(organizer_id = %p.organizer_id, "update by non-owner");
            return Err(DomainError::not_authorized(
                "Not authorized to update this opportunity",
            ));
        }

        if let Some(title) = patch.title {
            if blank(&title) {
                return Err(DomainError::validation("Please provide a title"));
            }
            p.title = title.trim().to_owned();
        }
        if let Some(description) = patch.description {
            if blank(&description) {
                return Err(DomainError::validation("Please provide a description"));
            }
            p.description = description;
        }
        if let Some(kind) = patch.kind {
            p.kind = kind;
        }
        if let Some(company) = patch.company {
            p.company = Some(company);
        }
        if let Some(location) = patch.location {
            p.location = location;
        }
        if let Some(stipend) = patch.stipend {
            p.stipend = Some(stipend);
        }
        if let Some(duration) = patch.duration {
            p.duration = Some(duration);
        }
        if let Some(last_date) = patch.last_date {
            p.last_date = last_date;
        }
        if let Some(start_date) = patch.start_date {
            p.start_date = Some(start_date);
        }
        if let Some(tags) = patch.tags {
            p.tags = tags;
        }
        if let Some(skills) = patch.skills {
            p.skills = skills;
        }
        if let Some(requirements) = patch.requirements {
            p.requirements = requirements;
        }
        if let Some(responsibilities) = patch.responsibilities {
            p.responsibilities = responsibilities;
        }
        if let Some(poster) = patch.poster {
            p.poster = Some(poster);
        }
        if let Some(status) = patch.status {
            p.status = status;
        }
        p.updated_at = Utc::now();

        self.repo.update(p.clone()).await.map_err(db_err)?;
        info!("opportunity updated");
        Ok(p)
    }

    #[instrument(name = "opportunities.service.delete", skip(self), fields(user_id = %who.user_id, opportunity_id = %id))]
    pub async fn delete(&self, who: Identity, id: Uuid) -> Result<(), DomainError> {
        who.require_role(Role::Organizer)?;
        let p = self.get(id).await?;
        if !p.is_owned_by(who.user_id) {
            warn!(organizer_id = %p.organizer_id, "delete by non-owner");
            return Err(DomainError::not_authorized(
                "Not authorized to delete this opportunity",
            ));
        }
        if !self.repo.delete_cascade(id).await.map_err(db_err)? {
            return Err(DomainError::posting_not_found(id));
        }
        info!(applicants = p.applicants.len(), "opportunity deleted with its applications");
        Ok(())
    }

    #[instrument(name = "opportunities.service.list_mine", skip(self), fields(organizer_id = %who.user_id))]
    pub async fn list_mine(&self, who: Identity) -> Result<Vec<Posting>, DomainError> {
        who.require_role(Role::Organizer)?;
        self.repo
            .list_by_organizer(who.user_id)
            .await
            .map_err(db_err)
    }

    #[instrument(name = "opportunities.service.track_view", skip(self), fields(opportunity_id = %id))]
    pub async fn track_view(&self, id: Uuid) -> Result<i64, DomainError> {
        let views = self
            .repo
            .increment_views(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::posting_not_found(id))?;
        debug!(views, "view tracked");
        Ok(views)
    }
}
