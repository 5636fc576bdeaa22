//! Apply → review → decide.
//!
//! The only flow that writes to more than one store: applying touches the
//! application, the applicant list and the organizer's inbox; reviewing
//! touches the application and the student's inbox. Each runs in a single
//! storage transaction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use identity::contract::{IdentityApi, IdentityError, Profile};
use modkit::{Identity, Role};
use notifications::model::{NewAddressedNotification, NotificationKind};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Applicant, Application, ApplicationStatus, ApplicationView, ApplyRequest, Posting,
    PostingSummary,
};
use crate::domain::error::DomainError;
use crate::domain::repo::{ApplicationsRepository, PostingsRepository};
use crate::domain::service::db_err;

#[derive(Clone)]
pub struct Lifecycle {
    postings: Arc<dyn PostingsRepository>,
    applications: Arc<dyn ApplicationsRepository>,
    users: Arc<dyn IdentityApi>,
}

impl Lifecycle {
    pub fn new(
        postings: Arc<dyn PostingsRepository>,
        applications: Arc<dyn ApplicationsRepository>,
        users: Arc<dyn IdentityApi>,
    ) -> Self {
        Self {
            postings,
            applications,
            users,
        }
    }

    async fn posting(&self, id: Uuid) -> Result<Posting, DomainError> {
        self.postings
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::posting_not_found(id))
    }

    #[instrument(name = "opportunities.lifecycle.apply", skip(self, req), fields(user_id = %who.user_id, opportunity_id = %opportunity_id))]
    pub async fn apply(
        &self,
        who: Identity,
        opportunity_id: Uuid,
        req: ApplyRequest,
    ) -> Result<Application, DomainError> {
        who.require_role(Role::Student)?;
        let posting = self.posting(opportunity_id).await?;

        if self
            .applications
            .find_for(who.user_id, opportunity_id)
            .await
            .map_err(db_err)?
            .is_some()
        {
            return Err(DomainError::AlreadyApplied { opportunity_id });
        }

        let student = self.users.get_user(who.user_id).await?;
        let now = Utc::now();
        let app = Application {
            id: Uuid::new_v4(),
            user_id: who.user_id,
            opportunity_id,
            status: ApplicationStatus::Applied,
            snapshot: posting.snapshot(),
            cover_letter: req.cover_letter.unwrap_or_default(),
            resume: req.resume.unwrap_or_default(),
            notes: req.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let notice = NewAddressedNotification {
            recipient: posting.organizer_id,
            sender_id: who.user_id,
            sender_name: student.name.clone(),
            title: "New application".into(),
            message: format!(
                "{} has applied for your opportunity: {}",
                student.name, posting.title
            ),
            kind: NotificationKind::Application,
            link: Some("/organizer/applications".into()),
        };

        if let Err(e) = self
            .applications
            .create_with_notice(app.clone(), notice)
            .await
        {
            // a concurrent apply won the unique index
            if modkit_db::is_unique_violation_any(e.as_ref()) {
                return Err(DomainError::AlreadyApplied { opportunity_id });
            }
            return Err(db_err(e));
        }
        info!(application_id = %app.id, "application submitted");
        Ok(app)
    }

    /// Any status may follow any other.
    #[instrument(name = "opportunities.lifecycle.review", skip(self), fields(user_id = %who.user_id, application_id = %id))]
    pub async fn review(
        &self,
        who: Identity,
        id: Uuid,
        status: &str,
    ) -> Result<Application, DomainError> {
        who.require_role(Role::Organizer)?;
        let mut app = self
            .applications
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::application_not_found(id))?;
        let posting = self.posting(app.opportunity_id).await?;
        if !posting.is_owned_by(who.user_id) {
            warn!(organizer_id = %posting.organizer_id, "review by non-owner");
            return Err(DomainError::not_authorized(
                "User not authorized to update this application",
            ));
        }
        let status: ApplicationStatus = status.parse().map_err(DomainError::validation)?;

        let notice = NewAddressedNotification {
            recipient: app.user_id,
            sender_id: who.user_id,
            sender_name: posting.organizer_name.clone(),
            title: "Application update".into(),
            message: format!(
                "Your application for \"{}\" has been {}.",
                posting.title, status
            ),
            kind: NotificationKind::Application,
            link: Some("/applications/me".into()),
        };
        if !self
            .applications
            .set_status_with_notice(id, status, notice)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::application_not_found(id));
        }

        info!(from = %app.status, to = %status, "application reviewed");
        app.status = status;
        app.updated_at = Utc::now();
        Ok(app)
    }

    #[instrument(name = "opportunities.lifecycle.list_mine", skip(self), fields(user_id = %who.user_id))]
    pub async fn list_mine(&self, who: Identity) -> Result<Vec<ApplicationView>, DomainError> {
        who.require_role(Role::Student)?;
        let apps = self
            .applications
            .list_by_user(who.user_id)
            .await
            .map_err(db_err)?;
        self.with_postings(apps).await
    }

    #[instrument(name = "opportunities.lifecycle.list_for_organizer", skip(self), fields(user_id = %who.user_id))]
    pub async fn list_for_organizer(
        &self,
        who: Identity,
    ) -> Result<Vec<ApplicationView>, DomainError> {
        who.require_role(Role::Organizer)?;
        let postings = self
            .postings
            .list_by_organizer(who.user_id)
            .await
            .map_err(db_err)?;
        self.for_postings(&postings).await
    }

    /// Students see their own applications; organizers see applications to
    /// their own postings.
    #[instrument(name = "opportunities.lifecycle.list", skip(self), fields(user_id = %who.user_id))]
    pub async fn list(
        &self,
        who: Identity,
        opportunity: Option<Uuid>,
    ) -> Result<Vec<ApplicationView>, DomainError> {
        match who.role {
            Role::Student => {
                let mut apps = self
                    .applications
                    .list_by_user(who.user_id)
                    .await
                    .map_err(db_err)?;
                if let Some(id) = opportunity {
                    apps.retain(|a| a.opportunity_id == id);
                }
                self.with_postings(apps).await
            }
            Role::Organizer => {
                let postings = match opportunity {
                    Some(id) => {
                        let p = self.posting(id).await?;
                        if !p.is_owned_by(who.user_id) {
                            warn!(opportunity_id = %id, "listing applications of a foreign posting");
                            return Err(DomainError::not_authorized(
                                "Not authorized to view applications for this opportunity",
                            ));
                        }
                        vec![p]
                    }
                    None => self
                        .postings
                        .list_by_organizer(who.user_id)
                        .await
                        .map_err(db_err)?,
                };
                self.for_postings(&postings).await
            }
        }
    }

    async fn with_postings(
        &self,
        apps: Vec<Application>,
    ) -> Result<Vec<ApplicationView>, DomainError> {
        let mut cache: HashMap<Uuid, Option<PostingSummary>> = HashMap::new();
        let mut out = Vec::with_capacity(apps.len());
        for app in apps {
            let summary = match cache.get(&app.opportunity_id) {
                Some(s) => s.clone(),
                None => {
                    let found = self
                        .postings
                        .find(app.opportunity_id)
                        .await
                        .map_err(db_err)?
                        .map(|p| PostingSummary::from(&p));
                    cache.insert(app.opportunity_id, found.clone());
                    found
                }
            };
            out.push(ApplicationView {
                application: app,
                posting: summary,
                applicant: None,
            });
        }
        debug!(count = out.len(), "listed applications");
        Ok(out)
    }

    async fn for_postings(&self, postings: &[Posting]) -> Result<Vec<ApplicationView>, DomainError> {
        let ids: Vec<Uuid> = postings.iter().map(|p| p.id).collect();
        let summaries: HashMap<Uuid, PostingSummary> = postings
            .iter()
            .map(|p| (p.id, PostingSummary::from(p)))
            .collect();
        let apps = self
            .applications
            .list_by_opportunities(&ids)
            .await
            .map_err(db_err)?;

        let mut applicants: HashMap<Uuid, Option<Applicant>> = HashMap::new();
        let mut out = Vec::with_capacity(apps.len());
        for app in apps {
            if !applicants.contains_key(&app.user_id) {
                let a = self.applicant(app.user_id).await?;
                applicants.insert(app.user_id, a);
            }
            out.push(ApplicationView {
                posting: summaries.get(&app.opportunity_id).cloned(),
                applicant: applicants.get(&app.user_id).cloned().flatten(),
                application: app,
            });
        }
        debug!(count = out.len(), "listed applications for organizer");
        Ok(out)
    }

    async fn applicant(&self, id: Uuid) -> Result<Option<Applicant>, DomainError> {
        match self.users.get_user(id).await {
            Ok(u) => {
                let resume_link = match &u.profile {
                    Profile::Student { resume_link, .. } if !resume_link.is_empty() => {
                        Some(resume_link.clone())
                    }
                    _ => None,
                };
                Ok(Some(Applicant {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                    resume_link,
                }))
            }
            Err(IdentityError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
