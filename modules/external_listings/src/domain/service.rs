use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use identity::contract::{IdentityApi, IdentityError, User};
use modkit::{Identity, Role};
use modkit_db::is_unique_violation_any;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Course, EventReport, EventStat, ExternalEvent, ExternalInternship, Interaction,
    InteractionKind, RegisteredUser, Registration, RegistrationsReport, StudentActivity,
    StudentInfo, StudentRegistrations, Tracked,
};
use crate::domain::catalog::Catalog;
use crate::domain::error::DomainError;
use crate::domain::repo::InteractionsRepository;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Page size when the caller gives none.
    pub default_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

#[derive(Clone)]
pub struct Service {
    catalog: Arc<Catalog>,
    repo: Arc<dyn InteractionsRepository>,
    users: Arc<dyn IdentityApi>,
    config: ServiceConfig,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn student_info(u: &User) -> StudentInfo {
    StudentInfo {
        id: u.id,
        name: u.name.clone(),
        email: u.email.clone(),
        role: u.role(),
        joined_at: u.created_at,
    }
}

impl Service {
    pub fn new(
        catalog: Arc<Catalog>,
        repo: Arc<dyn InteractionsRepository>,
        users: Arc<dyn IdentityApi>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            catalog,
            repo,
            users,
            config,
        }
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|n| *n > 0)
            .unwrap_or(self.config.default_limit)
    }

    pub fn list_courses(&self, limit: Option<usize>) -> Vec<Course> {
        self.catalog.courses(self.limit(limit)).to_vec()
    }

    pub fn get_course(&self, id: &str) -> Result<Course, DomainError> {
        self.catalog
            .course(id)
            .cloned()
            .ok_or_else(|| DomainError::CourseNotFound { id: id.to_owned() })
    }

    pub fn list_internships(&self, limit: Option<usize>) -> Vec<ExternalInternship> {
        self.catalog.internships(self.limit(limit)).to_vec()
    }

    pub fn get_internship(&self, id: &str) -> Result<ExternalInternship, DomainError> {
        self.catalog
            .internship(id)
            .cloned()
            .ok_or_else(|| DomainError::InternshipNotFound { id: id.to_owned() })
    }

    pub fn list_events(&self, page_size: Option<usize>) -> Vec<ExternalEvent> {
        self.catalog.events(self.limit(page_size)).to_vec()
    }

    pub fn get_event(&self, id: &str) -> Result<ExternalEvent, DomainError> {
        self.catalog
            .event(id)
            .cloned()
            .ok_or_else(|| DomainError::EventNotFound { id: id.to_owned() })
    }

    #[instrument(name = "external_listings.service.track_view", skip(self), fields(user_id = %who.user_id))]
    pub async fn track_view(&self, who: Identity, event_id: &str) -> Result<Tracked, DomainError> {
        let event = self.get_event(event_id)?;
        self.track(who.user_id, &event, InteractionKind::View).await
    }

    #[instrument(name = "external_listings.service.track_registration", skip(self), fields(user_id = %who.user_id))]
    pub async fn track_registration(
        &self,
        who: Identity,
        event_id: &str,
    ) -> Result<Registration, DomainError> {
        let event = self.get_event(event_id)?;
        let tracked = self
            .track(who.user_id, &event, InteractionKind::Register)
            .await?;
        Ok(Registration {
            tracked,
            redirect_url: event.url,
        })
    }

    /// Idempotent: one row per (user, event, kind) no matter how many calls race.
    async fn track(
        &self,
        user: Uuid,
        event: &ExternalEvent,
        kind: InteractionKind,
    ) -> Result<Tracked, DomainError> {
        if let Some(existing) = self
            .repo
            .find(user, &event.id, kind)
            .await
            .map_err(db_err)?
        {
            debug!(event_id = %event.id, %kind, "interaction already recorded");
            return Ok(Tracked::AlreadyTracked(Some(existing)));
        }

        let row = Interaction::new(user, event, kind);
        match self.repo.insert(row.clone()).await {
            Ok(()) => {
                info!(event_id = %event.id, %kind, "interaction recorded");
                Ok(Tracked::Recorded(row))
            }
            Err(e) if is_unique_violation_any(e.as_ref()) => {
                debug!(event_id = %event.id, %kind, "lost insert race to a concurrent request");
                Ok(Tracked::AlreadyTracked(None))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    pub async fn my_registrations(&self, who: Identity) -> Result<Vec<Interaction>, DomainError> {
        self.repo
            .list_by_user(who.user_id, Some(InteractionKind::Register))
            .await
            .map_err(db_err)
    }

    /// Per-event counters, most recently touched event first.
    #[instrument(name = "external_listings.service.stats", skip(self), fields(user_id = %who.user_id))]
    pub async fn stats(&self, who: Identity) -> Result<Vec<EventStat>, DomainError> {
        who.require_role(Role::Organizer)?;
        let rows = self.repo.list_all(None).await.map_err(db_err)?;

        let mut by_event: BTreeMap<String, EventStat> = BTreeMap::new();
        for r in rows {
            let stat = by_event
                .entry(r.event_id.clone())
                .or_insert_with(|| EventStat {
                    event_id: r.event_id.clone(),
                    event_title: r.event_title.clone(),
                    views: 0,
                    registrations: 0,
                    last_interaction: r.created_at,
                });
            match r.kind {
                InteractionKind::View => stat.views += 1,
                InteractionKind::Register => stat.registrations += 1,
            }
            stat.last_interaction = stat.last_interaction.max(r.created_at);
        }

        let mut stats: Vec<EventStat> = by_event.into_values().collect();
        stats.sort_by(|a, b| b.last_interaction.cmp(&a.last_interaction));
        Ok(stats)
    }

    #[instrument(name = "external_listings.service.event_stats", skip(self), fields(user_id = %who.user_id))]
    pub async fn event_stats(
        &self,
        who: Identity,
        event_id: &str,
    ) -> Result<EventReport, DomainError> {
        who.require_role(Role::Organizer)?;
        let views = self
            .repo
            .count(event_id, InteractionKind::View)
            .await
            .map_err(db_err)?;
        let registered = self
            .repo
            .list_by_event(event_id, InteractionKind::Register)
            .await
            .map_err(db_err)?;

        let mut registered_users = Vec::with_capacity(registered.len());
        for r in &registered {
            if let Some(u) = self.user(r.user_id).await? {
                registered_users.push(RegisteredUser {
                    name: u.name,
                    email: u.email,
                    registered_at: r.registered_at,
                });
            }
        }

        Ok(EventReport {
            event_id: event_id.to_owned(),
            views,
            registrations: registered.len() as u64,
            registered_users,
        })
    }

    /// Every registration grouped by the person who made it.
    #[instrument(name = "external_listings.service.admin_registrations", skip(self), fields(user_id = %who.user_id))]
    pub async fn admin_registrations(
        &self,
        who: Identity,
    ) -> Result<RegistrationsReport, DomainError> {
        who.require_role(Role::Organizer)?;
        let rows = self
            .repo
            .list_all(Some(InteractionKind::Register))
            .await
            .map_err(db_err)?;

        let mut students: Vec<StudentRegistrations> = Vec::new();
        let mut slot: HashMap<Uuid, Option<usize>> = HashMap::new();
        let mut total = 0;
        for r in rows {
            let idx = match slot.get(&r.user_id) {
                Some(idx) => *idx,
                None => {
                    let idx = match self.user(r.user_id).await? {
                        Some(u) => {
                            students.push(StudentRegistrations {
                                student: student_info(&u),
                                registrations: Vec::new(),
                            });
                            Some(students.len() - 1)
                        }
                        None => None,
                    };
                    slot.insert(r.user_id, idx);
                    idx
                }
            };
            if let Some(i) = idx {
                students[i].registrations.push(r);
                total += 1;
            }
        }

        debug!(total, students = students.len(), "collected registrations");
        Ok(RegistrationsReport {
            total_registrations: total,
            students,
        })
    }

    #[instrument(name = "external_listings.service.student_activity", skip(self), fields(user_id = %who.user_id, student_id = %student_id))]
    pub async fn student_activity(
        &self,
        who: Identity,
        student_id: Uuid,
    ) -> Result<StudentActivity, DomainError> {
        who.require_role(Role::Organizer)?;
        let rows = self
            .repo
            .list_by_user(student_id, None)
            .await
            .map_err(db_err)?;
        if rows.is_empty() {
            return Err(DomainError::NoActivity);
        }
        let Some(user) = self.user(student_id).await? else {
            warn!("interactions exist for an unknown user");
            return Err(DomainError::NoActivity);
        };

        let (views, registrations) = rows
            .into_iter()
            .partition(|r| r.kind == InteractionKind::View);
        Ok(StudentActivity {
            student: student_info(&user),
            views,
            registrations,
        })
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        match self.users.get_user(id).await {
            Ok(u) => Ok(Some(u)),
            Err(IdentityError::NotFound { .. }) => Ok(None),
            Err(e) => Err(DomainError::database(e.to_string())),
        }
    }
}
