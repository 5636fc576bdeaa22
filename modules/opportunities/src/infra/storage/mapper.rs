use anyhow::anyhow;
use sea_orm::Set;
use uuid::Uuid;

use crate::contract::model::{Application, Posting};
use crate::infra::storage::entity::{application, posting};

/// Rebuilds a posting from its row and applicant ids.
pub fn posting_from_row(m: posting::Model, applicants: Vec<Uuid>) -> anyhow::Result<Posting> {
    Ok(Posting {
        id: m.id,
        kind: m.kind.parse().map_err(|e: String| anyhow!(e))?,
        title: m.title,
        description: m.description,
        company: m.company,
        location: m.location,
        stipend: m.stipend,
        duration: m.duration,
        last_date: m.last_date,
        start_date: m.start_date,
        tags: m.tags.into(),
        skills: m.skills.into(),
        requirements: m.requirements.into(),
        responsibilities: m.responsibilities.into(),
        poster: m.poster,
        organizer_id: m.organizer_id,
        organizer_name: m.organizer_name,
        status: m.status.parse().map_err(|e: String| anyhow!(e))?,
        views: m.views,
        applicants,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Every column except `views`, which only the counter statement writes.
pub fn posting_active_model(p: Posting) -> posting::ActiveModel {
    posting::ActiveModel {
        id: Set(p.id),
        kind: Set(p.kind.as_str().to_owned()),
        title: Set(p.title),
        description: Set(p.description),
        company: Set(p.company),
        location: Set(p.location),
        stipend: Set(p.stipend),
        duration: Set(p.duration),
        last_date: Set(p.last_date),
        start_date: Set(p.start_date),
        tags: Set(p.tags.into()),
        skills: Set(p.skills.into()),
        requirements: Set(p.requirements.into()),
        responsibilities: Set(p.responsibilities.into()),
        poster: Set(p.poster),
        organizer_id: Set(p.organizer_id),
        organizer_name: Set(p.organizer_name),
        status: Set(p.status.as_str().to_owned()),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
        ..Default::default()
    }
}

impl TryFrom<application::Model> for Application {
    type Error = anyhow::Error;

    fn try_from(m: application::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            user_id: m.user_id,
            opportunity_id: m.opportunity_id,
            status: m.status.parse().map_err(|e: String| anyhow!(e))?,
            snapshot: m.snapshot.0,
            cover_letter: m.cover_letter,
            resume: m.resume,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl From<Application> for application::ActiveModel {
    fn from(a: Application) -> Self {
        Self {
            id: Set(a.id),
            user_id: Set(a.user_id),
            opportunity_id: Set(a.opportunity_id),
            status: Set(a.status.as_str().to_owned()),
            snapshot: Set(application::SnapshotJson(a.snapshot)),
            cover_letter: Set(a.cover_letter),
            resume: Set(a.resume),
            notes: Set(a.notes),
            created_at: Set(a.created_at),
            updated_at: Set(a.updated_at),
        }
    }
}
