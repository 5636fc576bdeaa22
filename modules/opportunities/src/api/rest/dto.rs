use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    Applicant, Application, ApplicationStatus, ApplicationView, ApplyRequest, NewPosting, Posting,
    PostingKind, PostingPatch, PostingStatus, PostingSummary, Snapshot,
};
use crate::domain::filter::{parse_sort, Bound, Cmp, PostingFilter};

/// Accepts `["a","b"]` or the same array serialized into a string, as form
/// clients send it.
fn list_or_json<'de, D>(d: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::List(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(Some(Vec::new())),
        Some(Raw::Text(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("expected a JSON array of strings: {e}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostingDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PostingKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stipend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub last_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub organizer: Uuid,
    pub organizer_name: String,
    pub status: PostingStatus,
    pub views: i64,
    pub applicants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Posting> for PostingDto {
    fn from(p: Posting) -> Self {
        Self {
            id: p.id,
            kind: p.kind,
            title: p.title,
            description: p.description,
            company: p.company,
            location: p.location,
            stipend: p.stipend,
            duration: p.duration,
            last_date: p.last_date,
            start_date: p.start_date,
            tags: p.tags,
            skills: p.skills,
            requirements: p.requirements,
            responsibilities: p.responsibilities,
            poster: p.poster,
            organizer: p.organizer_id,
            organizer_name: p.organizer_name,
            status: p.status,
            views: p.views,
            applicants: p.applicants,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// List envelope, for the schema only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostingListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<PostingDto>,
}

/// Query string of `GET /opportunities`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListPostingsQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PostingKind>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub tag: Option<String>,
    pub skill: Option<String>,
    #[serde(rename = "views[gt]")]
    pub views_gt: Option<i64>,
    #[serde(rename = "views[gte]")]
    pub views_gte: Option<i64>,
    #[serde(rename = "views[lt]")]
    pub views_lt: Option<i64>,
    #[serde(rename = "views[lte]")]
    pub views_lte: Option<i64>,
    #[serde(rename = "lastDate[gt]")]
    pub last_date_gt: Option<DateTime<Utc>>,
    #[serde(rename = "lastDate[gte]")]
    pub last_date_gte: Option<DateTime<Utc>>,
    #[serde(rename = "lastDate[lt]")]
    pub last_date_lt: Option<DateTime<Utc>>,
    #[serde(rename = "lastDate[lte]")]
    pub last_date_lte: Option<DateTime<Utc>>,
    pub sort: Option<String>,
}

fn bounds<T: Copy>(pairs: [(Cmp, Option<T>); 4]) -> Vec<Bound<T>> {
    pairs
        .into_iter()
        .filter_map(|(cmp, v)| v.map(|value| Bound { cmp, value }))
        .collect()
}

impl TryFrom<ListPostingsQuery> for PostingFilter {
    type Error = String;

    fn try_from(q: ListPostingsQuery) -> Result<Self, Self::Error> {
        let sort = match q.sort.as_deref() {
            Some(spec) => parse_sort(spec).map_err(|bad| format!("Cannot sort by '{bad}'"))?,
            None => Vec::new(),
        };
        Ok(Self {
            search: q.search,
            kind: q.kind,
            location: q.location,
            company: q.company,
            tag: q.tag,
            skill: q.skill,
            views: bounds([
                (Cmp::Gt, q.views_gt),
                (Cmp::Gte, q.views_gte),
                (Cmp::Lt, q.views_lt),
                (Cmp::Lte, q.views_lte),
            ]),
            last_date: bounds([
                (Cmp::Gt, q.last_date_gt),
                (Cmp::Gte, q.last_date_gte),
                (Cmp::Lt, q.last_date_lt),
                (Cmp::Lte, q.last_date_lte),
            ]),
            sort,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostingReq {
    #[serde(rename = "type")]
    pub kind: Option<PostingKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub responsibilities: Option<Vec<String>>,
    /// Image URL.
    pub poster: Option<String>,
    /// Defaults to `Active`.
    pub status: Option<PostingStatus>,
}

impl From<CreatePostingReq> for NewPosting {
    fn from(r: CreatePostingReq) -> Self {
        Self {
            kind: r.kind,
            title: r.title.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            company: r.company,
            location: r.location,
            stipend: r.stipend,
            duration: r.duration,
            last_date: r.last_date,
            start_date: r.start_date,
            tags: r.tags.unwrap_or_default(),
            skills: r.skills.unwrap_or_default(),
            requirements: r.requirements.unwrap_or_default(),
            responsibilities: r.responsibilities.unwrap_or_default(),
            poster: r.poster,
            status: r.status,
        }
    }
}

/// Unknown keys, including `organizer`, are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePostingReq {
    #[serde(rename = "type")]
    pub kind: Option<PostingKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub responsibilities: Option<Vec<String>>,
    pub poster: Option<String>,
    pub status: Option<PostingStatus>,
}

impl From<UpdatePostingReq> for PostingPatch {
    fn from(r: UpdatePostingReq) -> Self {
        Self {
            kind: r.kind,
            title: r.title,
            description: r.description,
            company: r.company,
            location: r.location,
            stipend: r.stipend,
            duration: r.duration,
            last_date: r.last_date,
            start_date: r.start_date,
            tags: r.tags,
            skills: r.skills,
            requirements: r.requirements,
            responsibilities: r.responsibilities,
            poster: r.poster,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViewsDto {
    pub views: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReq {
    pub cover_letter: Option<String>,
    /// Resume URL.
    pub resume: Option<String>,
    pub notes: Option<String>,
}

impl From<ApplyReq> for ApplyRequest {
    fn from(r: ApplyReq) -> Self {
        Self {
            cover_letter: r.cover_letter,
            resume: r.resume,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StatusReq {
    /// One of `applied`, `in_review`, `interview`, `accepted`, `rejected`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationsQuery {
    pub opportunity: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostingSummaryDto {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PostingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub organizer_name: String,
}

impl From<PostingSummary> for PostingSummaryDto {
    fn from(s: PostingSummary) -> Self {
        Self {
            id: s.id,
            title: s.title,
            kind: s.kind,
            company: s.company,
            organizer_name: s.organizer_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
}

impl From<Applicant> for ApplicantDto {
    fn from(a: Applicant) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            resume_link: a.resume_link,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDto {
    pub id: Uuid,
    pub user: Uuid,
    pub opportunity: Uuid,
    pub status: ApplicationStatus,
    pub opportunity_snapshot: Snapshot,
    pub cover_letter: String,
    pub resume: String,
    pub notes: String,
    /// Current posting, absent when it has been deleted or is not requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunity_details: Option<PostingSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Application> for ApplicationDto {
    fn from(a: Application) -> Self {
        Self {
            id: a.id,
            user: a.user_id,
            opportunity: a.opportunity_id,
            status: a.status,
            opportunity_snapshot: a.snapshot,
            cover_letter: a.cover_letter,
            resume: a.resume,
            notes: a.notes,
            opportunity_details: None,
            applicant: None,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl From<ApplicationView> for ApplicationDto {
    fn from(v: ApplicationView) -> Self {
        let mut dto = Self::from(v.application);
        dto.opportunity_details = v.posting.map(Into::into);
        dto.applicant = v.applicant.map(Into::into);
        dto
    }
}

/// List envelope, for the schema only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ApplicationDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_accept_json_strings() {
        let r: CreatePostingReq = serde_json::from_value(serde_json::json!({
            "skills": "[\"rust\",\"sql\"]",
            "tags": ["backend"],
        }))
        .unwrap();
        assert_eq!(r.skills.unwrap(), vec!["rust", "sql"]);
        assert_eq!(r.tags.unwrap(), vec!["backend"]);
        assert!(r.requirements.is_none());
    }

    #[test]
    fn organizer_cannot_be_patched() {
        let err = serde_json::from_value::<UpdatePostingReq>(
            serde_json::json!({"organizer": Uuid::new_v4()}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn query_becomes_typed_filter() {
        let q = ListPostingsQuery {
            views_gte: Some(3),
            sort: Some("-views,title".into()),
            ..Default::default()
        };
        let f = PostingFilter::try_from(q).unwrap();
        assert_eq!(f.views.len(), 1);
        assert_eq!(f.views[0].cmp, Cmp::Gte);
        assert_eq!(f.sort.len(), 2);

        let bad = ListPostingsQuery {
            sort: Some("password".into()),
            ..Default::default()
        };
        assert_eq!(
            PostingFilter::try_from(bad).unwrap_err(),
            "Cannot sort by 'password'"
        );
    }
}
