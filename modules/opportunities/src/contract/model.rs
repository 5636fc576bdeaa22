use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostingKind {
    Event,
    Internship,
    Course,
}

impl PostingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Internship => "internship",
            Self::Course => "course",
        }
    }
}

impl FromStr for PostingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "event" => Self::Event,
            "internship" => Self::Internship,
            "course" => Self::Course,
            other => return Err(format!("unknown opportunity type '{other}'")),
        })
    }
}

/// Only `Active` postings appear in the public listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PostingStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

impl PostingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Closed => "Closed",
            Self::Draft => "Draft",
        }
    }
}

impl FromStr for PostingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Active" => Self::Active,
            "Closed" => Self::Closed,
            "Draft" => Self::Draft,
            other => return Err(format!("unknown opportunity status '{other}'")),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub id: Uuid,
    pub kind: PostingKind,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: String,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub last_date: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub poster: Option<String>,
    pub organizer_id: Uuid,
    pub organizer_name: String,
    pub status: PostingStatus,
    pub views: i64,
    pub applicants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Posting {
    /// Fields frozen into an application at apply time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            company: self.company.clone(),
            kind: self.kind,
            location: self.location.clone(),
            stipend: self.stipend.clone(),
            duration: self.duration.clone(),
            description: self.description.clone(),
            requirements: self.requirements.clone(),
            skills: self.skills.clone(),
            responsibilities: self.responsibilities.clone(),
            deadline: self.last_date,
            start_date: self.start_date,
        }
    }

    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.organizer_id == user
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPosting {
    pub kind: Option<PostingKind>,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub poster: Option<String>,
    pub status: Option<PostingStatus>,
}

/// Partial update; the organizer cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct PostingPatch {
    pub kind: Option<PostingKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub last_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    pub poster: Option<String>,
    pub status: Option<PostingStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    InReview,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::InReview => "in_review",
            Self::Interview => "interview",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "applied" => Self::Applied,
            "in_review" => Self::InReview,
            "interview" => Self::Interview,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            other => return Err(format!("Invalid status '{other}'")),
        })
    }
}

/// Posting fields as they were when the student applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub title: String,
    pub company: Option<String>,
    #[serde(rename = "type")]
    pub kind: PostingKind,
    pub location: String,
    pub stipend: Option<String>,
    pub duration: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub responsibilities: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub opportunity_id: Uuid,
    pub status: ApplicationStatus,
    pub snapshot: Snapshot,
    pub cover_letter: String,
    pub resume: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    pub notes: Option<String>,
}

/// Current state of the posting an application points at.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingSummary {
    pub id: Uuid,
    pub title: String,
    pub kind: PostingKind,
    pub company: Option<String>,
    pub organizer_name: String,
}

impl From<&Posting> for PostingSummary {
    fn from(p: &Posting) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            kind: p.kind,
            company: p.company.clone(),
            organizer_name: p.organizer_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_link: Option<String>,
}

/// An application joined with whatever the caller is allowed to see around it.
#[derive(Debug, Clone)]
pub struct ApplicationView {
    pub application: Application,
    pub posting: Option<PostingSummary>,
    pub applicant: Option<Applicant>,
}
