use chrono::{DateTime, Utc};
use modkit::Role;
use uuid::Uuid;

/// Role-specific part of an account. The role is the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Student {
        resume_link: String,
        badges: Vec<String>,
    },
    Organizer {
        organization_name: Option<String>,
        contact_info: Option<String>,
    },
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Student { .. } => Role::Student,
            Profile::Organizer { .. } => Role::Organizer,
        }
    }

    /// Empty profile for a freshly registered account.
    pub fn blank(role: Role) -> Self {
        match role {
            Role::Student => Profile::Student {
                resume_link: String::new(),
                badges: Vec::new(),
            },
            Role::Organizer => Profile::Organizer {
                organization_name: None,
                contact_info: None,
            },
        }
    }

    pub fn organization_name(&self) -> Option<&str> {
        match self {
            Profile::Organizer {
                organization_name, ..
            } => organization_name.as_deref(),
            Profile::Student { .. } => None,
        }
    }
}

/// Account as other modules see it. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Organization name when set, otherwise the person's name.
    pub fn display_company(&self) -> &str {
        self.profile
            .organization_name()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Registration input. Organizer-only fields are dropped for students.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub organization_name: Option<String>,
    pub contact_info: Option<String>,
}

/// Self-service profile edit.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub resume_link: Option<String>,
    pub badges: Option<Vec<String>>,
    pub organization_name: Option<String>,
    pub contact_info: Option<String>,
}

/// A user together with a session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
