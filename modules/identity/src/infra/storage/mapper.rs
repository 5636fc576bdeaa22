use modkit::Role;
use sea_orm::Set;

use crate::contract::model::{Profile, User};
use crate::domain::repo::StoredUser;
use crate::infra::storage::entity::{ActiveModel, Model};

impl TryFrom<Model> for StoredUser {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> anyhow::Result<Self> {
        let role: Role = m
            .role
            .parse()
            .map_err(|e: String| anyhow::anyhow!("user {}: {e}", m.id))?;
        let profile = match role {
            Role::Student => Profile::Student {
                resume_link: m.resume_link.unwrap_or_default(),
                badges: m.badges.into(),
            },
            Role::Organizer => Profile::Organizer {
                organization_name: m.organization_name,
                contact_info: m.contact_info,
            },
        };
        Ok(StoredUser {
            user: User {
                id: m.id,
                name: m.name,
                email: m.email,
                profile,
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
            password_hash: m.password_hash,
        })
    }
}

/// Profile columns; the fields of the other variant are stored as NULL/empty.
pub(crate) fn apply_user(am: &mut ActiveModel, u: User) {
    am.role = Set(u.profile.role().as_str().to_owned());
    match u.profile {
        Profile::Student {
            resume_link,
            badges,
        } => {
            am.resume_link = Set(Some(resume_link));
            am.badges = Set(badges.into());
            am.organization_name = Set(None);
            am.contact_info = Set(None);
        }
        Profile::Organizer {
            organization_name,
            contact_info,
        } => {
            am.resume_link = Set(None);
            am.badges = Set(Default::default());
            am.organization_name = Set(organization_name);
            am.contact_info = Set(contact_info);
        }
    }
    am.id = Set(u.id);
    am.name = Set(u.name);
    am.email = Set(u.email);
    am.created_at = Set(u.created_at);
    am.updated_at = Set(u.updated_at);
}
