use std::sync::{Arc, LazyLock};

use chrono::Utc;
use modkit::{Role, TokenCodec};
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{NewUser, Profile, ProfilePatch, Session, User};
use crate::domain::error::DomainError;
use crate::domain::password;
use crate::domain::repo::{StoredUser, UsersRepository};

static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$"));

/// Rejects everything if the pattern failed to compile.
fn is_valid_email(email: &str) -> bool {
    match EMAIL_RE.as_ref() {
        Ok(re) => re.is_match(email),
        Err(e) => {
            tracing::error!(error = %e, "email pattern failed to compile");
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bcrypt_cost: u32,
    pub min_password_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            min_password_len: 6,
        }
    }
}

/// Accounts, credentials and sessions.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    tokens: Arc<TokenCodec>,
    config: ServiceConfig,
    /// Checked against on unknown emails so both login failures cost one bcrypt verify.
    dummy_hash: Arc<OnceCell<String>>,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>, tokens: Arc<TokenCodec>, config: ServiceConfig) -> Self {
        Self {
            repo,
            tokens,
            config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    async fn dummy_hash(&self) -> Result<String, DomainError> {
        self.dummy_hash
            .get_or_try_init(|| password::hash(Uuid::new_v4().to_string(), self.config.bcrypt_cost))
            .await
            .cloned()
    }

    fn session(&self, user: User) -> Result<Session, DomainError> {
        let issued = self
            .tokens
            .issue(user.id, user.role())
            .map_err(|e| DomainError::Token {
                message: e.to_string(),
            })?;
        Ok(Session {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    #[instrument(name = "identity.service.register", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<Session, DomainError> {
        if blank(&new_user.name) || blank(&new_user.email) || new_user.password.is_empty() {
            return Err(DomainError::validation("Please add all required fields"));
        }
        if !is_valid_email(&new_user.email) {
            return Err(DomainError::validation("Please add a valid email"));
        }
        self.validate_password(&new_user.password)?;

        if self.repo.email_exists(&new_user.email).await.map_err(db_err)? {
            return Err(DomainError::email_already_exists(new_user.email));
        }

        let role = new_user.role.unwrap_or(Role::Student);
        let profile = match role {
            Role::Student => Profile::blank(Role::Student),
            Role::Organizer => Profile::Organizer {
                organization_name: new_user.organization_name,
                contact_info: new_user.contact_info,
            },
        };
        let password_hash = password::hash(new_user.password, self.config.bcrypt_cost).await?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            profile,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self
            .repo
            .insert(StoredUser {
                user: user.clone(),
                password_hash,
            })
            .await
        {
            // lost a race with a concurrent registration
            if modkit_db::is_unique_violation_any(e.as_ref()) {
                return Err(DomainError::email_already_exists(user.email));
            }
            return Err(db_err(e));
        }

        info!(user_id = %user.id, role = %role, "user registered");
        self.session(user)
    }

    #[instrument(name = "identity.service.login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let Some(stored) = self.repo.find_by_email(email).await.map_err(db_err)? else {
            debug!("login for unknown email");
            password::verify(password.to_owned(), self.dummy_hash().await?).await?;
            return Err(DomainError::InvalidCredentials);
        };
        if !password::verify(password.to_owned(), stored.password_hash).await? {
            warn!(user_id = %stored.user.id, "login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }
        info!(user_id = %stored.user.id, "user logged in");
        self.session(stored.user)
    }

    #[instrument(name = "identity.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        debug!("loading user");
        self.repo
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    /// Edits the caller's name and the fields of its own profile variant.
    #[instrument(name = "identity.service.update_profile", skip(self, patch), fields(user_id = %id))]
    pub async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User, DomainError> {
        let mut user = self.get_user(id).await?;

        if let Some(name) = patch.name {
            if blank(&name) {
                return Err(DomainError::validation("Name cannot be empty"));
            }
            user.name = name;
        }

        match &mut user.profile {
            Profile::Student {
                resume_link,
                badges,
            } => {
                if patch.organization_name.is_some() || patch.contact_info.is_some() {
                    return Err(DomainError::validation(
                        "Organization fields apply to organizers only",
                    ));
                }
                if let Some(link) = patch.resume_link {
                    *resume_link = link;
                }
                if let Some(b) = patch.badges {
                    *badges = b;
                }
            }
            Profile::Organizer {
                organization_name,
                contact_info,
            } => {
                if patch.resume_link.is_some() || patch.badges.is_some() {
                    return Err(DomainError::validation(
                        "Resume and badges apply to students only",
                    ));
                }
                if let Some(org) = patch.organization_name {
                    *organization_name = Some(org);
                }
                if let Some(c) = patch.contact_info {
                    *contact_info = Some(c);
                }
            }
        }

        user.updated_at = Utc::now();
        self.repo.update(user.clone()).await.map_err(db_err)?;
        info!("profile updated");
        Ok(user)
    }

    /// Administrative reset; there is no HTTP route for it.
    #[instrument(name = "identity.service.reset_password", skip(self, new_password), fields(email = %email))]
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), DomainError> {
        self.validate_password(new_password)?;
        let stored = self
            .repo
            .find_by_email(email)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::email_not_found(email))?;
        let hash = password::hash(new_password.to_owned(), self.config.bcrypt_cost).await?;
        if !self
            .repo
            .set_password_hash(stored.user.id, hash)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::email_not_found(email));
        }
        info!(user_id = %stored.user.id, "password reset");
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_len {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_len
            )));
        }
        Ok(())
    }
}
