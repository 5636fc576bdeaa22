//! Bearer-token access control.
//!
//! [`TokenCodec`] issues and verifies HS256 session tokens. The ingress installs an
//! `Arc<TokenCodec>` as a request extension; [`Identity`] is the extractor handlers
//! take to require an authenticated caller. Role gates live on `Identity`; ownership
//! checks stay in each module's service.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use chrono::{DateTime, Utc};
use http::request::Parts;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::problem::{self, ProblemResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organizer => "organizer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "organizer" => Ok(Role::Organizer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,
    #[error("Not authorized, token failed")]
    InvalidToken,
    #[error("User role {role} is not authorized to access this route")]
    RoleNotAllowed { role: Role },
    #[error("token codec is not installed")]
    NotConfigured,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<AuthError> for ProblemResponse {
    fn from(e: AuthError) -> Self {
        match &e {
            AuthError::MissingToken | AuthError::InvalidToken => problem::unauthorized(e.to_string()),
            AuthError::RoleNotAllowed { .. } => problem::forbidden(e.to_string()),
            AuthError::NotConfigured | AuthError::Signing(_) => {
                problem::internal_error(e.to_string())
            }
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn require_role(&self, role: Role) -> Result<(), AuthError> {
        self.require_any(&[role])
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), AuthError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = %self.role, "role gate rejected caller");
            Err(AuthError::RoleNotAllowed { role: self.role })
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    iat: i64,
    exp: i64,
}

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.encode(&claims)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::Signing)
    }

    /// Signature and expiry only; there is no revocation list.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("expired token"),
                    other => tracing::debug!(error = ?other, "rejected token"),
                }
                AuthError::InvalidToken
            })?;
        Ok(Identity {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    let raw = parts.headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let codec = parts
            .extensions
            .get::<Arc<TokenCodec>>()
            .cloned()
            .ok_or(AuthError::NotConfigured)?;
        let token = bearer(parts).ok_or(AuthError::MissingToken)?;
        Ok(codec.verify(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(3600))
    }

    #[test]
    fn issue_then_verify() {
        let c = codec();
        let id = Uuid::new_v4();
        let t = c.issue(id, Role::Organizer).unwrap();
        assert!(t.expires_at > Utc::now());

        let who = c.verify(&t.token).unwrap();
        assert_eq!(who.user_id, id);
        assert_eq!(who.role, Role::Organizer);
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let c = codec();
        let past = Utc::now().timestamp() - 10;
        let expired = c
            .encode(&Claims {
                sub: Uuid::new_v4(),
                role: Role::Student,
                iat: past - 100,
                exp: past,
            })
            .unwrap();
        assert!(matches!(c.verify(&expired), Err(AuthError::InvalidToken)));

        let other = TokenCodec::new(b"another-secret-another-secret-xx", Duration::from_secs(60));
        let foreign = other.issue(Uuid::new_v4(), Role::Student).unwrap();
        assert!(matches!(c.verify(&foreign.token), Err(AuthError::InvalidToken)));
        assert!(matches!(c.verify("not-a-jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn role_gate_messages() {
        let who = Identity {
            user_id: Uuid::new_v4(),
            role: Role::Student,
        };
        assert!(who.require_role(Role::Student).is_ok());
        let err = who.require_role(Role::Organizer).unwrap_err();
        assert_eq!(
            err.to_string(),
            "User role student is not authorized to access this route"
        );
        let p = ProblemResponse::from(err);
        assert_eq!(p.0.status, 403);
    }

    #[test]
    fn role_parsing() {
        assert_eq!("organizer".parse::<Role>().unwrap(), Role::Organizer);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_value(Role::Student).unwrap(), "student");
    }

    async fn whoami(who: Identity) -> String {
        who.role.to_string()
    }

    fn app(codec: Arc<TokenCodec>) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(Extension(codec))
    }

    async fn call(app: Router, auth: Option<&str>) -> (u16, serde_json::Value) {
        let mut req = Request::builder().uri("/me");
        if let Some(a) = auth {
            req = req.header("authorization", a);
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status().as_u16();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn extractor_accepts_valid_bearer() {
        let c = Arc::new(codec());
        let t = c.issue(Uuid::new_v4(), Role::Student).unwrap();
        let resp = app(c)
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header("authorization", format!("Bearer {}", t.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"student");
    }

    #[tokio::test]
    async fn extractor_rejections() {
        let c = Arc::new(codec());

        let (status, body) = call(app(c.clone()), None).await;
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Not authorized, no token");
        assert_eq!(body["success"], false);

        let (status, body) = call(app(c.clone()), Some("Basic abc")).await;
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = call(app(c), Some("Bearer garbage")).await;
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Not authorized, token failed");
    }
}
