//! bcrypt on the blocking pool.

use crate::domain::error::DomainError;

pub async fn hash(password: String, cost: u32) -> Result<String, DomainError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| DomainError::Hashing {
            message: e.to_string(),
        })?
        .map_err(|e| DomainError::Hashing {
            message: e.to_string(),
        })
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify(password: String, hash: String) -> Result<bool, DomainError> {
    let joined = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::Hashing {
            message: e.to_string(),
        })?;
    match joined {
        Ok(ok) => Ok(ok),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be checked");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let h = hash("secret1".into(), 4).await.unwrap();
        assert!(h.starts_with("$2"));
        assert!(verify("secret1".into(), h.clone()).await.unwrap());
        assert!(!verify("secret2".into(), h).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_a_mismatch() {
        assert!(!verify("x".into(), "not-a-hash".into()).await.unwrap());
    }
}
