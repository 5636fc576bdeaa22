//! Column helpers shared by module entities.

use sea_orm::{DbErr, FromJsonQueryResult, SqlErr};
use serde::{Deserialize, Serialize};

/// List of strings persisted as a JSON text column (tags, skills, badges).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

impl From<StringList> for Vec<String> {
    fn from(v: StringList) -> Self {
        v.0
    }
}

/// True when the statement failed on a unique index or primary key.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Same check for errors that went through `anyhow` context.
pub fn is_unique_violation_any(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(db) = e.downcast_ref::<DbErr>() {
            if is_unique_violation(db) {
                return true;
            }
        }
        cur = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_is_a_plain_json_array() {
        let v = serde_json::to_value(StringList(vec!["rust".into(), "sql".into()])).unwrap();
        assert_eq!(v, serde_json::json!(["rust", "sql"]));
    }

    #[test]
    fn unrelated_errors_are_not_conflicts() {
        assert!(!is_unique_violation(&DbErr::RecordNotFound("x".into())));
    }
}
