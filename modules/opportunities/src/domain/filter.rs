//! Typed filter for the public posting listing.
//!
//! Only the fields below can be filtered or sorted on; anything else in the
//! query string is rejected before it reaches storage.

use chrono::{DateTime, Utc};

use crate::contract::model::PostingKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound<T> {
    pub cmp: Cmp,
    pub value: T,
}

impl<T: PartialOrd> Bound<T> {
    pub fn admits(&self, v: &T) -> bool {
        match self.cmp {
            Cmp::Gt => v > &self.value,
            Cmp::Gte => v >= &self.value,
            Cmp::Lt => v < &self.value,
            Cmp::Lte => v <= &self.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    LastDate,
    Views,
    Type,
    Company,
    Location,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            "title" => Self::Title,
            "lastDate" => Self::LastDate,
            "views" => Self::Views,
            "type" => Self::Type,
            "company" => Self::Company,
            "location" => Self::Location,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Parses `title,-views` style sort specs. Returns the offending token on error.
pub fn parse_sort(spec: &str) -> Result<Vec<SortKey>, String> {
    let mut keys = Vec::new();
    for raw in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw.strip_prefix('+').unwrap_or(raw), false),
        };
        let field = SortField::parse(name).ok_or_else(|| raw.to_owned())?;
        keys.push(SortKey { field, descending });
    }
    Ok(keys)
}

pub fn default_sort() -> Vec<SortKey> {
    vec![SortKey {
        field: SortField::CreatedAt,
        descending: true,
    }]
}

#[derive(Debug, Clone, Default)]
pub struct PostingFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub kind: Option<PostingKind>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub tag: Option<String>,
    pub skill: Option<String>,
    pub views: Vec<Bound<i64>>,
    pub last_date: Vec<Bound<DateTime<Utc>>>,
    /// Empty means newest first.
    pub sort: Vec<SortKey>,
}

impl PostingFilter {
    pub fn sort_keys(&self) -> Vec<SortKey> {
        if self.sort.is_empty() {
            default_sort()
        } else {
            self.sort.clone()
        }
    }

    pub fn has_list_criteria(&self) -> bool {
        self.tag.is_some() || self.skill.is_some()
    }

    /// Array-valued criteria, checked after the storage query.
    pub fn matches_lists(&self, tags: &[String], skills: &[String]) -> bool {
        let has = |want: &Option<String>, list: &[String]| {
            want.as_ref().is_none_or(|w| list.iter().any(|x| x == w))
        };
        has(&self.tag, tags) && has(&self.skill, skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_spec_parsing() {
        let keys = parse_sort("title,-views").unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey {
                    field: SortField::Title,
                    descending: false
                },
                SortKey {
                    field: SortField::Views,
                    descending: true
                },
            ]
        );
        assert_eq!(parse_sort("-password").unwrap_err(), "-password");
        assert!(parse_sort("").unwrap().is_empty());
    }

    #[test]
    fn empty_sort_means_newest_first() {
        assert_eq!(PostingFilter::default().sort_keys(), default_sort());
    }

    #[test]
    fn bounds() {
        let b = Bound {
            cmp: Cmp::Gte,
            value: 10,
        };
        assert!(b.admits(&10));
        assert!(!b.admits(&9));
        let b = Bound {
            cmp: Cmp::Lt,
            value: 10,
        };
        assert!(b.admits(&9));
        assert!(!b.admits(&10));
    }

    #[test]
    fn list_criteria() {
        let f = PostingFilter {
            tag: Some("rust".into()),
            ..Default::default()
        };
        assert!(f.matches_lists(&["go".into(), "rust".into()], &[]));
        assert!(!f.matches_lists(&["go".into()], &["rust".into()]));
        assert!(PostingFilter::default().matches_lists(&[], &[]));
        assert!(f.has_list_criteria());
        assert!(!PostingFilter::default().has_list_criteria());
    }
}
