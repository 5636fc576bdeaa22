//! Built-in listings compiled into the binary and resolved once at startup.
//!
//! Dates in the source files are offsets in days; [`Catalog::load`] pins them
//! to the moment the catalog is built.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::contract::model::{Course, ExternalEvent, ExternalInternship};

const COURSES: &str = include_str!("../../catalog/courses.yaml");
const INTERNSHIPS: &str = include_str!("../../catalog/internships.yaml");
const EVENTS: &str = include_str!("../../catalog/events.yaml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CourseRow {
    title: String,
    instructor: String,
    platform: String,
    description: String,
    duration: String,
    level: String,
    price: String,
    topics: Vec<String>,
    modules: u32,
    enrolled: u64,
    rating: f32,
    thumbnail: String,
    certificate: bool,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InternshipRow {
    title: String,
    company: String,
    description: String,
    duration: String,
    stipend: String,
    location: String,
    work_mode: String,
    skills: Vec<String>,
    requirements: Vec<String>,
    responsibilities: Vec<String>,
    deadline_days: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventRow {
    title: String,
    description: String,
    kind: String,
    organizer: String,
    days_ahead: i64,
    capacity: u32,
    topics: Vec<String>,
}

/// "Amazon Web Services" -> "amazonwebservices"
fn domain_label(company: &str) -> String {
    company
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    internships: Vec<ExternalInternship>,
    events: Vec<ExternalEvent>,
}

impl Catalog {
    pub fn load(now: DateTime<Utc>) -> anyhow::Result<Self> {
        Self::from_yaml(COURSES, INTERNSHIPS, EVENTS, now)
    }

    pub fn from_yaml(
        courses: &str,
        internships: &str,
        events: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        let courses: Vec<CourseRow> =
            serde_yaml::from_str(courses).context("invalid course catalog")?;
        let internships: Vec<InternshipRow> =
            serde_yaml::from_str(internships).context("invalid internship catalog")?;
        let events: Vec<EventRow> =
            serde_yaml::from_str(events).context("invalid event catalog")?;

        let courses = courses
            .into_iter()
            .enumerate()
            .map(|(i, c)| Course {
                id: format!("curated-course-{}", i + 1),
                title: c.title,
                instructor: c.instructor,
                platform: c.platform,
                description: c.description,
                duration: c.duration,
                level: c.level,
                price: c.price,
                topics: c.topics,
                modules: c.modules,
                enrolled: c.enrolled,
                rating: c.rating,
                thumbnail: c.thumbnail,
                certificate: c.certificate,
                url: c.url,
                created_at: now,
            })
            .collect();

        let internships = internships
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let label = domain_label(&r.company);
                ExternalInternship {
                    id: format!("curated-intern-{}", i + 1),
                    title: r.title,
                    description: r.description,
                    kind: "internship".into(),
                    duration: r.duration,
                    stipend: r.stipend,
                    location: r.location,
                    work_mode: r.work_mode,
                    last_date: now + Duration::days(r.deadline_days),
                    skills: r.skills,
                    requirements: r.requirements,
                    responsibilities: r.responsibilities,
                    poster: format!("https://logo.clearbit.com/{label}.com"),
                    organizer_name: r.company.clone(),
                    url: format!("https://careers.{label}.com/internships"),
                    status: "Active".into(),
                    company: r.company,
                }
            })
            .collect();

        let events = events
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                let n = i + 1;
                ExternalEvent {
                    id: format!("tech-event-{n}"),
                    title: e.title,
                    description: e.description,
                    kind: e.kind,
                    date: now + Duration::days(e.days_ahead),
                    time: "10:00 AM".into(),
                    location: "Online".into(),
                    max_participants: e.capacity,
                    registration_fee: "Free".into(),
                    poster: format!("https://picsum.photos/seed/{n}/400/300"),
                    organizer_name: e.organizer,
                    url: format!("https://github.com/events/{n}"),
                    status: "live".into(),
                    is_free: true,
                    online_event: true,
                    topics: e.topics,
                }
            })
            .collect();

        Ok(Self {
            courses,
            internships,
            events,
        })
    }

    pub fn courses(&self, limit: usize) -> &[Course] {
        &self.courses[..limit.min(self.courses.len())]
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn internships(&self, limit: usize) -> &[ExternalInternship] {
        &self.internships[..limit.min(self.internships.len())]
    }

    pub fn internship(&self, id: &str) -> Option<&ExternalInternship> {
        self.internships.iter().find(|i| i.id == id)
    }

    pub fn events(&self, limit: usize) -> &[ExternalEvent] {
        &self.events[..limit.min(self.events.len())]
    }

    pub fn event(&self, id: &str) -> Option<&ExternalEvent> {
        self.events.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalogs_parse() {
        let now = Utc::now();
        let c = Catalog::load(now).unwrap();
        assert_eq!(c.courses(usize::MAX).len(), 15);
        assert_eq!(c.internships(usize::MAX).len(), 10);
        assert_eq!(c.events(usize::MAX).len(), 10);
        assert_eq!(c.courses(3).len(), 3);

        let course = c.course("curated-course-1").unwrap();
        assert!(course.title.starts_with("CS50"));
        assert!(c.course("curated-course-16").is_none());
    }

    #[test]
    fn internships_derive_links_from_the_company() {
        let now = Utc::now();
        let c = Catalog::load(now).unwrap();
        let aws = c
            .internships(usize::MAX)
            .iter()
            .find(|i| i.company == "Amazon Web Services")
            .unwrap();
        assert_eq!(aws.poster, "https://logo.clearbit.com/amazonwebservices.com");
        assert_eq!(aws.url, "https://careers.amazonwebservices.com/internships");
        assert_eq!(aws.organizer_name, aws.company);
        assert_eq!(aws.status, "Active");
        assert!(aws.last_date > now);
    }

    #[test]
    fn events_are_online_and_dated_from_load_time() {
        let now = Utc::now();
        let c = Catalog::load(now).unwrap();
        let e = c.event("tech-event-1").unwrap();
        assert_eq!(e.date, now + Duration::days(7));
        assert_eq!(e.time, "10:00 AM");
        assert_eq!(e.location, "Online");
        assert_eq!(e.status, "live");
        assert_eq!(e.poster, "https://picsum.photos/seed/1/400/300");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Catalog::from_yaml("- {title: x, bogus: 1}", "[]", "[]", Utc::now());
        assert!(err.is_err());
    }
}
