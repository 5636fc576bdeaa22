use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Course not found")]
    CourseNotFound { id: String },

    #[error("Internship not found")]
    InternshipNotFound { id: String },

    #[error("Event not found")]
    EventNotFound { id: String },

    #[error("No activity found for this student")]
    NoActivity,

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<modkit::AuthError> for DomainError {
    fn from(e: modkit::AuthError) -> Self {
        Self::Forbidden {
            message: e.to_string(),
        }
    }
}
