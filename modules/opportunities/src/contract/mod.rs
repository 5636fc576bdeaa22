pub mod model;

pub use model::{Application, ApplicationStatus, Posting, PostingKind, PostingStatus};
