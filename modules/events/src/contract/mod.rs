pub mod model;

pub use model::{Event, EventKind, EventPatch, EventQuery, EventRegistration, EventStatus, NewEvent};
