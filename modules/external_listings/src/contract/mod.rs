pub mod model;

pub use model::{Course, ExternalEvent, ExternalInternship, Interaction, InteractionKind};
