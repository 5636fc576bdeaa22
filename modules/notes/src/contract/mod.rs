pub mod model;

pub use model::{NewNote, Note, NotePatch, NoteQuery};
