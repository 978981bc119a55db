//! Domain collections: tags, notebooks and notes.

mod grouping;
mod notebooks;
mod notes;
mod tags;

pub use grouping::Grouping;
pub use notebooks::{NotebookDraft, Notebooks};
pub use notes::{NoteDraft, Notes};
pub use tags::Tags;
