pub mod chat;
pub mod run;
pub mod schema;
pub mod text;

pub use chat::{ChatMessage, Role};
pub use run::{EntryOutOfBounds, LabelEntry, LabelRun, RunMetadata};
pub use text::{DUPLICATE_THRESHOLD, build_digest, clean_label, too_many_duplicates};
