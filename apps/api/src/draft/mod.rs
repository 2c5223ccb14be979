// Resume draft: the in-memory document, its single-writer editing
// operations, advisory validation and the Markdown preview.

pub mod editing;
pub mod model;
pub mod preview;
pub mod validation;

pub use editing::{DraftEditor, EditError};
pub use model::{DraftSection, EntryId, PersonalDetailsPatch, ResumeDraft, SkillCategory};
