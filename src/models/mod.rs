pub mod backup;
pub mod media;
pub mod note;
pub mod prompt;
pub mod tag;
pub mod tool;

pub use backup::{Backup, TableResult};
pub use media::{MediaItem, MediaType};
pub use note::Note;
pub use prompt::{Prompt, PromptType};
pub use tool::{Tool, ToolWithTags};
