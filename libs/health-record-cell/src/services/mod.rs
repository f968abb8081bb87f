pub mod notes;
pub mod records;

pub use notes::NoteService;
pub use records::RecordService;
