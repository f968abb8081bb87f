pub mod directory;
pub mod workflow;

pub use directory::DirectoryService;
pub use workflow::ConnectionService;
