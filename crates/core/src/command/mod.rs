//! Child process commands used by the helper bridge and script backends

pub mod child_command;

// Re-export commonly used types
pub use child_command::{ChildCommand, CommandType};
