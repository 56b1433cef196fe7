pub mod prompt;

pub use prompt::prompt_command;
