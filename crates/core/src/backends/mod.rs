//! Backend variants that realize adapter calls
//!
//! Every variant honors the same contract: take one [`DispatchRequest`] and
//! produce a [`DispatchResult`] whose output values follow declaration order.

use crate::dispatch::{DispatchRequest, DispatchResult};
use crate::error::Result;

pub mod interactive;
pub mod managed;
pub mod shell;

pub use interactive::{Decision, InteractiveBackend, PromptOutcome, Prompter, run_prompt_protocol};
pub use managed::{ManagedBackend, ManagedHandler};
pub use shell::ShellBackend;

/// Core trait that all adapter backends must implement
pub trait AdapterBackend: Send {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Realize one business call
    fn invoke(&mut self, request: &DispatchRequest) -> Result<DispatchResult>;

    /// Return to a clean state between test cases
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release queues, handles and child processes
    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}
