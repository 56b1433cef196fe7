//! Interactive backend: a human answers each call
//!
//! The prompt protocol is the same whether the human sits at this process's
//! console or at a spawned helper: show the call, ask for a decision, then
//! ask for each output in declaration order until it parses.

use tracing::{debug, warn};

use crate::bridge::{BridgeOutcome, BridgeResult, ChildConsoleBridge};
use crate::codec::{self, FormatError};
use crate::dispatch::{DispatchRequest, DispatchResult};
use crate::error::{Error, Result};
use crate::marshal::{self, OutputRow, ParameterTable};
use crate::types::TypeDescriptor;

use super::AdapterBackend;

/// Human-facing half of the prompt protocol
pub trait Prompter: Send {
    /// Show the help text and the input parameters.
    fn show_call(&mut self, help: &str, table: &ParameterTable) -> Result<()>;

    /// Ask whether to go on. `Fail` is only offered when `allow_failure`.
    fn decide(&mut self, allow_failure: bool) -> Result<Decision>;

    /// Ask for one output row's text, defaults already applied.
    fn ask(&mut self, row: &OutputRow) -> Result<String>;

    /// Tell the human an answer did not parse.
    fn reject(&mut self, row: &OutputRow, error: &FormatError) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Fail,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Completed,
    Aborted,
}

/// Drive one call through a prompter, writing answers into `table`.
pub fn run_prompt_protocol(
    prompter: &mut dyn Prompter,
    help: &str,
    table: &mut ParameterTable,
) -> Result<PromptOutcome> {
    prompter.show_call(help, table)?;

    // bool and integer return values come from the decision itself
    let derived_return = table
        .return_slot()
        .is_some_and(|slot| slot.ty.is_bool() || slot.ty.is_integer());

    let decision = prompter.decide(derived_return)?;
    if decision == Decision::Abort {
        return Ok(PromptOutcome::Aborted);
    }
    if derived_return {
        if let Some(slot) = table.return_slot_mut() {
            slot.text = decision_text(&slot.ty, decision == Decision::Continue);
        }
    }

    for row in table.out_args.iter_mut() {
        if row.is_return_slot && derived_return {
            continue;
        }
        loop {
            let answer = prompter.ask(row)?;
            match codec::parse(&row.ty, Some(&answer)) {
                Ok(_) => {
                    row.text = answer;
                    break;
                }
                Err(Error::Format(err)) => prompter.reject(row, &err)?,
                Err(other) => return Err(other),
            }
        }
    }

    Ok(PromptOutcome::Completed)
}

fn decision_text(ty: &TypeDescriptor, success: bool) -> String {
    let text = match (ty.is_bool(), success) {
        (true, true) => "true",
        (true, false) => "false",
        (false, true) => "1",
        (false, false) => "0",
    };
    text.to_string()
}

fn extract_answers(table: &ParameterTable, result: &BridgeResult) -> Result<DispatchResult> {
    let raw: Vec<String> = table
        .output_rows()
        .map(|row| {
            result
                .out_arg_values
                .get(&row.name)
                .cloned()
                .unwrap_or_default()
        })
        .collect();
    marshal::extract_results(table, &raw, result.return_value.as_deref())
}

enum Channel {
    InProcess(Box<dyn Prompter>),
    Helper(ChildConsoleBridge),
}

pub struct InteractiveBackend {
    channel: Channel,
}

impl InteractiveBackend {
    /// Prompt in the current process.
    pub fn in_process(prompter: Box<dyn Prompter>) -> Self {
        Self {
            channel: Channel::InProcess(prompter),
        }
    }

    /// Prompt from a spawned helper process.
    pub fn spawned(bridge: ChildConsoleBridge) -> Self {
        Self {
            channel: Channel::Helper(bridge),
        }
    }
}

impl AdapterBackend for InteractiveBackend {
    fn name(&self) -> &'static str {
        match self.channel {
            Channel::InProcess(_) => "interactive",
            Channel::Helper(_) => "interactive-process",
        }
    }

    fn invoke(&mut self, request: &DispatchRequest) -> Result<DispatchResult> {
        let help = request
            .signature
            .help
            .clone()
            .unwrap_or_else(|| {
                format!("Perform '{}' on the system under test.", request.method())
            });
        let mut table = marshal::build(&request.signature, &request.in_args)?;
        debug!(
            token = %request.token,
            table = %serde_json::to_string(&table)?,
            "prompting for call"
        );

        match &mut self.channel {
            Channel::InProcess(prompter) => {
                match run_prompt_protocol(prompter.as_mut(), &help, &mut table)? {
                    PromptOutcome::Aborted => Ok(DispatchResult::aborted("aborted by user")),
                    PromptOutcome::Completed => table.extract(),
                }
            }
            Channel::Helper(bridge) => {
                // the helper cannot validate enum or custom types, so rejected
                // answers send the whole call back with the reason attached
                let mut prompt = help.clone();
                loop {
                    let result = match bridge.call(&prompt, &table)? {
                        BridgeOutcome::Aborted => {
                            return Ok(DispatchResult::aborted("aborted by user"));
                        }
                        BridgeOutcome::Completed(result) => result,
                    };
                    match extract_answers(&table, &result) {
                        Err(Error::Format(err)) => {
                            warn!(token = %request.token, "helper answer rejected: {err}");
                            prompt =
                                format!("Invalid value: {err}. Please answer again.\n\n{help}");
                        }
                        outcome => return outcome,
                    }
                }
            }
        }
    }

    fn dispose(&mut self) -> Result<()> {
        if let Channel::Helper(bridge) = &self.channel {
            bridge.cancellation().cancel();
        }
        Ok(())
    }
}
