//! Wire format between the test process and a spawned prompt helper
//!
//! The parent serializes a [`BridgeRequest`] to JSON and passes it as the
//! helper's last argument. The helper prompts, writes a [`BridgeResult`] to
//! `OutFilePath` and exits 0. Any other exit code means the file is garbage.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::marshal::{OutputRow, ParameterTable};
use crate::types::{RETURN_VALUE_NAME, TypeDescriptor};

pub mod child;
pub mod parent;

pub use parent::{BridgeOutcome, ChildConsoleBridge};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeRequest {
    pub help_msg: String,
    pub return_param: Option<ReturnParam>,
    pub out_params: Vec<OutParam>,
    pub out_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReturnParam {
    pub title: String,
    pub parameter_name: String,
    pub parameter_index: usize,
    pub content: String,
    #[serde(rename = "Type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutParam {
    pub title: String,
    pub parameter_name: String,
    pub parameter_index: usize,
    #[serde(rename = "Type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeResult {
    #[serde(default)]
    pub return_value: Option<String>,
    #[serde(default)]
    pub out_arg_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub aborted: bool,
}

impl BridgeRequest {
    /// Describe the outputs of `table`; `help_msg` already holds the inputs.
    pub fn from_table(
        help_msg: impl Into<String>,
        table: &ParameterTable,
        out_file_path: PathBuf,
    ) -> Self {
        let return_param = table.return_slot().map(|slot| ReturnParam {
            title: RETURN_VALUE_NAME.to_string(),
            parameter_name: RETURN_VALUE_NAME.to_string(),
            parameter_index: 0,
            content: slot.text.clone(),
            type_name: slot.ty.underlying().type_name(),
        });
        let out_params = table
            .output_rows()
            .zip(&table.output_arg_indexes)
            .map(|(row, &index)| OutParam {
                title: row.name.clone(),
                parameter_name: row.name.clone(),
                parameter_index: index,
                type_name: row.ty.underlying().type_name(),
            })
            .collect();

        Self {
            help_msg: help_msg.into(),
            return_param,
            out_params,
            out_file_path,
        }
    }

    /// Rebuild a prompt table on the helper side.
    ///
    /// Only primitive type names are recognized; anything else is prompted as
    /// free text and validated by the parent.
    pub fn to_table(&self) -> ParameterTable {
        let resolve =
            |name: &str| TypeDescriptor::from_type_name(name).unwrap_or(TypeDescriptor::String);

        let mut out_args = Vec::with_capacity(self.out_params.len() + 1);
        if let Some(ret) = &self.return_param {
            out_args.push(OutputRow {
                name: ret.parameter_name.clone(),
                text: ret.content.clone(),
                ty: resolve(&ret.type_name),
                is_return_slot: true,
                default: None,
            });
        }
        for param in &self.out_params {
            out_args.push(OutputRow {
                name: param.parameter_name.clone(),
                text: String::new(),
                ty: resolve(&param.type_name),
                is_return_slot: false,
                default: None,
            });
        }

        ParameterTable {
            method: String::new(),
            in_args: Vec::new(),
            out_args,
            output_arg_indexes: self.out_params.iter().map(|p| p.parameter_index).collect(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::BridgeProtocol(format!("invalid bridge request: {e}")))
    }
}

impl BridgeResult {
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }

    /// Collect the answers held by a completed table.
    pub fn from_table(table: &ParameterTable) -> Self {
        Self {
            return_value: table.return_slot().map(|slot| slot.text.clone()),
            out_arg_values: table
                .output_rows()
                .map(|row| (row.name.clone(), row.text.clone()))
                .collect(),
            aborted: false,
        }
    }

    /// Check the answered keys against what the request asked for.
    pub fn validate(&self, request: &BridgeRequest) -> Result<()> {
        if self.aborted {
            return Ok(());
        }
        let expected: Vec<&str> = request
            .out_params
            .iter()
            .map(|p| p.parameter_name.as_str())
            .collect();
        let mut sorted = expected.clone();
        sorted.sort_unstable();
        let actual: Vec<&str> = self.out_arg_values.keys().map(String::as_str).collect();
        if sorted != actual {
            return Err(Error::BridgeProtocol(format!(
                "result keys {actual:?} do not match requested outputs {expected:?}"
            )));
        }
        if request.return_param.is_some() && self.return_value.is_none() {
            return Err(Error::BridgeProtocol(
                "result has no ReturnValue for a method that returns one".to_string(),
            ));
        }
        Ok(())
    }
}
