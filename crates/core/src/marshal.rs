//! Parameter marshaling
//!
//! Turns a signature plus live input values into a flat, ordered table of
//! named text rows, and turns a completed table back into typed results.
//! Output rows always follow declaration order; callers index results
//! positionally, so that order is what makes composition correct.

use serde::Serialize;

use crate::codec;
use crate::dispatch::DispatchResult;
use crate::error::{Error, Result};
use crate::types::{MethodSignature, RETURN_VALUE_NAME, TypeDescriptor, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputRow {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub name: String,
    /// Starts as the default (or empty); backends overwrite it with results.
    pub text: String,
    #[serde(rename = "type", serialize_with = "serialize_type_name")]
    pub ty: TypeDescriptor,
    pub is_return_slot: bool,
    pub default: Option<String>,
}

fn serialize_type_name<S>(
    ty: &TypeDescriptor,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&ty.underlying().type_name())
}

/// Flat, ordered view of one call's parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterTable {
    pub method: String,
    pub in_args: Vec<InputRow>,
    /// Return slot first when the method returns a value, then outputs.
    pub out_args: Vec<OutputRow>,
    /// Position of each output parameter in the full parameter list.
    pub output_arg_indexes: Vec<usize>,
}

impl ParameterTable {
    pub fn return_slot(&self) -> Option<&OutputRow> {
        self.out_args.first().filter(|row| row.is_return_slot)
    }

    pub fn return_slot_mut(&mut self) -> Option<&mut OutputRow> {
        self.out_args.first_mut().filter(|row| row.is_return_slot)
    }

    /// True output parameters, excluding the return slot.
    pub fn output_rows(&self) -> impl Iterator<Item = &OutputRow> {
        self.out_args.iter().filter(|row| !row.is_return_slot)
    }

    pub fn output_row_mut(&mut self, name: &str) -> Option<&mut OutputRow> {
        self.out_args
            .iter_mut()
            .find(|row| !row.is_return_slot && row.name == name)
    }

    /// Decode the texts currently held by the output rows.
    pub fn extract(&self) -> Result<DispatchResult> {
        let raw: Vec<String> = self.output_rows().map(|row| row.text.clone()).collect();
        let return_raw = self.return_slot().map(|row| row.text.as_str());
        extract_results(self, &raw, return_raw)
    }
}

/// Build the parameter table for a call.
///
/// `input_values` holds one value per input parameter, in declaration order.
pub fn build(signature: &MethodSignature, input_values: &[Value]) -> Result<ParameterTable> {
    let shape = signature.shape();
    if shape.input_count() != input_values.len() {
        return Err(Error::SignatureMismatch {
            method: signature.name.clone(),
            expected: shape.input_count(),
            actual: input_values.len(),
        });
    }

    let in_args = shape
        .input_indexes()
        .iter()
        .zip(input_values)
        .map(|(&index, value)| InputRow {
            name: signature.parameters[index].name.clone(),
            text: codec::display(value),
        })
        .collect();

    let mut out_args = Vec::with_capacity(shape.output_count() + 1);
    if let Some(return_type) = &signature.return_type {
        out_args.push(OutputRow {
            name: RETURN_VALUE_NAME.to_string(),
            text: String::new(),
            ty: return_type.clone(),
            is_return_slot: true,
            default: None,
        });
    }
    for &index in shape.output_indexes() {
        let parameter = &signature.parameters[index];
        out_args.push(OutputRow {
            name: parameter.name.clone(),
            text: parameter.default.clone().unwrap_or_default(),
            ty: parameter.ty.clone(),
            is_return_slot: false,
            default: parameter.default.clone(),
        });
    }

    Ok(ParameterTable {
        method: signature.name.clone(),
        in_args,
        out_args,
        output_arg_indexes: shape.output_indexes().to_vec(),
    })
}

/// Decode raw output texts into typed results, in declaration order.
pub fn extract_results(
    table: &ParameterTable,
    raw_outputs: &[String],
    return_raw: Option<&str>,
) -> Result<DispatchResult> {
    let rows: Vec<&OutputRow> = table.output_rows().collect();
    if rows.len() != raw_outputs.len() {
        return Err(Error::SignatureMismatch {
            method: table.method.clone(),
            expected: rows.len(),
            actual: raw_outputs.len(),
        });
    }

    let out_values = rows
        .iter()
        .zip(raw_outputs)
        .map(|(row, raw)| codec::parse(&row.ty, Some(raw)))
        .collect::<Result<Vec<_>>>()?;

    let return_value = match table.return_slot() {
        Some(slot) => Some(codec::parse(&slot.ty, return_raw)?),
        None => None,
    };

    Ok(DispatchResult::ok(return_value, out_values))
}
