//! Conversion between typed values and their text form
//!
//! `None` text is the null marker and never parses; the empty string is a
//! valid string value but not a valid number.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{ParseFailure, TypeDescriptor, Value};

/// Shown wherever a null value has to be displayed.
pub const NULL_DISPLAY: &str = "<null>";

/// Text that cannot be converted into the declared type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {} to {type_name}: {reason}", display_text(.text))]
pub struct FormatError {
    pub type_name: String,
    pub text: Option<String>,
    pub reason: String,
}

impl FormatError {
    fn new(ty: &TypeDescriptor, text: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            type_name: ty.type_name(),
            text: text.map(str::to_string),
            reason: reason.into(),
        }
    }
}

fn display_text(text: &Option<String>) -> String {
    match text {
        Some(t) => format!("{t:?}"),
        None => "null".to_string(),
    }
}

/// Parse `text` into a value of type `ty`.
pub fn parse(ty: &TypeDescriptor, text: Option<&str>) -> Result<Value> {
    let ty = ty.underlying();
    let Some(text) = text else {
        return Err(FormatError::new(ty, None, "value is null").into());
    };

    let value = match ty {
        TypeDescriptor::String => Value::Str(text.to_string()),
        TypeDescriptor::Bool => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(FormatError::new(ty, Some(text), "expected true or false").into());
            }
        }
        TypeDescriptor::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => {
                    return Err(
                        FormatError::new(ty, Some(text), "expected exactly one character").into(),
                    );
                }
            }
        }
        TypeDescriptor::I8 => Value::Int(i64::from(number::<i8>(ty, text)?)),
        TypeDescriptor::I16 => Value::Int(i64::from(number::<i16>(ty, text)?)),
        TypeDescriptor::I32 => Value::Int(i64::from(number::<i32>(ty, text)?)),
        TypeDescriptor::I64 => Value::Int(number::<i64>(ty, text)?),
        TypeDescriptor::U8 => Value::UInt(u64::from(number::<u8>(ty, text)?)),
        TypeDescriptor::U16 => Value::UInt(u64::from(number::<u16>(ty, text)?)),
        TypeDescriptor::U32 => Value::UInt(u64::from(number::<u32>(ty, text)?)),
        TypeDescriptor::U64 => Value::UInt(number::<u64>(ty, text)?),
        TypeDescriptor::F32 => Value::Float(f64::from(number::<f32>(ty, text)?)),
        TypeDescriptor::F64 => Value::Float(number::<f64>(ty, text)?),
        TypeDescriptor::Enum(enum_type) => match enum_type.value(text.trim()) {
            Some(v) => v,
            None => {
                return Err(FormatError::new(
                    ty,
                    Some(text),
                    format!("expected one of: {}", enum_type.members.join(", ")),
                )
                .into());
            }
        },
        TypeDescriptor::Custom(custom) => {
            let Some(from_text) = &custom.from_text else {
                return Err(
                    FormatError::new(ty, Some(text), "type has no from-text constructor").into(),
                );
            };
            match from_text(text) {
                Ok(v) => v,
                Err(ParseFailure::Format(reason)) => {
                    return Err(FormatError::new(ty, Some(text), reason).into());
                }
                Err(ParseFailure::Other(err)) => return Err(Error::Conversion(err)),
            }
        }
        TypeDescriptor::ByRef(inner) => return parse(inner, Some(text)),
    };

    Ok(value)
}

fn number<T>(ty: &TypeDescriptor, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| FormatError::new(ty, Some(text), e.to_string()).into())
}

/// Natural text form of a value; `None` for the null value.
pub fn to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Enum { member, .. } => member.clone(),
        Value::Custom { text, .. } => text.clone(),
    };
    Some(text)
}

/// Text form for human display, with the null marker spelled out.
pub fn display(value: &Value) -> String {
    to_text(value).unwrap_or_else(|| NULL_DISPLAY.to_string())
}
