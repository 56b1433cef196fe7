//! Type descriptors and the dynamic values carried through a dispatch

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BoxError;

/// Failure reported by a custom from-text constructor
#[derive(Debug)]
pub enum ParseFailure {
    /// The text is not in a form the constructor accepts.
    Format(String),
    /// Any other failure; surfaced to the caller unchanged.
    Other(BoxError),
}

pub type TextConstructor =
    Arc<dyn Fn(&str) -> std::result::Result<Value, ParseFailure> + Send + Sync>;

/// A named enumeration and its members, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical member name for `text`, matched case-insensitively.
    pub fn member(&self, text: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.eq_ignore_ascii_case(text))
            .map(String::as_str)
    }

    pub fn value(&self, member: &str) -> Option<Value> {
        self.member(member).map(|m| Value::Enum {
            type_name: self.name.clone(),
            member: m.to_string(),
        })
    }
}

/// A user type, optionally carrying a constructor from text.
#[derive(Clone)]
pub struct CustomType {
    pub name: String,
    pub from_text: Option<TextConstructor>,
}

impl CustomType {
    /// A type with no from-text constructor; parsing it always fails.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_text: None,
        }
    }

    pub fn with_constructor<F>(name: impl Into<String>, from_text: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<Value, ParseFailure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            from_text: Some(Arc::new(from_text)),
        }
    }
}

impl fmt::Debug for CustomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .field("from_text", &self.from_text.is_some())
            .finish()
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Declared type of a parameter or return slot
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Enum(EnumType),
    Custom(CustomType),
    /// Pass-by-reference view of another type.
    ByRef(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn by_ref(inner: TypeDescriptor) -> Self {
        match inner {
            already @ TypeDescriptor::ByRef(_) => already,
            other => TypeDescriptor::ByRef(Box::new(other)),
        }
    }

    /// The value type behind any number of by-ref layers.
    pub fn underlying(&self) -> &TypeDescriptor {
        let mut current = self;
        while let TypeDescriptor::ByRef(inner) = current {
            current = inner;
        }
        current
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.underlying(), TypeDescriptor::Bool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.underlying(),
            TypeDescriptor::I8
                | TypeDescriptor::I16
                | TypeDescriptor::I32
                | TypeDescriptor::I64
                | TypeDescriptor::U8
                | TypeDescriptor::U16
                | TypeDescriptor::U32
                | TypeDescriptor::U64
        )
    }

    /// Name used on the console surface and in bridge requests.
    pub fn type_name(&self) -> String {
        match self {
            TypeDescriptor::Bool => "bool".to_string(),
            TypeDescriptor::Char => "char".to_string(),
            TypeDescriptor::I8 => "i8".to_string(),
            TypeDescriptor::I16 => "i16".to_string(),
            TypeDescriptor::I32 => "i32".to_string(),
            TypeDescriptor::I64 => "i64".to_string(),
            TypeDescriptor::U8 => "u8".to_string(),
            TypeDescriptor::U16 => "u16".to_string(),
            TypeDescriptor::U32 => "u32".to_string(),
            TypeDescriptor::U64 => "u64".to_string(),
            TypeDescriptor::F32 => "f32".to_string(),
            TypeDescriptor::F64 => "f64".to_string(),
            TypeDescriptor::String => "string".to_string(),
            TypeDescriptor::Enum(e) => e.name.clone(),
            TypeDescriptor::Custom(c) => c.name.clone(),
            TypeDescriptor::ByRef(inner) => format!("{}&", inner.type_name()),
        }
    }

    /// Resolve a primitive type from its [`type_name`](Self::type_name).
    ///
    /// Enumerations and custom types cannot be recovered from a bare name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        if let Some(inner) = name.strip_suffix('&') {
            return Self::from_type_name(inner).map(Self::by_ref);
        }
        let ty = match name {
            "bool" => TypeDescriptor::Bool,
            "char" => TypeDescriptor::Char,
            "i8" => TypeDescriptor::I8,
            "i16" => TypeDescriptor::I16,
            "i32" => TypeDescriptor::I32,
            "i64" => TypeDescriptor::I64,
            "u8" => TypeDescriptor::U8,
            "u16" => TypeDescriptor::U16,
            "u32" => TypeDescriptor::U32,
            "u64" => TypeDescriptor::U64,
            "f32" => TypeDescriptor::F32,
            "f64" => TypeDescriptor::F64,
            "string" => TypeDescriptor::String,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A live argument, return value or output value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Enum { type_name: String, member: String },
    Custom { type_name: String, text: String },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Enum { member, .. } => Some(member),
            Value::Custom { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt(v) => Some(v),
            Value::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underlying_strips_nested_by_ref() {
        let ty = TypeDescriptor::ByRef(Box::new(TypeDescriptor::ByRef(Box::new(
            TypeDescriptor::I32,
        ))));
        assert_eq!(ty.underlying(), &TypeDescriptor::I32);
        assert!(ty.is_integer());
        assert_eq!(TypeDescriptor::by_ref(ty.clone()), ty);
    }

    #[test]
    fn test_type_name_round_trip_for_primitives() {
        for ty in [
            TypeDescriptor::Bool,
            TypeDescriptor::U16,
            TypeDescriptor::F64,
            TypeDescriptor::String,
            TypeDescriptor::by_ref(TypeDescriptor::I64),
        ] {
            assert_eq!(TypeDescriptor::from_type_name(&ty.type_name()), Some(ty));
        }
        assert_eq!(TypeDescriptor::from_type_name("Color"), None);
    }

    #[test]
    fn test_enum_member_lookup_is_case_insensitive() {
        let color = EnumType::new("Color", ["Red", "Green"]);
        assert_eq!(color.member("GREEN"), Some("Green"));
        assert_eq!(color.member("blue"), None);
    }
}
