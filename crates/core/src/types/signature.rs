//! Method signature model
//!
//! Signatures are supplied explicitly when an adapter interface is
//! registered. Each parameter carries three direction facts (explicit input,
//! explicit output, pass-by-reference); [`classify`] turns them into the
//! input/output roles used by the marshaler and the dispatch proxy.

use crate::error::{Error, Result};

use super::value::TypeDescriptor;

/// Name of the output slot that holds a method's return value.
pub const RETURN_VALUE_NAME: &str = "Return Value";

/// Direction facts about a parameter, as declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionFlags {
    pub is_in: bool,
    pub is_out: bool,
    pub by_ref: bool,
}

/// Roles a parameter plays in a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub input: bool,
    pub output: bool,
}

/// Derive the call roles of a parameter from its direction facts.
///
/// By-value parameters are input only, output-only parameters are output
/// only, and plain by-reference parameters are both.
pub fn classify(flags: DirectionFlags) -> Classification {
    let DirectionFlags {
        is_in,
        is_out,
        by_ref,
    } = flags;

    let input = is_in || (!is_in && !is_out) || (by_ref && !is_out);
    let output = (!is_in && is_out) || (!is_in && !is_out && by_ref);

    Classification { input, output }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    pub flags: DirectionFlags,
    /// Display-only default for output parameters.
    pub default: Option<String>,
}

impl ParameterDescriptor {
    /// A by-value input parameter.
    pub fn input(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            flags: DirectionFlags::default(),
            default: None,
        }
    }

    /// A write-only output parameter.
    pub fn output(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: TypeDescriptor::by_ref(ty),
            flags: DirectionFlags {
                is_in: false,
                is_out: true,
                by_ref: true,
            },
            default: None,
        }
    }

    /// A read-write reference parameter.
    pub fn by_ref(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: TypeDescriptor::by_ref(ty),
            flags: DirectionFlags {
                is_in: false,
                is_out: false,
                by_ref: true,
            },
            default: None,
        }
    }

    pub fn with_flags(mut self, flags: DirectionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn classification(&self) -> Classification {
        classify(self.flags)
    }
}

/// Description of one adapter method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: Option<TypeDescriptor>,
    /// Text shown to a human before an interactive call.
    pub help: Option<String>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            help: None,
        }
    }

    pub fn param(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn input(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.param(ParameterDescriptor::input(name, ty))
    }

    pub fn output(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.param(ParameterDescriptor::output(name, ty))
    }

    pub fn by_ref(self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.param(ParameterDescriptor::by_ref(name, ty))
    }

    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Classify every parameter once for the current call.
    pub fn shape(&self) -> CallShape {
        let classes: Vec<Classification> = self
            .parameters
            .iter()
            .map(ParameterDescriptor::classification)
            .collect();

        let input_indexes = classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.input)
            .map(|(i, _)| i)
            .collect();
        let output_indexes = classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.output)
            .map(|(i, _)| i)
            .collect();

        CallShape {
            classes,
            input_indexes,
            output_indexes,
        }
    }

    /// Fail unless a full argument list has one slot per declared parameter.
    pub fn check_arity(&self, supplied: usize) -> Result<()> {
        if supplied != self.parameters.len() {
            return Err(Error::SignatureMismatch {
                method: self.name.clone(),
                expected: self.parameters.len(),
                actual: supplied,
            });
        }
        Ok(())
    }
}

/// Frozen parameter roles of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShape {
    classes: Vec<Classification>,
    input_indexes: Vec<usize>,
    output_indexes: Vec<usize>,
}

impl CallShape {
    pub fn classification(&self, index: usize) -> Option<Classification> {
        self.classes.get(index).copied()
    }

    /// Positions of input parameters in the full parameter list.
    pub fn input_indexes(&self) -> &[usize] {
        &self.input_indexes
    }

    /// Positions of output parameters in the full parameter list.
    pub fn output_indexes(&self) -> &[usize] {
        &self.output_indexes
    }

    pub fn input_count(&self) -> usize {
        self.input_indexes.len()
    }

    pub fn output_count(&self) -> usize {
        self.output_indexes.len()
    }
}
