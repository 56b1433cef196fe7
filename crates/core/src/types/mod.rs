pub mod signature;
pub mod value;

// Re-export commonly used types
pub use signature::{
    CallShape, Classification, DirectionFlags, MethodSignature, ParameterDescriptor,
    RETURN_VALUE_NAME, classify,
};
pub use value::{CustomType, EnumType, ParseFailure, TextConstructor, TypeDescriptor, Value};
