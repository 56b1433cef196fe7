//! Configuration view for adapter binding

mod binding;
mod properties;

// Re-export main types
pub use binding::{AdapterBinding, AdapterKind, InteractiveMode, DEFAULT_HELPER};
pub use properties::PtfConfig;
