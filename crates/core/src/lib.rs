//! ptf-core - adapter dispatch for protocol conformance test suites
//!
//! This crate provides:
//! - Explicit method signatures and the parameter classification rule
//! - A value codec between typed values and their text form
//! - The adapter proxy that routes calls to managed, interactive or shell backends
//! - The JSON bridge to a spawned console helper
pub mod backends;
pub mod bridge;
pub mod cancel;
pub mod codec;
pub mod command;
pub mod config;
pub mod console;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod marshal;
pub mod site;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

pub use backends::{AdapterBackend, InteractiveBackend, ManagedBackend, ShellBackend};
pub use cancel::CancellationToken;
pub use config::{AdapterBinding, AdapterKind, InteractiveMode, PtfConfig};
pub use context::{AdapterHandle, TestContext};
pub use dispatch::{
    AdapterCall, AdapterInterface, AdapterProxy, CallReply, DispatchRequest, DispatchResult,
    DispatchStatus, ProxyState,
};
pub use site::{LogKind, TestSite, TracingSite};
