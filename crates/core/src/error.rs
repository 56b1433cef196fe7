use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::codec::FormatError;

/// Boxed error raised by a backend or a custom text constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while dispatching an adapter call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Signature mismatch on '{method}': expected {expected} arguments, got {actual}")]
    SignatureMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Adapter '{adapter}' has not been initialized")]
    NotInitialized { adapter: String },

    #[error("Adapter '{adapter}' has been disposed")]
    Disposed { adapter: String },

    #[error("Assumption failed: {0}")]
    AssumptionFailed(String),

    #[error("Helper process '{}' failed with exit code {code:?}", .helper.display())]
    ChildProcessFailed { helper: PathBuf, code: Option<i32> },

    #[error("Helper process did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Call was cancelled")]
    Cancelled,

    #[error("Adapter '{adapter}' has no method '{method}'")]
    UnknownMethod { adapter: String, method: String },

    #[error("No adapter interface registered under '{0}'")]
    UnknownAdapter(String),

    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Bridge protocol error: {0}")]
    BridgeProtocol(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Conversion(BoxError),

    #[error(transparent)]
    Backend(BoxError),

    #[error("Target invocation failed: {0}")]
    TargetInvocation(Box<Error>),
}

impl Error {
    /// Wrap an arbitrary error raised by adapter code.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Backend(err.into())
    }

    /// Strip one level of [`Error::TargetInvocation`] wrapping.
    pub fn unwrap_invocation(self) -> Self {
        match self {
            Error::TargetInvocation(inner) => *inner,
            other => other,
        }
    }

    /// Whether an interactive prompt should ask again instead of failing.
    pub fn is_retryable_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;
