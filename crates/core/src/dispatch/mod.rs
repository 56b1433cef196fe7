//! Dispatch requests, results and the adapter proxy

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::types::{CallShape, MethodSignature, Value};

pub mod interface;
pub mod proxy;

pub use interface::AdapterInterface;
pub use proxy::{AdapterCall, AdapterProxy, CallReply, ProxyState};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identifies one dispatched call in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CorrelationToken(u64);

impl CorrelationToken {
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One business call routed to a backend
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub signature: Arc<MethodSignature>,
    pub shape: CallShape,
    /// Input values in declaration order.
    pub in_args: Vec<Value>,
    pub token: CorrelationToken,
}

impl DispatchRequest {
    /// Build a request from a full argument list (one slot per parameter).
    pub fn from_slots(signature: Arc<MethodSignature>, slots: &[Value]) -> Self {
        let shape = signature.shape();
        let in_args = shape
            .input_indexes()
            .iter()
            .map(|&i| slots.get(i).cloned().unwrap_or(Value::Null))
            .collect();
        Self {
            signature,
            shape,
            in_args,
            token: CorrelationToken::next(),
        }
    }

    pub fn method(&self) -> &str {
        &self.signature.name
    }

    /// Full argument list with inputs in place and pure outputs null.
    pub fn argument_slots(&self) -> Vec<Value> {
        let mut slots = vec![Value::Null; self.signature.parameters.len()];
        for (&index, value) in self.shape.input_indexes().iter().zip(&self.in_args) {
            slots[index] = value.clone();
        }
        slots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchStatus {
    Ok,
    Aborted,
    Failed,
}

/// Outcome of one dispatched call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub return_value: Option<Value>,
    /// Output values in declaration order.
    pub out_values: Vec<Value>,
    pub status: DispatchStatus,
    pub diagnostic: Option<String>,
}

impl DispatchResult {
    pub fn ok(return_value: Option<Value>, out_values: Vec<Value>) -> Self {
        Self {
            return_value,
            out_values,
            status: DispatchStatus::Ok,
            diagnostic: None,
        }
    }

    pub fn aborted(diagnostic: impl Into<String>) -> Self {
        Self {
            return_value: None,
            out_values: Vec::new(),
            status: DispatchStatus::Aborted,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            return_value: None,
            out_values: Vec::new(),
            status: DispatchStatus::Failed,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DispatchStatus::Ok
    }
}
