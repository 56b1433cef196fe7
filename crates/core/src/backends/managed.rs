//! In-process backend: calls Rust handlers directly, no prompting

use std::collections::HashMap;

use crate::dispatch::{DispatchRequest, DispatchResult};
use crate::error::{Error, Result};
use crate::types::Value;

use super::AdapterBackend;

/// Handler for one method.
///
/// Receives the full argument list (one slot per declared parameter), may
/// overwrite output slots, and returns the return value if any.
pub type ManagedHandler = Box<dyn FnMut(&mut [Value]) -> Result<Option<Value>> + Send>;

#[derive(Default)]
pub struct ManagedBackend {
    handlers: HashMap<String, ManagedHandler>,
    on_reset: Option<Box<dyn FnMut() + Send>>,
    on_dispose: Option<Box<dyn FnMut() + Send>>,
}

impl ManagedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&mut [Value]) -> Result<Option<Value>> + Send + 'static,
    {
        self.handlers.insert(method.into(), Box::new(handler));
        self
    }

    pub fn on_reset<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_reset = Some(Box::new(hook));
        self
    }

    pub fn on_dispose<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_dispose = Some(Box::new(hook));
        self
    }
}

impl AdapterBackend for ManagedBackend {
    fn name(&self) -> &'static str {
        "managed"
    }

    fn invoke(&mut self, request: &DispatchRequest) -> Result<DispatchResult> {
        let method = request.method();
        let handler = self
            .handlers
            .get_mut(method)
            .ok_or_else(|| Error::UnknownMethod {
                adapter: "managed backend".to_string(),
                method: method.to_string(),
            })?;

        let mut slots = request.argument_slots();
        let returned = handler(slots.as_mut_slice()).map_err(Error::unwrap_invocation)?;

        let return_value = request
            .signature
            .return_type
            .as_ref()
            .map(|_| returned.unwrap_or(Value::Null));
        let out_values = request
            .shape
            .output_indexes()
            .iter()
            .map(|&i| slots[i].clone())
            .collect();

        Ok(DispatchResult::ok(return_value, out_values))
    }

    fn reset(&mut self) -> Result<()> {
        if let Some(hook) = self.on_reset.as_mut() {
            hook();
        }
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        if let Some(hook) = self.on_dispose.as_mut() {
            hook();
        }
        self.handlers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MethodSignature, TypeDescriptor};
    use std::sync::Arc;

    fn request(signature: MethodSignature, slots: &[Value]) -> DispatchRequest {
        DispatchRequest::from_slots(Arc::new(signature), slots)
    }

    #[test]
    fn test_invocation_wrappers_are_unwrapped_once() {
        let mut backend = ManagedBackend::new().with_method("Fail", |_| {
            Err(Error::TargetInvocation(Box::new(Error::backend("sut refused"))))
        });

        let err = backend
            .invoke(&request(MethodSignature::new("Fail"), &[]))
            .unwrap_err();
        match err {
            Error::Backend(inner) => assert_eq!(inner.to_string(), "sut refused"),
            other => panic!("expected the inner error, got {other:?}"),
        }
    }

    #[test]
    fn test_void_and_missing_return_values() {
        let mut backend = ManagedBackend::new()
            .with_method("Ping", |_| Ok(None))
            .with_method("Lookup", |_| Ok(None));

        let result = backend
            .invoke(&request(MethodSignature::new("Ping"), &[]))
            .unwrap();
        assert_eq!(result.return_value, None);

        let sig = MethodSignature::new("Lookup").returns(TypeDescriptor::String);
        let result = backend.invoke(&request(sig, &[])).unwrap();
        assert_eq!(result.return_value, Some(Value::Null));
    }

    #[test]
    fn test_reference_parameters_round_trip() {
        let mut backend = ManagedBackend::new().with_method("Increment", |args| {
            let next = args[0].as_u64().unwrap_or_default() + 1;
            args[0] = Value::UInt(next);
            Ok(None)
        });
        let sig = MethodSignature::new("Increment").by_ref("counter", TypeDescriptor::U32);

        let result = backend
            .invoke(&request(sig, &[Value::UInt(41)]))
            .unwrap();
        assert_eq!(result.out_values, vec![Value::UInt(42)]);
    }

    #[test]
    fn test_unregistered_method() {
        let mut backend = ManagedBackend::new();
        let err = backend
            .invoke(&request(MethodSignature::new("Ghost"), &[]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { .. }));
    }
}
