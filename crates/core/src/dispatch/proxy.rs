//! The single interception point between test code and a backend
//!
//! Lifecycle calls (`Initialize`, site lookup, `Reset`, `Dispose`, hash
//! code) are answered here; `Reset` and `Dispose` are also forwarded so the
//! backend can release what it holds. Every other call is a business call
//! and is routed to the backend.
//!
//! ```text
//! Uninitialized --Initialize--> Ready --Invoke--> Dispatching --> Ready
//!        |                        |
//!        +--------Dispose---------+-----------------------------> Disposed
//! ```
//!
//! A handle is driven by one test thread at a time; callers serialize use.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, warn};

use crate::backends::AdapterBackend;
use crate::error::{Error, Result};
use crate::site::{LogKind, TestSite};
use crate::types::{CallShape, Value};

use super::{AdapterInterface, DispatchRequest, DispatchResult, DispatchStatus};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Uninitialized,
    Ready,
    Dispatching,
    Disposed,
}

/// A call made on an adapter interface
pub enum AdapterCall<'a> {
    Initialize(Arc<dyn TestSite>),
    GetSite,
    Reset,
    Dispose,
    GetHashCode,
    Invoke {
        method: &'a str,
        args: &'a mut [Value],
    },
}

pub enum CallReply {
    Done,
    Site(Option<Arc<dyn TestSite>>),
    HashCode(u64),
    Dispatched(DispatchResult),
}

impl fmt::Debug for CallReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallReply::Done => f.write_str("Done"),
            CallReply::Site(site) => f
                .debug_tuple("Site")
                .field(&site.as_ref().map(|_| "TestSite"))
                .finish(),
            CallReply::HashCode(h) => f.debug_tuple("HashCode").field(h).finish(),
            CallReply::Dispatched(r) => f.debug_tuple("Dispatched").field(r).finish(),
        }
    }
}

pub struct AdapterProxy {
    interface: AdapterInterface,
    backend: Box<dyn AdapterBackend>,
    state: ProxyState,
    site: Option<Arc<dyn TestSite>>,
    identity: u64,
}

impl AdapterProxy {
    pub fn new(interface: AdapterInterface, backend: Box<dyn AdapterBackend>) -> Self {
        Self {
            interface,
            backend,
            state: ProxyState::Uninitialized,
            site: None,
            identity: NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &str {
        &self.interface.name
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    pub fn interface(&self) -> &AdapterInterface {
        &self.interface
    }

    /// Classify a call and answer or route it.
    pub fn intercept(&mut self, call: AdapterCall<'_>) -> Result<CallReply> {
        match call {
            AdapterCall::Initialize(site) => self.initialize(site).map(|_| CallReply::Done),
            AdapterCall::GetSite => Ok(CallReply::Site(self.site())),
            AdapterCall::Reset => self.reset().map(|_| CallReply::Done),
            AdapterCall::Dispose => self.dispose().map(|_| CallReply::Done),
            AdapterCall::GetHashCode => Ok(CallReply::HashCode(self.hash_code())),
            AdapterCall::Invoke { method, args } => {
                self.invoke(method, args).map(CallReply::Dispatched)
            }
        }
    }

    /// Bind the proxy to a logging and assertion context.
    pub fn initialize(&mut self, site: Arc<dyn TestSite>) -> Result<()> {
        if self.state == ProxyState::Disposed {
            return Err(self.disposed());
        }
        site.log(
            LogKind::Debug,
            &format!(
                "Adapter {} initialized with {} backend",
                self.interface.name,
                self.backend.name()
            ),
        );
        self.site = Some(site);
        self.state = ProxyState::Ready;
        Ok(())
    }

    pub fn site(&self) -> Option<Arc<dyn TestSite>> {
        self.site.clone()
    }

    pub fn hash_code(&self) -> u64 {
        self.identity
    }

    pub fn reset(&mut self) -> Result<()> {
        if self.state == ProxyState::Disposed {
            return Err(self.disposed());
        }
        debug!(adapter = %self.interface.name, "resetting adapter");
        self.backend.reset()
    }

    /// Release the backend; later business calls fail with `Disposed`.
    pub fn dispose(&mut self) -> Result<()> {
        if self.state == ProxyState::Disposed {
            return Ok(());
        }
        debug!(adapter = %self.interface.name, "disposing adapter");
        let released = self.backend.dispose();
        self.state = ProxyState::Disposed;
        if let (Err(err), Some(site)) = (&released, &self.site) {
            site.log(
                LogKind::Warning,
                &format!("Disposing adapter {} failed: {err}", self.interface.name),
            );
        }
        self.site = None;
        released
    }

    /// Dispatch a business call.
    ///
    /// `args` holds one slot per declared parameter. On success the output
    /// slots are overwritten with the backend's output values.
    pub fn invoke(&mut self, method: &str, args: &mut [Value]) -> Result<DispatchResult> {
        let site = match (self.state, &self.site) {
            (ProxyState::Disposed, _) => return Err(self.disposed()),
            (ProxyState::Ready, Some(site)) => Arc::clone(site),
            _ => {
                return Err(Error::NotInitialized {
                    adapter: self.interface.name.clone(),
                });
            }
        };

        let signature = self.interface.method(method)?;
        signature.check_arity(args.len())?;

        let adapter = self.interface.name.clone();
        let deferred = site.take_deferred_errors();
        if !deferred.is_empty() {
            let message = deferred.join("; ");
            site.log(
                LogKind::Error,
                &format!("Not calling {adapter}.{method}: earlier errors are pending: {message}"),
            );
            return Err(Error::AssumptionFailed(message));
        }

        let request = DispatchRequest::from_slots(signature, args);
        site.log(
            LogKind::EnterAdapter,
            &format!("Entering {adapter}.{method} {}", request.token),
        );
        debug!(
            adapter = %adapter,
            method,
            token = %request.token,
            backend = self.backend.name(),
            "dispatching"
        );

        self.state = ProxyState::Dispatching;
        let outcome = self.backend.invoke(&request);
        self.state = ProxyState::Ready;

        site.log(
            LogKind::ExitAdapter,
            &format!("Exiting {adapter}.{method} {}", request.token),
        );

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                site.log(
                    LogKind::Error,
                    &format!("{adapter}.{method} raised an error: {err}\n{err:#?}"),
                );
                error!(adapter = %adapter, method, "backend failed: {err}");
                return Err(err);
            }
        };

        match result.status {
            DispatchStatus::Ok => compose(&request.shape, &result, args, method)?,
            DispatchStatus::Aborted | DispatchStatus::Failed => {
                let note = result.diagnostic.as_deref().unwrap_or("no diagnostic");
                warn!(adapter = %adapter, method, status = ?result.status, "{note}");
                site.log(
                    LogKind::Warning,
                    &format!("{adapter}.{method} ended {:?}: {note}", result.status),
                );
            }
        }

        Ok(result)
    }

    fn disposed(&self) -> Error {
        Error::Disposed {
            adapter: self.interface.name.clone(),
        }
    }
}

/// Write output values back into their original argument slots.
fn compose(
    shape: &CallShape,
    result: &DispatchResult,
    args: &mut [Value],
    method: &str,
) -> Result<()> {
    if result.out_values.len() != shape.output_count() {
        return Err(Error::SignatureMismatch {
            method: method.to_string(),
            expected: shape.output_count(),
            actual: result.out_values.len(),
        });
    }
    for (&slot, value) in shape.output_indexes().iter().zip(&result.out_values) {
        args[slot] = value.clone();
    }
    Ok(())
}

impl Drop for AdapterProxy {
    fn drop(&mut self) {
        if self.state != ProxyState::Disposed {
            if let Err(err) = self.dispose() {
                warn!(adapter = %self.interface.name, "dispose on drop failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ManagedBackend;
    use crate::site::TracingSite;
    use crate::types::{MethodSignature, TypeDescriptor};
    use std::sync::Mutex;

    fn interface() -> AdapterInterface {
        AdapterInterface::new("ICalc")
            .with_method(
                MethodSignature::new("Echo")
                    .input("s", TypeDescriptor::String)
                    .returns(TypeDescriptor::String),
            )
            .with_method(
                MethodSignature::new("DivMod")
                    .input("a", TypeDescriptor::I64)
                    .output("quotient", TypeDescriptor::I64)
                    .input("b", TypeDescriptor::I64)
                    .output("remainder", TypeDescriptor::I64),
            )
    }

    fn backend() -> ManagedBackend {
        ManagedBackend::new()
            .with_method("Echo", |args| Ok(Some(args[0].clone())))
            .with_method("DivMod", |args| {
                let a = args[0].as_i64().unwrap_or_default();
                let b = args[2].as_i64().unwrap_or_default();
                if b == 0 {
                    return Err(Error::backend("division by zero"));
                }
                args[1] = Value::Int(a / b);
                args[3] = Value::Int(a % b);
                Ok(None)
            })
    }

    fn ready_proxy() -> (AdapterProxy, Arc<TracingSite>) {
        let site = Arc::new(TracingSite::default());
        let mut proxy = AdapterProxy::new(interface(), Box::new(backend()));
        proxy.initialize(site.clone()).unwrap();
        (proxy, site)
    }

    #[test]
    fn test_business_call_before_initialize_fails() {
        let mut proxy = AdapterProxy::new(interface(), Box::new(backend()));
        let mut args = vec![Value::from("hi")];

        let err = proxy.invoke("Echo", &mut args).unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
        assert_eq!(proxy.state(), ProxyState::Uninitialized);
    }

    #[test]
    fn test_echo_returns_input() {
        let (mut proxy, site) = ready_proxy();
        let mut args = vec![Value::from("hello")];

        let result = proxy.invoke("Echo", &mut args).unwrap();
        assert_eq!(result.status, DispatchStatus::Ok);
        assert_eq!(result.return_value, Some(Value::from("hello")));
        assert_eq!(site.entries_of(LogKind::EnterAdapter).len(), 1);
        assert_eq!(site.entries_of(LogKind::ExitAdapter).len(), 1);
        assert_eq!(proxy.state(), ProxyState::Ready);
    }

    #[test]
    fn test_outputs_are_composed_into_original_slots() {
        let (mut proxy, _site) = ready_proxy();
        let mut args = vec![Value::Int(17), Value::Null, Value::Int(5), Value::Null];

        let result = proxy.invoke("DivMod", &mut args).unwrap();
        assert_eq!(result.out_values, vec![Value::Int(3), Value::Int(2)]);
        assert_eq!(args[1], result.out_values[0]);
        assert_eq!(args[3], result.out_values[1]);
        assert_eq!(args[0], Value::Int(17));
    }

    #[test]
    fn test_backend_errors_are_logged_and_returned_unchanged() {
        let (mut proxy, site) = ready_proxy();
        let mut args = vec![Value::Int(1), Value::Null, Value::Int(0), Value::Null];

        let err = proxy.invoke("DivMod", &mut args).unwrap_err();
        match err {
            Error::Backend(inner) => assert_eq!(inner.to_string(), "division by zero"),
            other => panic!("expected the backend's error, got {other:?}"),
        }
        assert_eq!(site.entries_of(LogKind::ExitAdapter).len(), 1);
        let errors = site.entries_of(LogKind::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("division by zero"));
        assert_eq!(args[1], Value::Null);
    }

    #[test]
    fn test_deferred_errors_fail_fast() {
        let (mut proxy, site) = ready_proxy();
        site.defer_error("checkpoint failed");
        let mut args = vec![Value::from("x")];

        let err = proxy.invoke("Echo", &mut args).unwrap_err();
        assert!(matches!(err, Error::AssumptionFailed(ref m) if m == "checkpoint failed"));
        assert!(site.entries_of(LogKind::EnterAdapter).is_empty());

        // the queue was drained, so the next call goes through
        assert!(proxy.invoke("Echo", &mut args).is_ok());
    }

    #[test]
    fn test_arity_and_unknown_methods() {
        let (mut proxy, _site) = ready_proxy();

        let err = proxy.invoke("Echo", &mut []).unwrap_err();
        assert!(matches!(err, Error::SignatureMismatch { .. }));

        let err = proxy.invoke("Nope", &mut []).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { .. }));
    }

    #[test]
    fn test_dispose_is_terminal() {
        let (mut proxy, _site) = ready_proxy();
        proxy.dispose().unwrap();
        assert_eq!(proxy.state(), ProxyState::Disposed);

        let mut args = vec![Value::from("hi")];
        assert!(matches!(
            proxy.invoke("Echo", &mut args),
            Err(Error::Disposed { .. })
        ));
        assert!(matches!(proxy.reset(), Err(Error::Disposed { .. })));
        assert!(proxy.dispose().is_ok());
        assert!(matches!(
            proxy.initialize(Arc::new(TracingSite::default())),
            Err(Error::Disposed { .. })
        ));
    }

    #[test]
    fn test_lifecycle_calls_are_answered_by_proxy() {
        let resets = Arc::new(Mutex::new(0));
        let counter = resets.clone();
        let backend = backend().on_reset(move || *counter.lock().unwrap() += 1);
        let mut proxy = AdapterProxy::new(interface(), Box::new(backend));

        assert!(matches!(
            proxy.intercept(AdapterCall::GetSite).unwrap(),
            CallReply::Site(None)
        ));
        proxy
            .intercept(AdapterCall::Initialize(Arc::new(TracingSite::default())))
            .unwrap();
        assert!(matches!(
            proxy.intercept(AdapterCall::GetSite).unwrap(),
            CallReply::Site(Some(_))
        ));

        let first = proxy.intercept(AdapterCall::GetHashCode).unwrap();
        let second = proxy.intercept(AdapterCall::GetHashCode).unwrap();
        match (first, second) {
            (CallReply::HashCode(a), CallReply::HashCode(b)) => assert_eq!(a, b),
            other => panic!("unexpected replies {other:?}"),
        }

        proxy.intercept(AdapterCall::Reset).unwrap();
        assert_eq!(*resets.lock().unwrap(), 1);

        let mut args = vec![Value::from("via intercept")];
        match proxy
            .intercept(AdapterCall::Invoke {
                method: "Echo",
                args: &mut args,
            })
            .unwrap()
        {
            CallReply::Dispatched(result) => {
                assert_eq!(result.return_value, Some(Value::from("via intercept")))
            }
            other => panic!("unexpected reply {other:?}"),
        }

        proxy.intercept(AdapterCall::Dispose).unwrap();
        assert_eq!(proxy.state(), ProxyState::Disposed);
    }
}
