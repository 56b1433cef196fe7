//! Adapter registry for one test run
//!
//! Interfaces and managed implementations are registered up front. The
//! first `get_adapter` for a name reads its binding from configuration,
//! builds the backend, initializes the proxy with the site and caches it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::backends::interactive::Prompter;
use crate::backends::{AdapterBackend, InteractiveBackend, ManagedBackend, ShellBackend};
use crate::bridge::ChildConsoleBridge;
use crate::cancel::CancellationToken;
use crate::config::{AdapterBinding, AdapterKind, InteractiveMode, PtfConfig};
use crate::console::ConsolePrompter;
use crate::dispatch::{AdapterInterface, AdapterProxy};
use crate::error::{Error, Result};
use crate::site::TestSite;

/// Shared handle to an initialized adapter; the mutex serializes callers.
pub type AdapterHandle = Arc<Mutex<AdapterProxy>>;

type ManagedFactory = Box<dyn Fn() -> ManagedBackend + Send + Sync>;
type PrompterFactory = Box<dyn Fn() -> Box<dyn Prompter> + Send + Sync>;

pub struct TestContext {
    site: Arc<dyn TestSite>,
    interfaces: HashMap<String, AdapterInterface>,
    managed: HashMap<String, ManagedFactory>,
    prompter: PrompterFactory,
    adapters: Mutex<BTreeMap<String, Entry>>,
}

/// A cached handle and the token that stops its in-flight calls.
struct Entry {
    handle: AdapterHandle,
    cancel: CancellationToken,
}

impl TestContext {
    pub fn new(site: Arc<dyn TestSite>) -> Self {
        Self {
            site,
            interfaces: HashMap::new(),
            managed: HashMap::new(),
            prompter: Box::new(|| -> Box<dyn Prompter> { Box::new(ConsolePrompter::stdio()) }),
            adapters: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn register_interface(&mut self, interface: AdapterInterface) -> &mut Self {
        self.interfaces.insert(interface.name.clone(), interface);
        self
    }

    /// Supply the implementation used when the adapter is bound as `managed`.
    pub fn register_managed<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> ManagedBackend + Send + Sync + 'static,
    {
        self.managed.insert(name.into(), Box::new(factory));
        self
    }

    /// Replace the console prompter used by in-process interactive adapters.
    pub fn with_prompter<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Prompter> + Send + Sync + 'static,
    {
        self.prompter = Box::new(factory);
        self
    }

    pub fn site(&self) -> Arc<dyn TestSite> {
        Arc::clone(&self.site)
    }

    pub fn config(&self) -> &PtfConfig {
        self.site.config()
    }

    /// Get the handle for `name`, creating and initializing it on first use.
    pub fn get_adapter(&self, name: &str) -> Result<AdapterHandle> {
        let mut adapters = lock(&self.adapters);
        if let Some(entry) = adapters.get(name) {
            return Ok(Arc::clone(&entry.handle));
        }

        let interface = self
            .interfaces
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownAdapter(name.to_string()))?;
        let binding = AdapterBinding::from_config(self.config(), name)?;
        let cancel = CancellationToken::new();
        let backend = self.create_backend(&binding, &cancel)?;

        let mut proxy = AdapterProxy::new(interface, backend);
        proxy.initialize(Arc::clone(&self.site))?;
        info!(adapter = name, kind = binding.kind.as_str(), "adapter created");

        let handle = Arc::new(Mutex::new(proxy));
        adapters.insert(
            name.to_string(),
            Entry {
                handle: Arc::clone(&handle),
                cancel,
            },
        );
        Ok(handle)
    }

    fn create_backend(
        &self,
        binding: &AdapterBinding,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn AdapterBackend>> {
        let backend: Box<dyn AdapterBackend> = match binding.kind {
            AdapterKind::Managed => {
                let factory = self.managed.get(&binding.name).ok_or_else(|| {
                    Error::Config(format!(
                        "No managed implementation registered for adapter '{}'",
                        binding.name
                    ))
                })?;
                Box::new(factory())
            }
            AdapterKind::Interactive => match binding.mode {
                InteractiveMode::Console => {
                    Box::new(InteractiveBackend::in_process((self.prompter)()))
                }
                InteractiveMode::Process => {
                    let bridge = ChildConsoleBridge::new(&binding.helper_path)
                        .with_timeout(binding.timeout)
                        .with_cancellation(cancel.clone());
                    Box::new(InteractiveBackend::spawned(bridge))
                }
            },
            AdapterKind::Shell => {
                let dir = binding.script_dir.as_ref().ok_or_else(|| {
                    Error::Config(format!(
                        "Shell adapter '{}' has no script directory",
                        binding.name
                    ))
                })?;
                Box::new(ShellBackend::new(dir).with_properties(self.config()))
            }
        };
        Ok(backend)
    }

    /// Reset every created adapter between test cases.
    pub fn reset_all(&self) -> Result<()> {
        let handles: Vec<AdapterHandle> = lock(&self.adapters)
            .values()
            .map(|entry| Arc::clone(&entry.handle))
            .collect();
        for handle in handles {
            lock(&handle).reset()?;
        }
        Ok(())
    }

    /// Dispose every created adapter.
    ///
    /// In-flight calls are cancelled before any handle is locked, so a
    /// helper waiting on a human does not hold up the teardown. Keeps going
    /// past failures and returns the first one.
    pub fn cleanup(&self) -> Result<()> {
        let adapters = std::mem::take(&mut *lock(&self.adapters));
        for entry in adapters.values() {
            entry.cancel.cancel();
        }
        let mut first_error = None;
        for (name, entry) in adapters {
            if let Err(e) = lock(&entry.handle).dispose() {
                warn!("Failed to dispose adapter {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("Adapter cleanup failed: {}", e);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
