//! Test-site contract consumed by the dispatch core
//!
//! The hosting test runner owns logging and assertions. The core only needs
//! to emit log entries, read configuration and check for deferred errors.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PtfConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogKind {
    EnterAdapter,
    ExitAdapter,
    Debug,
    Comment,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub message: String,
}

/// Logging and assertion context an adapter is bound to
pub trait TestSite: Send + Sync {
    fn log(&self, kind: LogKind, message: &str);

    /// Resolved configuration properties.
    fn config(&self) -> &PtfConfig;

    /// Drain errors queued by earlier checkpoints of the current test case.
    fn take_deferred_errors(&self) -> Vec<String>;
}

/// [`TestSite`] that forwards to `tracing` and keeps every entry in memory
#[derive(Debug, Default)]
pub struct TracingSite {
    config: PtfConfig,
    entries: Mutex<Vec<LogEntry>>,
    deferred: Mutex<Vec<String>>,
}

impl TracingSite {
    pub fn new(config: PtfConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(Vec::new()),
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Queue an error to be reported before the next adapter call.
    pub fn defer_error(&self, message: impl Into<String>) {
        lock(&self.deferred).push(message.into());
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.entries).clone()
    }

    pub fn entries_of(&self, kind: LogKind) -> Vec<String> {
        lock(&self.entries)
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl TestSite for TracingSite {
    fn log(&self, kind: LogKind, message: &str) {
        match kind {
            LogKind::EnterAdapter | LogKind::ExitAdapter | LogKind::Debug => {
                debug!(?kind, "{message}")
            }
            LogKind::Comment => info!("{message}"),
            LogKind::Warning => warn!("{message}"),
            LogKind::Error => error!("{message}"),
        }
        lock(&self.entries).push(LogEntry {
            kind,
            message: message.to_string(),
        });
    }

    fn config(&self) -> &PtfConfig {
        &self.config
    }

    fn take_deferred_errors(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.deferred))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_recorded_in_order() {
        let site = TracingSite::default();
        site.log(LogKind::EnterAdapter, "enter");
        site.log(LogKind::Comment, "note");
        site.log(LogKind::ExitAdapter, "exit");

        let kinds: Vec<LogKind> = site.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![LogKind::EnterAdapter, LogKind::Comment, LogKind::ExitAdapter]
        );
        assert_eq!(site.entries_of(LogKind::Comment), vec!["note".to_string()]);
    }

    #[test]
    fn test_deferred_errors_are_drained() {
        let site = TracingSite::default();
        site.defer_error("checkpoint 1 failed");
        site.defer_error("checkpoint 2 failed");

        assert_eq!(site.take_deferred_errors().len(), 2);
        assert!(site.take_deferred_errors().is_empty());
    }
}
