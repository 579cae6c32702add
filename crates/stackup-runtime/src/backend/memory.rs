//! In-process driver that records every call.
//!
//! Backs `up --dry-run` and the test suite. Start, stop and status failures
//! can be injected per service.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stackup_common::error::{Result, StackupError};
use stackup_common::types::{ContainerId, ServiceState};
use stackup_compose::composer::PlannedService;

use super::RuntimeDriver;

/// A call received by a [`MemoryDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `start(service)`.
    Start(String),
    /// `stop(service)`.
    Stop(String),
    /// `status(service)`.
    Status(String),
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<DriverCall>,
    states: BTreeMap<String, ServiceState>,
    fail_start: BTreeSet<String>,
    fail_stop: BTreeSet<String>,
    fail_status: BTreeSet<String>,
}

/// Driver that keeps all state in memory.
///
/// Clones share state, so a test can keep a handle after giving the driver
/// to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDriver {
    /// Creates a driver where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `start` fail for the named service.
    #[must_use]
    pub fn failing_start(self, service: impl Into<String>) -> Self {
        let _ = self.lock().fail_start.insert(service.into());
        self
    }

    /// Makes `stop` fail for the named service.
    #[must_use]
    pub fn failing_stop(self, service: impl Into<String>) -> Self {
        let _ = self.lock().fail_stop.insert(service.into());
        self
    }

    /// Makes `status` fail for the named service.
    #[must_use]
    pub fn failing_status(self, service: impl Into<String>) -> Self {
        let _ = self.lock().fail_status.insert(service.into());
        self
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Services passed to `stop`, in call order.
    #[must_use]
    pub fn stopped(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Stop(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Services passed to `start`, in call order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Start(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RuntimeDriver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn start(&self, service: &PlannedService) -> Result<ContainerId> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::Start(service.name.clone()));
        if inner.fail_start.contains(&service.name) {
            let _ = inner
                .states
                .insert(service.name.clone(), ServiceState::Failed);
            return Err(StackupError::Driver {
                message: format!("injected start failure for {}", service.name),
            });
        }
        let _ = inner
            .states
            .insert(service.name.clone(), ServiceState::Running);
        let id = ContainerId::generate();
        tracing::info!(service = %service.name, id = %id, network = %service.network, "started (memory)");
        Ok(id)
    }

    fn stop(&self, service: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::Stop(service.to_string()));
        if inner.fail_stop.contains(service) {
            return Err(StackupError::Driver {
                message: format!("injected stop failure for {service}"),
            });
        }
        let _ = inner
            .states
            .insert(service.to_string(), ServiceState::Stopped);
        tracing::info!(service, "stopped (memory)");
        Ok(())
    }

    fn status(&self, service: &str) -> Result<ServiceState> {
        let mut inner = self.lock();
        inner.calls.push(DriverCall::Status(service.to_string()));
        if inner.fail_status.contains(service) {
            return Err(StackupError::Driver {
                message: format!("injected status failure for {service}"),
            });
        }
        Ok(inner
            .states
            .get(service)
            .copied()
            .unwrap_or(ServiceState::Pending))
    }
}
