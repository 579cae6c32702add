//! Runtime driver abstraction.
//!
//! The engine never executes containers itself; it sequences calls into a
//! [`RuntimeDriver`]. Drivers only see one service at a time.

pub mod docker;
pub mod memory;

use stackup_common::error::Result;
use stackup_common::types::{ContainerId, ServiceState};
use stackup_compose::composer::PlannedService;

/// A container runtime able to realize planned services.
///
/// Calls may block for as long as the runtime needs; the engine waits for
/// each `start` to return before starting any dependent.
pub trait RuntimeDriver: Send + Sync {
    /// Short driver name, recorded in the deployment state.
    fn name(&self) -> &'static str;

    /// Starts a service and returns the runtime's identifier for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to start the service.
    fn start(&self, service: &PlannedService) -> Result<ContainerId>;

    /// Stops and removes a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to stop the service.
    fn stop(&self, service: &str) -> Result<()>;

    /// Reports the current state of a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    fn status(&self, service: &str) -> Result<ServiceState>;
}

/// Available driver implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// Records calls in memory without touching any runtime.
    Memory,
    /// Shells out to the `docker` CLI.
    Docker,
}

/// Creates a driver of the given kind for a project.
///
/// # Errors
///
/// Returns an error if the driver's runtime is unavailable.
pub fn driver_for(kind: DriverKind, project: &str) -> Result<Box<dyn RuntimeDriver>> {
    match kind {
        DriverKind::Memory => Ok(Box::new(memory::MemoryDriver::new())),
        DriverKind::Docker => Ok(Box::new(docker::DockerDriver::new(project)?)),
    }
}
