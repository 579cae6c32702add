//! Runtime engine that drives a topology plan through a driver.
//!
//! Starts are issued strictly in plan order and each one returns before the
//! next begins. The first failure halts forward progress and every service
//! started so far is stopped again in reverse start order. An interrupt
//! flag, when attached, is checked before every start and counts as a
//! failure of the next service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use stackup_common::error::{Result, StackupError};
use stackup_common::types::ServiceState;
use stackup_compose::composer::TopologyPlan;

use crate::backend::RuntimeDriver;
use crate::state::{self, DeployedService, Deployment};

/// The runtime engine that coordinates all service operations.
pub struct Engine {
    driver: Box<dyn RuntimeDriver>,
    states: BTreeMap<String, ServiceState>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Engine {
    /// Creates an engine on top of a driver.
    #[must_use]
    pub fn new(driver: Box<dyn RuntimeDriver>) -> Self {
        Self {
            driver,
            states: BTreeMap::new(),
            interrupt: None,
        }
    }

    /// Attaches a flag that cancels `up` once set.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Name of the underlying driver.
    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Last state the engine recorded for a service.
    #[must_use]
    pub fn state_of(&self, service: &str) -> ServiceState {
        self.states
            .get(service)
            .copied()
            .unwrap_or(ServiceState::Pending)
    }

    /// Starts every service of the plan in order.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::RuntimeStart`] when a start fails or the
    /// interrupt flag is set, after the services started before it have been
    /// stopped in reverse order.
    /// Returns [`StackupError::InvalidTransition`] before touching the
    /// runtime if a service of the plan is already active in this engine.
    pub fn up(&mut self, plan: &TopologyPlan) -> Result<Deployment> {
        for name in plan.start_order() {
            let current = self.state_of(name);
            if !matches!(current, ServiceState::Pending | ServiceState::Stopped) {
                return Err(StackupError::InvalidTransition {
                    service: name.to_string(),
                    from: current,
                    to: ServiceState::Starting,
                });
            }
            let _ = self.states.insert(name.to_string(), ServiceState::Pending);
        }

        tracing::info!(
            project = plan.project(),
            driver = self.driver.name(),
            services = plan.len(),
            "starting topology"
        );

        let mut deployment = Deployment::new(plan.project(), self.driver.name());
        for svc in plan.services() {
            let outcome = if self.interrupted() {
                Err(StackupError::Interrupted {
                    service: svc.name.clone(),
                })
            } else {
                self.advance(&svc.name, ServiceState::Starting)?;
                self.driver.start(svc)
            };
            match outcome {
                Ok(container_id) => {
                    self.advance(&svc.name, ServiceState::Running)?;
                    tracing::info!(service = %svc.name, id = %container_id, "service running");
                    deployment.services.push(DeployedService {
                        name: svc.name.clone(),
                        container_id,
                        network: svc.network.clone(),
                        started_at: state::now(),
                    });
                }
                Err(source) => {
                    if self.state_of(&svc.name) == ServiceState::Starting {
                        self.advance(&svc.name, ServiceState::Failed)?;
                    }
                    tracing::error!(service = %svc.name, error = %source, "service failed to start");
                    let started: Vec<String> =
                        deployment.services.iter().map(|s| s.name.clone()).collect();
                    let teardown_failures = self.rollback(&started);
                    return Err(StackupError::RuntimeStart {
                        service: svc.name.clone(),
                        started,
                        teardown_failures,
                        source: Box::new(source),
                    });
                }
            }
        }
        Ok(deployment)
    }

    /// Stops every service of the plan in reverse plan order.
    ///
    /// Services the runtime reports as pending or stopped are skipped.
    /// Returns the names that were stopped.
    ///
    /// # Errors
    ///
    /// Keeps going past individual failures, including services whose state
    /// cannot be queried, and then returns a [`StackupError::Driver`] naming
    /// every service that failed to stop.
    pub fn down(&mut self, plan: &TopologyPlan) -> Result<Vec<String>> {
        tracing::info!(project = plan.project(), "stopping topology");
        self.teardown(plan.stop_order())
    }

    /// Stops the services recorded in a deployment, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::down`].
    pub fn down_deployment(&mut self, deployment: &Deployment) -> Result<Vec<String>> {
        tracing::info!(project = %deployment.project, "stopping recorded deployment");
        self.teardown(deployment.stop_order())
    }

    /// Queries the runtime for the state of each named service.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot be queried.
    pub fn status<'a>(
        &mut self,
        services: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<(String, ServiceState)>> {
        let mut report = Vec::new();
        for name in services {
            let observed = self.driver.status(name)?;
            let _ = self.states.insert(name.to_string(), observed);
            report.push((name.to_string(), observed));
        }
        Ok(report)
    }

    fn advance(&mut self, service: &str, next: ServiceState) -> Result<()> {
        let next = self.state_of(service).transition(service, next)?;
        let _ = self.states.insert(service.to_string(), next);
        Ok(())
    }

    /// Stops `started` in reverse order, returning the names whose stop failed.
    fn rollback(&mut self, started: &[String]) -> Vec<String> {
        let mut failures = Vec::new();
        for name in started.iter().rev() {
            if let Err(e) = self.stop_one(name) {
                tracing::warn!(service = %name, error = %e, "rollback stop failed");
                failures.push(name.clone());
            }
        }
        failures
    }

    fn teardown<'a>(&mut self, names: impl Iterator<Item = &'a str>) -> Result<Vec<String>> {
        let mut stopped = Vec::new();
        let mut failures = Vec::new();
        for name in names {
            let queried = match self.states.get(name) {
                Some(known) => Ok(*known),
                None => self.driver.status(name),
            };
            let observed = match queried {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(service = name, error = %e, "status query failed");
                    failures.push(name.to_string());
                    continue;
                }
            };
            if matches!(observed, ServiceState::Pending | ServiceState::Stopped) {
                tracing::debug!(service = name, state = %observed, "nothing to stop");
                continue;
            }
            // Adopted runtime states may sit anywhere in the lifecycle.
            let _ = self.states.insert(name.to_string(), ServiceState::Running);
            match self.stop_one(name) {
                Ok(()) => stopped.push(name.to_string()),
                Err(e) => {
                    tracing::warn!(service = name, error = %e, "stop failed");
                    failures.push(name.to_string());
                }
            }
        }
        if failures.is_empty() {
            Ok(stopped)
        } else {
            Err(StackupError::Driver {
                message: format!("failed to stop: {}", failures.join(", ")),
            })
        }
    }

    fn stop_one(&mut self, name: &str) -> Result<()> {
        self.advance(name, ServiceState::Stopping)?;
        self.driver.stop(name)?;
        self.advance(name, ServiceState::Stopped)?;
        tracing::info!(service = name, "service stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("driver", &self.driver.name())
            .field("states", &self.states)
            .field("interruptible", &self.interrupt.is_some())
            .finish()
    }
}
