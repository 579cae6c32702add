//! Unified error types for the stackup workspace.
//!
//! Configuration-authoring defects (`DuplicateService`, `UnknownService`,
//! `CyclicDependency`, `MissingConfig`) are raised before anything is
//! started. `RuntimeStart` is the only variant produced after services have
//! been touched, and it carries the list of services that were started.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackupError {
    /// A required configuration reference has no value in the environment source.
    #[error("missing required variable {variable} for service {service}")]
    MissingConfig {
        /// Name of the unresolved variable.
        variable: String,
        /// Service that declared the reference.
        service: String,
    },

    /// A service with the same name is already part of the topology.
    #[error("duplicate service name: \"{name}\"")]
    DuplicateService {
        /// The colliding name.
        name: String,
    },

    /// A dependency edge references a service that does not exist.
    #[error("unknown service: \"{name}\"")]
    UnknownService {
        /// The missing service name.
        name: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency detected involving service \"{member}\"")]
    CyclicDependency {
        /// One service that is part of the cycle.
        member: String,
    },

    /// The runtime failed to start a service; forward progress was halted.
    #[error(
        "failed to start service {service} (started before failure: [{}]): {source}",
        .started.join(", ")
    )]
    RuntimeStart {
        /// Service whose start failed.
        service: String,
        /// Services started before the failure, in start order.
        started: Vec<String>,
        /// Services whose rollback stop also failed.
        teardown_failures: Vec<String>,
        /// Underlying driver failure.
        source: Box<StackupError>,
    },

    /// A runtime driver reported a failure.
    #[error("runtime driver error: {message}")]
    Driver {
        /// Description of the failure.
        message: String,
    },

    /// Starting was cancelled by an interrupt before this service began.
    #[error("interrupted before starting service {service}")]
    Interrupted {
        /// Service that was next in line.
        service: String,
    },

    /// A lifecycle transition was attempted that the state machine forbids.
    #[error("service {service} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Service whose state was being changed.
        service: String,
        /// Current state.
        from: crate::types::ServiceState,
        /// Requested state.
        to: crate::types::ServiceState,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A topology declaration could not be parsed.
    #[error("invalid topology declaration: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl StackupError {
    /// Returns `true` for errors caused by the topology or environment
    /// rather than by the runtime.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig { .. }
                | Self::DuplicateService { .. }
                | Self::UnknownService { .. }
                | Self::CyclicDependency { .. }
                | Self::Config { .. }
                | Self::Yaml { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackupError>;
