//! Domain primitive types used across the stackup workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackupError};

/// Identifier a runtime assigns to a started service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport protocol of a port binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (the default).
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// A host-to-container port binding.
///
/// Written as `"HOST:CONTAINER"`, `"HOST:CONTAINER/udp"` or `"PORT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortMapping {
    /// Port published on the host.
    pub host: u16,
    /// Port inside the container.
    pub container: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl PortMapping {
    /// Creates a TCP mapping.
    #[must_use]
    pub const fn tcp(host: u16, container: u16) -> Self {
        Self {
            host,
            container,
            protocol: Protocol::Tcp,
        }
    }
}

fn parse_port(raw: &str, input: &str) -> Result<u16> {
    let port: u16 = raw.trim().parse().map_err(|_| StackupError::Config {
        message: format!("invalid port mapping \"{input}\": \"{raw}\" is not a port number"),
    })?;
    if port == 0 {
        return Err(StackupError::Config {
            message: format!("invalid port mapping \"{input}\": port 0 is not allowed"),
        });
    }
    Ok(port)
}

impl FromStr for PortMapping {
    type Err = StackupError;

    fn from_str(input: &str) -> Result<Self> {
        let (ports, protocol) = match input.split_once('/') {
            Some((ports, "tcp")) => (ports, Protocol::Tcp),
            Some((ports, "udp")) => (ports, Protocol::Udp),
            Some((_, other)) => {
                return Err(StackupError::Config {
                    message: format!("invalid port mapping \"{input}\": unknown protocol \"{other}\""),
                });
            }
            None => (input, Protocol::Tcp),
        };

        let (host, container) = match ports.split_once(':') {
            Some((host, container)) => (parse_port(host, input)?, parse_port(container, input)?),
            None => {
                let port = parse_port(ports, input)?;
                (port, port)
            }
        };

        Ok(Self {
            host,
            container,
            protocol,
        })
    }
}

impl TryFrom<String> for PortMapping {
    type Error = StackupError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PortMapping> for String {
    fn from(mapping: PortMapping) -> Self {
        mapping.to_string()
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)?;
        if self.protocol == Protocol::Udp {
            write!(f, "/udp")?;
        }
        Ok(())
    }
}

/// Lifecycle state of a service managed by the runtime engine.
///
/// ```text
/// Pending -> Starting -> Running -> Stopping -> Stopped
///                    \-> Failed  -/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Planned but not yet touched.
    Pending,
    /// A start call is in flight.
    Starting,
    /// The runtime confirmed the service is up.
    Running,
    /// The start call failed.
    Failed,
    /// A stop call is in flight.
    Stopping,
    /// The service was stopped.
    Stopped,
}

impl ServiceState {
    /// Returns whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Starting)
                | (Self::Starting, Self::Running | Self::Failed)
                | (Self::Running | Self::Failed, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
        )
    }

    /// Returns `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns [`StackupError::InvalidTransition`] otherwise.
    pub fn transition(self, service: &str, next: Self) -> Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StackupError::InvalidTransition {
                service: service.to_string(),
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Failed => write!(f, "failed"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
