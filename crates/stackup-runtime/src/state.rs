//! Persistent deployment state.
//!
//! After `up`, a JSON record of the started services is written to the
//! project's `.stackup/state.json`, so `down` and `status` work from a
//! later invocation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stackup_common::error::{Result, StackupError};
use stackup_common::types::ContainerId;

/// A service recorded as started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedService {
    /// Service name.
    pub name: String,
    /// Identifier returned by the driver.
    pub container_id: ContainerId,
    /// Network the service joined.
    pub network: String,
    /// RFC 3339 timestamp of the start.
    pub started_at: String,
}

/// Record of a deployed topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Project name.
    pub project: String,
    /// Driver that started the services.
    pub driver: String,
    /// RFC 3339 timestamp of the deployment.
    pub created_at: String,
    /// Started services, in start order.
    pub services: Vec<DeployedService>,
}

impl Deployment {
    /// Creates an empty deployment stamped with the current time.
    #[must_use]
    pub fn new(project: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            driver: driver.into(),
            created_at: now(),
            services: Vec::new(),
        }
    }

    /// Service names in stop order (reverse of start order).
    pub fn stop_order(&self) -> impl Iterator<Item = &str> {
        self.services.iter().rev().map(|s| s.name.as_str())
    }

    /// Looks up a recorded service.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&DeployedService> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Current time as an RFC 3339 string.
#[must_use]
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Loads the deployment record, if one exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<Option<Deployment>> {
    tracing::debug!(path = %path.display(), "loading deployment state");
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| StackupError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Persists the deployment record atomically.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_state(path: &Path, deployment: &Deployment) -> Result<()> {
    tracing::debug!(path = %path.display(), services = deployment.services.len(), "saving deployment state");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StackupError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(deployment)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| StackupError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| StackupError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Removes the deployment record. A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_state(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StackupError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
