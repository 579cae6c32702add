//! Runtime configuration model for a stackup invocation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Settings shared by every command of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackupConfig {
    /// Path to the topology declaration.
    pub topology_file: PathBuf,
    /// Dotenv files layered beneath the process environment, in order.
    /// Missing files are skipped.
    pub env_files: Vec<PathBuf>,
    /// Whether the process environment is layered on top of the files.
    pub use_process_env: bool,
    /// Overrides the project name from the declaration.
    pub project: Option<String>,
    /// Path to the persisted deployment record.
    pub state_file: PathBuf,
}

impl StackupConfig {
    /// Builds a configuration for the given topology file with the default
    /// env files and state location.
    #[must_use]
    pub fn for_topology(topology_file: impl Into<PathBuf>) -> Self {
        let topology_file = topology_file.into();
        let base = topology_file
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_default();
        Self {
            env_files: constants::DEFAULT_ENV_FILES
                .iter()
                .map(|f| base.join(f))
                .collect(),
            use_process_env: true,
            project: None,
            state_file: constants::default_state_file(&topology_file),
            topology_file,
        }
    }
}

impl Default for StackupConfig {
    fn default() -> Self {
        Self::for_topology(constants::DEFAULT_TOPOLOGY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layers_example_then_local_env() {
        let config = StackupConfig::default();
        assert_eq!(
            config.env_files,
            vec![PathBuf::from(".env.example"), PathBuf::from(".env")]
        );
        assert!(config.use_process_env);
    }

    #[test]
    fn env_files_resolve_relative_to_topology() {
        let config = StackupConfig::for_topology("/srv/app/stackup.yml");
        assert_eq!(config.env_files[1], PathBuf::from("/srv/app/.env"));
        assert_eq!(
            config.state_file,
            PathBuf::from("/srv/app/.stackup/state.json")
        );
    }
}
