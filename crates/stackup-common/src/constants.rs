//! System-wide constants and default paths.

use std::path::{Path, PathBuf};

/// Default topology declaration file name.
pub const DEFAULT_TOPOLOGY_FILE: &str = "stackup.yml";

/// Dotenv files layered beneath the process environment, in order.
pub const DEFAULT_ENV_FILES: &[&str] = &[".env.example", ".env"];

/// Name of the project-local state directory.
pub const STATE_DIR_NAME: &str = ".stackup";

/// File name of the persisted deployment record.
pub const STATE_FILE_NAME: &str = "state.json";

/// Suffix of the network created when a topology names none.
pub const DEFAULT_NETWORK_SUFFIX: &str = "default";

/// Maximum length of a service name (DNS label limit).
pub const MAX_SERVICE_NAME_LEN: usize = 63;

/// Substrings that mark an environment variable as sensitive in plan output.
pub const SENSITIVE_ENV_MARKERS: &[&str] = &["PASSWORD", "SECRET", "TOKEN", "KEY"];

/// Environment variable overriding the topology file path.
pub const FILE_ENV_VAR: &str = "STACKUP_FILE";

/// Application name used in CLI output.
pub const APP_NAME: &str = "stackup";

/// Returns the project-local state directory for a topology file.
///
/// The directory sits next to the topology file so every project keeps
/// its own deployment record.
pub fn project_dir(topology_path: &Path) -> PathBuf {
    topology_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        .join(STATE_DIR_NAME)
}

/// Returns the default state file path for a topology file.
pub fn default_state_file(topology_path: &Path) -> PathBuf {
    project_dir(topology_path).join(STATE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_dir_sits_next_to_topology_file() {
        let dir = project_dir(Path::new("/srv/app/stackup.yml"));
        assert_eq!(dir, PathBuf::from("/srv/app/.stackup"));
    }

    #[test]
    fn bare_file_name_uses_current_directory() {
        let file = default_state_file(Path::new("stackup.yml"));
        assert_eq!(file, PathBuf::from("./.stackup/state.json"));
    }
}
