//! Driver that shells out to the `docker` CLI.
//!
//! Containers are named `<project>-<service>` and join the planned network
//! with the service name as an alias, so peers reach each other by service
//! name. A failed `docker run` is followed by a best-effort `rm -f` so a
//! half-created container does not block the next attempt.

use std::path::PathBuf;
use std::process::{Command, Output};

use stackup_common::error::{Result, StackupError};
use stackup_common::types::{ContainerId, ServiceState};
use stackup_compose::composer::PlannedService;

use super::RuntimeDriver;

const DOCKER_BINARY: &str = "docker";

/// Driver backed by the Docker CLI.
#[derive(Debug, Clone)]
pub struct DockerDriver {
    binary: PathBuf,
    project: String,
}

impl DockerDriver {
    /// Locates `docker` on `PATH` and creates a driver for `project`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the binary is not installed.
    pub fn new(project: &str) -> Result<Self> {
        let binary = which::which(DOCKER_BINARY).map_err(|_| StackupError::NotFound {
            kind: "container runtime binary",
            id: format!("{DOCKER_BINARY} (install Docker or use --dry-run)"),
        })?;
        tracing::debug!(binary = %binary.display(), project, "docker driver ready");
        Ok(Self {
            binary,
            project: project.to_string(),
        })
    }

    /// Name of the container backing `service`.
    #[must_use]
    pub fn container_name(&self, service: &str) -> String {
        container_name(&self.project, service)
    }

    fn docker(&self, args: &[String]) -> Result<Output> {
        tracing::debug!(args = ?args, "docker");
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| StackupError::Io {
                path: self.binary.clone(),
                source: e,
            })
    }

    fn docker_checked(&self, args: &[String]) -> Result<String> {
        let output = self.docker(args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        Err(StackupError::Driver {
            message: format!(
                "docker {} failed: {}",
                args.first().map_or("", String::as_str),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        })
    }

    /// Removes a container a failed `docker run` may have created.
    fn remove_leftover(&self, service: &str) {
        let name = self.container_name(service);
        match self.docker_checked(&owned(["rm", "-f", name.as_str()])) {
            Ok(_) => tracing::debug!(service, container = %name, "removed container left by failed run"),
            Err(e) => {
                tracing::warn!(service, container = %name, error = %e, "could not remove container left by failed run");
            }
        }
    }

    fn ensure_network(&self, network: &str) -> Result<()> {
        let inspect = self.docker(&owned(["network", "inspect", network]))?;
        if inspect.status.success() {
            return Ok(());
        }
        tracing::info!(network, "creating network");
        let _ = self.docker_checked(&owned(["network", "create", network]))?;
        Ok(())
    }
}

impl RuntimeDriver for DockerDriver {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn start(&self, service: &PlannedService) -> Result<ContainerId> {
        self.ensure_network(&service.network)?;
        let args = run_args(&self.project, service);
        let output = self.docker(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if needs_cleanup_after_failed_run(&stderr) {
                self.remove_leftover(&service.name);
            }
            return Err(StackupError::Driver {
                message: format!("docker run {} failed: {stderr}", service.name),
            });
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!(service = %service.name, id = %id, image = %service.image, "container started");
        Ok(ContainerId::new(id))
    }

    fn stop(&self, service: &str) -> Result<()> {
        let name = self.container_name(service);
        let _ = self.docker_checked(&owned(["rm", "-f", name.as_str()]))?;
        tracing::info!(service, container = %name, "container removed");
        Ok(())
    }

    fn status(&self, service: &str) -> Result<ServiceState> {
        let name = self.container_name(service);
        let output = self.docker(&owned(["inspect", "-f", "{{.State.Status}}", name.as_str()]))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such object") || stderr.contains("No such container") {
                return Ok(ServiceState::Stopped);
            }
            return Err(StackupError::Driver {
                message: format!("docker inspect {name} failed: {}", stderr.trim()),
            });
        }
        Ok(parse_status(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Container name for a service within a project.
#[must_use]
pub fn container_name(project: &str, service: &str) -> String {
    format!("{project}-{service}")
}

/// Arguments for `docker run` starting `service` detached.
#[must_use]
pub fn run_args(project: &str, service: &PlannedService) -> Vec<String> {
    let mut args = owned(["run", "-d", "--name"]);
    args.push(container_name(project, service.name.as_str()));
    args.extend(owned(["--network", service.network.as_str()]));
    args.extend(owned(["--network-alias", service.name.as_str()]));
    for port in &service.ports {
        args.push("-p".into());
        args.push(port.to_string());
    }
    for (key, value) in &service.env {
        args.push("-e".into());
        args.push(format!("{key}={value}"));
    }
    args.push(service.image.clone());
    args
}

/// Whether a failed `docker run` may have left a container behind.
///
/// A name conflict means the existing container belongs to someone else and
/// must not be removed.
#[must_use]
pub fn needs_cleanup_after_failed_run(stderr: &str) -> bool {
    !stderr.contains("is already in use")
}

/// Maps a `docker inspect` status string onto the lifecycle.
#[must_use]
pub fn parse_status(raw: &str) -> ServiceState {
    match raw.trim() {
        "created" | "restarting" => ServiceState::Starting,
        "running" | "paused" => ServiceState::Running,
        "removing" => ServiceState::Stopping,
        "dead" => ServiceState::Failed,
        _ => ServiceState::Stopped,
    }
}

fn owned<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use stackup_common::types::PortMapping;

    use super::*;

    fn pgbouncer() -> PlannedService {
        let mut env = BTreeMap::new();
        let _ = env.insert("DB_HOST".to_string(), "db".to_string());
        let _ = env.insert("DB_USER".to_string(), "admin".to_string());
        PlannedService {
            name: "pgbouncer".into(),
            image: "edoburu/pgbouncer".into(),
            ports: vec![PortMapping::tcp(6432, 5432)],
            env,
            network: "invest_default".into(),
            depends_on: vec!["db".into()],
        }
    }

    #[test]
    fn run_args_name_network_ports_and_env() {
        let args = run_args("invest", &pgbouncer());
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "invest-pgbouncer",
                "--network",
                "invest_default",
                "--network-alias",
                "pgbouncer",
                "-p",
                "6432:5432",
                "-e",
                "DB_HOST=db",
                "-e",
                "DB_USER=admin",
                "edoburu/pgbouncer",
            ]
        );
    }

    #[test]
    fn udp_ports_keep_protocol() {
        let mut svc = pgbouncer();
        svc.ports = vec!["53:53/udp".parse().unwrap()];
        let args = run_args("p", &svc);
        assert!(args.contains(&"53:53/udp".to_string()));
    }

    #[test]
    fn status_strings_map_to_states() {
        assert_eq!(parse_status("running\n"), ServiceState::Running);
        assert_eq!(parse_status("created"), ServiceState::Starting);
        assert_eq!(parse_status("exited"), ServiceState::Stopped);
        assert_eq!(parse_status("dead"), ServiceState::Failed);
        assert_eq!(parse_status("removing"), ServiceState::Stopping);
    }

    #[test]
    fn failed_run_is_cleaned_up_unless_name_conflicts() {
        assert!(needs_cleanup_after_failed_run(
            "docker: Error response from daemon: driver failed programming external connectivity: Bind for 0.0.0.0:6432 failed: port is already allocated."
        ));
        assert!(needs_cleanup_after_failed_run(
            "docker: Error response from daemon: failed to create task for container: exec: \"pgbouncer\": executable file not found in $PATH"
        ));
        assert!(!needs_cleanup_after_failed_run(
            "docker: Error response from daemon: Conflict. The container name \"/invest-pgbouncer\" is already in use by container \"4f2a\"."
        ));
    }

    #[test]
    fn container_names_are_project_scoped() {
        assert_eq!(container_name("invest", "db"), "invest-db");
    }
}
