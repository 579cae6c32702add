//! `stackup status` — Show the runtime state of every service.

use clap::Args;
use stackup_common::config::StackupConfig;
use stackup_common::types::ServiceState;
use stackup_runtime::backend::{self, DriverKind};
use stackup_runtime::engine::Engine;
use stackup_runtime::state::{self, Deployment};

use crate::output::{self, RED, RESET};

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list services that are not running.
    #[arg(short, long)]
    pub all: bool,
}

/// Executes the `status` command.
///
/// Lists the services of the recorded deployment, or of the declaration
/// when nothing is recorded, with the state the runtime reports.
///
/// # Errors
///
/// Returns an error if the declaration or record cannot be read, or the
/// runtime cannot be queried.
pub fn execute(args: StatusArgs, config: &StackupConfig) -> anyhow::Result<()> {
    let recorded = state::load_state(&config.state_file)?;
    let (project, names): (String, Vec<String>) = match &recorded {
        Some(deployment) => (
            deployment.project.clone(),
            deployment.services.iter().map(|s| s.name.clone()).collect(),
        ),
        None => {
            let topology = super::load_topology(config)?;
            let graph = topology.graph()?;
            let names = graph.topological_order()?.to_names();
            (topology.project, names)
        }
    };

    let driver = backend::driver_for(DriverKind::Docker, &project)?;
    let report = Engine::new(driver).status(names.iter().map(String::as_str))?;

    let rows: Vec<_> = report
        .into_iter()
        .filter(|(_, state)| args.all || *state != ServiceState::Stopped)
        .collect();
    if rows.is_empty() {
        println!("No services running for project {project}.");
        return Ok(());
    }

    println!("{:<3}{:<24} {:<10} {:<40} {:<10}", "", "SERVICE", "STATE", "CONTAINER", "UPTIME");
    for (name, state) in &rows {
        println!("{}", render_row(name, *state, recorded.as_ref()));
    }
    Ok(())
}

fn render_row(name: &str, state: ServiceState, recorded: Option<&Deployment>) -> String {
    let entry = recorded.and_then(|d| d.service(name));
    let container = entry.map_or("-", |e| e.container_id.as_str());
    let uptime = match (state, entry) {
        (ServiceState::Running, Some(e)) => output::uptime_since(&e.started_at),
        _ => "-".to_string(),
    };
    let state_text = if state == ServiceState::Failed {
        format!("{RED}{:<10}{RESET}", state.to_string())
    } else {
        format!("{:<10}", state.to_string())
    };
    format!(
        "{}  {name:<24} {state_text} {container:<40} {uptime:<10}",
        output::state_marker(state)
    )
}
