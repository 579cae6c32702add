//! `stackup down` — Stop the topology in reverse order.

use clap::Args;
use stackup_common::config::StackupConfig;
use stackup_runtime::backend::{self, DriverKind};
use stackup_runtime::engine::Engine;
use stackup_runtime::state;

use crate::output::{GREEN, RESET};

/// Arguments for the `down` command.
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Ignore the deployment record and stop every service of the plan.
    #[arg(long)]
    pub from_plan: bool,
}

/// Executes the `down` command.
///
/// Stops exactly what the last `up` recorded, newest first. Without a
/// record (or with `--from-plan`) the plan is recomposed and every service
/// the runtime reports as active is stopped in reverse plan order.
///
/// # Errors
///
/// Returns an error if any service fails to stop; the record is kept so
/// `down` can be retried.
pub fn execute(args: DownArgs, config: &StackupConfig) -> anyhow::Result<()> {
    let recorded = if args.from_plan {
        None
    } else {
        state::load_state(&config.state_file)?
    };

    let stopped = if let Some(deployment) = recorded {
        tracing::info!(project = %deployment.project, services = deployment.services.len(), "tearing down recorded deployment");
        let driver = backend::driver_for(DriverKind::Docker, &deployment.project)?;
        Engine::new(driver).down_deployment(&deployment)?
    } else {
        let plan = super::compose_plan(config)?;
        let driver = backend::driver_for(DriverKind::Docker, plan.project())?;
        Engine::new(driver).down(&plan)?
    };

    state::clear_state(&config.state_file)?;

    if stopped.is_empty() {
        eprintln!("  Nothing to stop.");
    } else {
        eprintln!("  {GREEN}Stopped:{RESET} {}", stopped.join(", "));
    }
    Ok(())
}
