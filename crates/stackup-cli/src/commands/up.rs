//! `stackup up` — Start the topology in dependency order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Args;
use stackup_common::config::StackupConfig;
use stackup_compose::composer::TopologyPlan;
use stackup_runtime::backend::memory::MemoryDriver;
use stackup_runtime::backend::{self, DriverKind};
use stackup_runtime::engine::Engine;
use stackup_runtime::state::{self, Deployment};

use crate::output::{self, BOLD, CYAN, DIM, GREEN, RESET, YELLOW};

/// Arguments for the `up` command.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Walk the plan with an in-memory driver; nothing is started or saved.
    #[arg(long)]
    pub dry_run: bool,

    /// Return after starting instead of waiting for Ctrl+C.
    #[arg(short, long)]
    pub detach: bool,
}

/// Executes the `up` command.
///
/// # Errors
///
/// Returns an error if composition fails, a service fails to start, or
/// the deployment record cannot be written.
pub fn execute(args: UpArgs, config: &StackupConfig) -> anyhow::Result<()> {
    let total_start = Instant::now();
    let plan = super::compose_plan(config)?;
    print_header(&plan);

    if args.dry_run {
        return dry_run(&plan);
    }

    if let Some(existing) = state::load_state(&config.state_file)? {
        anyhow::bail!(
            "project {} is already up ({} service(s) recorded in {}).\n\
             Run `stackup down` first.",
            existing.project,
            existing.services.len(),
            config.state_file.display()
        );
    }

    let interrupted = install_interrupt_handler()?;
    let driver = backend::driver_for(DriverKind::Docker, plan.project())?;
    let mut engine = Engine::new(driver).with_interrupt(Arc::clone(&interrupted));
    let deployment = engine.up(&plan)?;
    state::save_state(&config.state_file, &deployment)?;
    report(&plan, &deployment, total_start);

    eprintln!();
    eprintln!("  {DIM}State: {}{RESET}", config.state_file.display());

    if args.detach {
        eprintln!();
        eprintln!("  Running detached. Use {BOLD}stackup down{RESET} to stop all services.");
        return Ok(());
    }

    wait_for_shutdown(&mut engine, &deployment, config, &interrupted)
}

/// Installs the Ctrl+C handler; the returned flag is set once it fires.
fn install_interrupt_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;
    Ok(interrupted)
}

fn print_header(plan: &TopologyPlan) {
    eprintln!();
    eprintln!(
        "  {BOLD}stackup{RESET} {DIM}v{}{RESET}  project {BOLD}{}{RESET}",
        env!("CARGO_PKG_VERSION"),
        plan.project()
    );
    eprintln!();
}

fn dry_run(plan: &TopologyPlan) -> anyhow::Result<()> {
    let driver = MemoryDriver::new();
    let mut engine = Engine::new(Box::new(driver.clone()));
    let _ = engine.up(plan)?;

    eprintln!("  {YELLOW}Dry run:{RESET} nothing was started.");
    eprintln!();
    for (position, name) in driver.started().iter().enumerate() {
        let ports = plan
            .service(name)
            .map_or_else(|| "-".to_string(), |svc| output::format_ports(&svc.ports));
        eprintln!("    {}. would start {BOLD}{name}{RESET} {DIM}[{ports}]{RESET}", position + 1);
    }
    Ok(())
}

fn report(plan: &TopologyPlan, deployment: &Deployment, total_start: Instant) {
    eprintln!(
        "  {GREEN}{BOLD}Started {}{RESET} service(s) in {:.1}s:",
        deployment.services.len(),
        total_start.elapsed().as_secs_f64()
    );
    eprintln!();

    for svc in &deployment.services {
        let ports = plan
            .service(&svc.name)
            .map(|planned| planned.ports.as_slice())
            .unwrap_or_default();
        let port_info = ports.first().map_or_else(String::new, |p| {
            format!(" {CYAN}->{RESET} localhost:{}", p.host)
        });
        eprintln!(
            "    {GREEN}\u{25cf}{RESET} {BOLD}{}{RESET} {DIM}[{}]{RESET}{port_info}",
            svc.name, svc.container_id
        );
    }
}

fn wait_for_shutdown(
    engine: &mut Engine,
    deployment: &Deployment,
    config: &StackupConfig,
    interrupted: &AtomicBool,
) -> anyhow::Result<()> {
    eprintln!();
    eprintln!("  Press {BOLD}Ctrl+C{RESET} to stop all services...");

    while !interrupted.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(250));
    }

    eprintln!();
    eprintln!("  Stopping services...");
    let stopped = engine.down_deployment(deployment)?;
    state::clear_state(&config.state_file)?;
    eprintln!("  {GREEN}Stopped {} service(s).{RESET}", stopped.len());
    Ok(())
}
