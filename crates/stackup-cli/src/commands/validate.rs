//! `stackup validate` — Check the declaration and environment.

use clap::Args;
use stackup_common::config::StackupConfig;

use crate::output::{BOLD, GREEN, RESET};

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Only report errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `validate` command.
///
/// Runs every pre-flight check `up` would run: declaration parsing,
/// dependency resolution, cycle detection, name/port checks and
/// environment resolution. Nothing is started.
///
/// # Errors
///
/// Returns the first problem found.
pub fn execute(args: ValidateArgs, config: &StackupConfig) -> anyhow::Result<()> {
    let plan = super::compose_plan(config)?;
    if !args.quiet {
        let order: Vec<_> = plan.start_order().collect();
        println!(
            "{GREEN}\u{2713}{RESET} {BOLD}{}{RESET}: {} service(s) valid",
            config.topology_file.display(),
            plan.len()
        );
        if !order.is_empty() {
            println!("  start order: {}", order.join(" \u{2192} "));
        }
    }
    Ok(())
}
