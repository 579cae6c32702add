//! `stackup plan` — Display the resolved, ordered plan before applying.

use clap::{Args, ValueEnum};
use stackup_common::config::StackupConfig;
use stackup_compose::composer::TopologyPlan;

use crate::output::{self, BOLD, CYAN, DIM, RESET};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,
}

/// How the plan is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Human-readable listing with credentials masked.
    Text,
    /// The full plan as JSON.
    Json,
}

/// Executes the `plan` command.
///
/// # Errors
///
/// Returns an error if parsing, validation, ordering, or resolution fails.
pub fn execute(args: PlanArgs, config: &StackupConfig) -> anyhow::Result<()> {
    let plan = super::compose_plan(config)?;
    match args.format {
        PlanFormat::Text => print!("{}", render_text(&plan)),
        PlanFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

/// Renders the plan for a terminal, masking sensitive values.
pub fn render_text(plan: &TopologyPlan) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "Deployment plan for project {BOLD}{}{RESET}", plan.project());
    let _ = writeln!(out, "{}", "\u{2550}".repeat(40));
    let _ = writeln!(out);

    for (position, svc) in plan.services().iter().enumerate() {
        let _ = writeln!(out, "  {}. + {BOLD}{}{RESET}", position + 1, svc.name);
        let _ = writeln!(out, "      image:   {}", svc.image);
        let _ = writeln!(out, "      network: {}", svc.network);
        if !svc.ports.is_empty() {
            let _ = writeln!(out, "      ports:   {}", output::format_ports(&svc.ports));
        }
        if !svc.depends_on.is_empty() {
            let _ = writeln!(out, "      after:   {}", svc.depends_on.join(", "));
        }
        for (key, value) in svc.masked_env() {
            let _ = writeln!(out, "      {DIM}env{RESET} {key}={value}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {} service(s) will be started.", plan.len());
    let networks = plan.networks();
    if !networks.is_empty() {
        let _ = writeln!(out, "  {CYAN}networks:{RESET} {}", networks.join(", "));
    }
    out
}
