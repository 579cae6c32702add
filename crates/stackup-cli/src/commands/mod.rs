//! CLI command definitions and dispatch.

pub mod down;
pub mod plan;
pub mod status;
pub mod up;
pub mod validate;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use stackup_common::config::StackupConfig;
use stackup_common::constants::{DEFAULT_TOPOLOGY_FILE, FILE_ENV_VAR};
use stackup_compose::composer::{TopologyComposer, TopologyPlan};
use stackup_compose::declaration::{Topology, TopologyDeclaration};
use stackup_compose::env::EnvSource;

/// stackup: environment-driven service topologies.
#[derive(Parser, Debug)]
#[command(name = "stackup", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the topology declaration.
    #[arg(short, long, global = true, env = FILE_ENV_VAR, default_value = DEFAULT_TOPOLOGY_FILE)]
    pub file: PathBuf,

    /// Extra dotenv file layered after the defaults (repeatable).
    #[arg(long = "env-file", global = true)]
    pub env_files: Vec<PathBuf>,

    /// Override the project name from the declaration.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Skip `.env.example` and `.env` next to the topology file.
    #[arg(long, global = true)]
    pub no_default_env_files: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the declaration and environment without starting anything.
    Validate(validate::ValidateArgs),
    /// Display the resolved, ordered plan.
    Plan(plan::PlanArgs),
    /// Start the topology in dependency order.
    Up(up::UpArgs),
    /// Stop the topology in reverse order.
    Down(down::DownArgs),
    /// Show the runtime state of every service.
    Status(status::StatusArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = config_from(&cli)?;
    match cli.command {
        Command::Validate(args) => validate::execute(args, &config),
        Command::Plan(args) => plan::execute(args, &config),
        Command::Up(args) => up::execute(args, &config),
        Command::Down(args) => down::execute(args, &config),
        Command::Status(args) => status::execute(args, &config),
    }
}

/// Builds the invocation config from global flags.
///
/// Explicitly named env files must exist; the defaults are optional.
fn config_from(cli: &Cli) -> anyhow::Result<StackupConfig> {
    let mut config = StackupConfig::for_topology(&cli.file);
    if cli.no_default_env_files {
        config.env_files.clear();
    }
    for path in &cli.env_files {
        if !path.is_file() {
            anyhow::bail!("env file not found: {}", path.display());
        }
        config.env_files.push(path.clone());
    }
    config.project.clone_from(&cli.project);
    Ok(config)
}

/// Reads the declaration named by `config`.
pub fn load_topology(config: &StackupConfig) -> anyhow::Result<Topology> {
    if !config.topology_file.exists() {
        anyhow::bail!(
            "topology file not found: {}\n\
             Create {DEFAULT_TOPOLOGY_FILE} or pass --file <path>",
            config.topology_file.display()
        );
    }
    let topology = TopologyDeclaration::load(&config.topology_file)?
        .into_topology(config.project.as_deref())
        .with_context(|| format!("in {}", config.topology_file.display()))?;
    Ok(topology)
}

/// Loads the declaration and environment and composes the plan.
pub fn compose_plan(config: &StackupConfig) -> anyhow::Result<TopologyPlan> {
    let topology = load_topology(config)?;
    let graph = topology.graph()?;
    let env = EnvSource::load(config)?;
    let plan = TopologyComposer::new(env)
        .with_project(topology.project)
        .with_default_network(topology.network)
        .compose(&graph)?;
    Ok(plan)
}
