use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use conduit_lib::consts::{APP_NAME, ENV_LOG};

mod cmd;
mod output;

use output::OutputFormat;

/// Build and migration tooling for Conduit applications
#[derive(Parser)]
#[command(name = APP_NAME, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

/// Locates the project and its entry script.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
  /// Project directory (contains packages.json)
  #[arg(long, default_value = ".")]
  pub project: PathBuf,

  /// Entry script relative to the project directory (default: bin/main.lua)
  #[arg(long)]
  pub entry: Option<PathBuf>,

  /// Bound on each worker run, e.g. 30s or 2m; 0 disables it
  #[arg(long)]
  pub timeout: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Stage the entry script and run the project's build hooks
  Build {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Remove the build directory
  Clean {
    /// Project directory
    #[arg(long, default_value = ".")]
    project: PathBuf,
  },

  /// Generate and inspect schema migrations
  Migrate {
    #[command(subcommand)]
    command: MigrateCommands,
  },

  /// Serve one isolated request on stdin/stdout
  #[command(hide = true)]
  Worker,
}

#[derive(Subcommand)]
enum MigrateCommands {
  /// Diff the project's models against existing migrations and write the next one
  Generate {
    #[command(flatten)]
    project: ProjectArgs,

    /// Name of the migration file (lowercase letters, digits and underscores)
    #[arg(long, default_value = "migration")]
    name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print the schema the existing migrations describe
  Schema {
    /// Project directory
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Build { project, output } => cmd::cmd_build(&project, output),
    Commands::Clean { project } => cmd::cmd_clean(&project),
    Commands::Migrate { command } => match command {
      MigrateCommands::Generate { project, name, output } => cmd::cmd_migrate_generate(&project, &name, output),
      MigrateCommands::Schema { project, output } => cmd::cmd_migrate_schema(&project, output),
    },
    Commands::Worker => cmd::cmd_worker(),
  }
}
