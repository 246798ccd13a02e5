//! # warden-cli
//!
//! Command-line interface for Warden.
//!
//! - `warden check` — validate one operation against policy and the monitor
//! - `warden replay` — validate a JSONL file of operations in order
//! - `warden audit tail/query/verify` — inspect the decision trail
//! - `warden backup create/list/restore/verify/cleanup` — manage backups
//! - `warden rollback` — reset the project to an earlier git revision
//! - `warden sandbox run` — run a command in a disposable sandbox

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warden_gatekeeper::WardenConfig;

/// Warden — safety governor for coding agents.
#[derive(Parser)]
#[command(name = "warden", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".", global = true)]
    project_root: PathBuf,

    /// Config file (defaults to <project>/.warden/warden.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single operation. Exits non-zero when denied.
    Check(commands::check::CheckArgs),
    /// Validate each operation in a JSONL file, in order.
    Replay {
        /// Agent the operations are attributed to.
        #[arg(long, default_value = "cli")]
        agent: String,
        /// File with one operation request per line.
        file: PathBuf,
    },
    /// Inspect the audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
    /// Manage project backups.
    Backup {
        #[command(subcommand)]
        command: commands::backup::BackupCommands,
    },
    /// Reset the project to an earlier git revision.
    Rollback {
        /// Revision to reset to (default HEAD~1).
        #[arg(long)]
        revision: Option<String>,
        #[arg(long, default_value = "cli")]
        agent: String,
    },
    /// Run commands in disposable sandboxes.
    Sandbox {
        #[command(subcommand)]
        command: commands::sandbox::SandboxCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("warden_cli=info".parse()?)
                .add_directive("warden_gatekeeper=info".parse()?)
                .add_directive("warden_monitor=info".parse()?)
                .add_directive("warden_sandbox=info".parse()?)
                .add_directive("warden_recovery=info".parse()?)
                .add_directive("warden_audit=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = WardenConfig::load_for_project(&project_root, cli.config.as_deref())?;

    match &cli.command {
        Commands::Check(args) => commands::check::execute(args, &config),
        Commands::Replay { agent, file } => commands::replay::execute(agent, file, &config),
        Commands::Audit { command } => commands::audit::execute(command, &config),
        Commands::Backup { command } => commands::backup::execute(command, &config, &project_root),
        Commands::Rollback { revision, agent } => {
            commands::rollback::execute(agent, revision.as_deref(), &config, &project_root)
        }
        Commands::Sandbox { command } => {
            commands::sandbox::execute(command, &config, &project_root)
        }
    }
}
