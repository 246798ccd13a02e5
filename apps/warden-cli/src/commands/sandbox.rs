// sandbox.rs — `warden sandbox run`: one command in a throwaway directory.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Subcommand;
use warden_gatekeeper::WardenConfig;
use warden_policy::Operation;

use super::{format_decision, open_manager};

#[derive(Subcommand)]
pub enum SandboxCommands {
    /// Validate a command, then run it in a fresh sandbox.
    Run {
        #[arg(long, default_value = "cli")]
        agent: String,
        /// Seed the sandbox with a filtered copy of the project.
        #[arg(long)]
        copy_project: bool,
        /// Kill the command after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Command and arguments, after `--`.
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },
}

pub fn execute(
    cmd: &SandboxCommands,
    config: &WardenConfig,
    project_root: &Path,
) -> anyhow::Result<()> {
    match cmd {
        SandboxCommands::Run {
            agent,
            copy_project,
            timeout,
            cmd,
        } => {
            let Some((program, args)) = cmd.split_first() else {
                anyhow::bail!("no command given");
            };
            let manager = open_manager(config)?;

            let operation = Operation::command(cmd.join(" "));
            let decision = manager.validate_operation(agent, &operation)?;
            if !decision.is_allowed() {
                println!("{}", format_decision(&operation, &decision));
                anyhow::bail!("operation denied");
            }

            let project = (*copy_project || config.sandbox.copy_project).then_some(project_root);
            let execution = manager.run_sandboxed(
                agent,
                project,
                program,
                args,
                timeout.map(Duration::from_secs),
            )?;

            std::io::stdout().write_all(execution.stdout.as_bytes())?;
            std::io::stderr().write_all(execution.stderr.as_bytes())?;

            if execution.timed_out {
                anyhow::bail!("command timed out after {}s", timeout.unwrap_or_default());
            }
            match execution.exit_code {
                Some(0) => Ok(()),
                Some(code) => anyhow::bail!("command exited with status {}", code),
                None => anyhow::bail!("command was killed"),
            }
        }
    }
}
