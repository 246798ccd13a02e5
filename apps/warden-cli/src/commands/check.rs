// check.rs — `warden check`: validate one operation.

use clap::Args;
use warden_gatekeeper::WardenConfig;
use warden_policy::Operation;

use super::{format_decision, open_manager};

#[derive(Args)]
pub struct CheckArgs {
    /// Agent the operation is attributed to.
    #[arg(long, default_value = "cli")]
    pub agent: String,

    #[command(flatten)]
    pub target: OperationArgs,

    /// Print every policy check that ran, not just the verdict.
    #[arg(long)]
    pub explain: bool,
}

/// Exactly one operation to check.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct OperationArgs {
    /// Shell command.
    #[arg(long)]
    pub command: Option<String>,
    /// File to read.
    #[arg(long)]
    pub read: Option<String>,
    /// File to write.
    #[arg(long)]
    pub write: Option<String>,
    /// File to delete.
    #[arg(long)]
    pub delete: Option<String>,
    /// git command line, e.g. "git push origin main".
    #[arg(long)]
    pub git: Option<String>,
}

impl OperationArgs {
    pub fn to_operation(&self) -> Option<Operation> {
        if let Some(c) = &self.command {
            Some(Operation::command(c.as_str()))
        } else if let Some(p) = &self.read {
            Some(Operation::file_read(p.as_str()))
        } else if let Some(p) = &self.write {
            Some(Operation::file_write(p.as_str()))
        } else if let Some(p) = &self.delete {
            Some(Operation::file_delete(p.as_str()))
        } else {
            self.git.as_deref().map(Operation::git)
        }
    }
}

pub fn execute(args: &CheckArgs, config: &WardenConfig) -> anyhow::Result<()> {
    let Some(operation) = args.target.to_operation() else {
        anyhow::bail!("no operation given");
    };
    let manager = open_manager(config)?;

    if args.explain {
        let trace = manager.validator().validate_with_trace(&operation);
        for step in &trace.steps {
            println!(
                "  {:<28} {}{}",
                step.check,
                step.outcome,
                if step.terminal { "  (terminal)" } else { "" }
            );
        }
    }

    let decision = manager.validate_operation(&args.agent, &operation)?;
    println!("{}", format_decision(&operation, &decision));

    if !decision.is_allowed() {
        anyhow::bail!("operation denied");
    }
    Ok(())
}
