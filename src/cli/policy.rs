use anyhow::{bail, Result};
use clap::Args;
use serde_json::json;

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct PolicyArgs {
    /// Only show the provenance of this dot-path, e.g. audit.enabled
    #[arg(long)]
    pub key: Option<String>,
}

pub fn cmd_policy(args: PolicyArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let snapshot = ctx.policy()?;

    if let Some(key) = args.key.as_deref() {
        let Some(entry) = snapshot.provenance.get(key) else {
            bail!("unknown policy key '{key}'");
        };
        let payload = json!({ "path": entry.path, "source": entry.source });
        return output.emit(&payload, || {
            println!("{} ← {:?}", entry.path, entry.source);
        });
    }

    output.emit(&snapshot, || {
        println!("Config: {}", ctx.config_path().display());
        println!("Policy Revision: {}", snapshot.rev);
        println!();
        println!(
            "Comments → write_requirement={}",
            snapshot.comments.write_requirement
        );
        println!(
            "Audit → enabled={}, channel_capacity={}",
            snapshot.audit.enabled, snapshot.audit.channel_capacity
        );
        println!();
        println!("Provenance:");
        for (path, entry) in &snapshot.provenance {
            println!("  {:<28} {:?}", path, entry.source);
        }
    })
}
