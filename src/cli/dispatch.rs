use super::check::cmd_check;
use super::demo::cmd_demo;
use super::env::CliArgs;
use super::policy::cmd_policy;
use super::requirements::cmd_requirements;
use super::wiring::cmd_wiring;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Requirements => cmd_requirements(cli.output),
        Commands::Wiring(args) => cmd_wiring(args, ctx, cli.output),
        Commands::Check(args) => cmd_check(args, ctx, cli.output),
        Commands::Policy(args) => cmd_policy(args, ctx, cli.output),
        Commands::Demo(args) => cmd_demo(args, ctx, cli.output).await,
    }
}
