use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracker_authz::{load_wiring_from_path, HandlerSet};

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct WiringArgs {
    /// Validate and show this wiring file instead of the configured one
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Serialize)]
struct WiringRow {
    kind: String,
    handlers: Vec<&'static str>,
}

pub fn cmd_wiring(args: WiringArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let (handlers, source) = match &args.file {
        Some(path) => {
            let wiring = load_wiring_from_path(path)
                .with_context(|| format!("reading wiring file {}", path.display()))?;
            (HandlerSet::from_wiring(&wiring)?, path.display().to_string())
        }
        None => {
            let source = ctx
                .config()
                .wiring_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            (ctx.handler_set()?, source)
        }
    };

    let rows: Vec<WiringRow> = handlers
        .describe()
        .into_iter()
        .map(|(kind, handlers)| WiringRow {
            kind: kind.to_string(),
            handlers,
        })
        .collect();

    output.emit(&rows, || {
        println!("Handler wiring ({source})");
        for row in &rows {
            let handlers = if row.handlers.is_empty() {
                "(none: always denied)".to_string()
            } else {
                row.handlers.join(", ")
            };
            println!("  {:<8} {}", row.kind, handlers);
        }
    })
}
