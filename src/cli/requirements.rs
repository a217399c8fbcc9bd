use anyhow::Result;
use serde::Serialize;
use tracker_authz::PolicyRegistry;

use super::output::OutputFormat;

#[derive(Serialize)]
struct RequirementRow {
    name: &'static str,
    kind: String,
    operation: String,
}

pub fn cmd_requirements(output: OutputFormat) -> Result<()> {
    let rows: Vec<RequirementRow> = PolicyRegistry::global()
        .requirements()
        .map(|req| RequirementRow {
            name: req.name(),
            kind: req.kind().to_string(),
            operation: req.operation().to_string(),
        })
        .collect();

    output.emit(&rows, || {
        println!("{:<16} {:<8} {}", "REQUIREMENT", "KIND", "OPERATION");
        for row in &rows {
            println!("{:<16} {:<8} {}", row.name, row.kind, row.operation);
        }
    })
}
