//! Tracker command line entry point.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracker_cli::cli::run().await
}
