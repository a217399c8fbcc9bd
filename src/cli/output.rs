use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `payload` as JSON/YAML, or run `human` for the text rendering.
    pub fn emit<T, F>(&self, payload: &T, human: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(),
    {
        match self {
            OutputFormat::Human => human(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(payload)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(payload)?),
        }
        Ok(())
    }
}
