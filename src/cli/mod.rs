pub mod app;
pub mod check;
pub mod commands;
pub mod context;
pub mod demo;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod policy;
pub mod requirements;
pub mod runtime;
pub mod wiring;

pub use app::run;
pub use env::CliArgs;
pub use output::OutputFormat;
