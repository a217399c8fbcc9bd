use clap::Subcommand;

use super::check::CheckArgs;
use super::demo::DemoArgs;
use super::policy::PolicyArgs;
use super::wiring::WiringArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// List the twelve authorization requirements
    Requirements,

    /// Show the effective handler wiring
    Wiring(WiringArgs),

    /// Authorize an ad-hoc principal against a resource
    Check(CheckArgs),

    /// Show the effective policy snapshot with provenance
    Policy(PolicyArgs),

    /// Walk through the manager/user/admin project scenario
    Demo(DemoArgs),
}
