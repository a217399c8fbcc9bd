//! Tracker library
//!
//! Resource authorization for projects, tickets and comments, plus the
//! controllers and CLI built on top of it.

pub mod accounts;
pub mod app_context;
pub mod audit;
pub mod cli;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod session;

// Re-export commonly used types for external use
pub use app_context::{create_context, AppContext};
pub use audit::AuditTrail;
pub use config::Config;
pub use errors::{TrackerError, TrackerResult};
pub use session::{Session, SessionPrincipalProvider};
