pub mod config;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod principal;
pub mod registry;
pub mod service;

pub use crate::config::{
    default_wiring, load_wiring_from_path, parse_wiring_str, HandlerSpec, HandlerWiring,
    KindWiring, WiringError,
};
pub use crate::context::EvaluationContext;
pub use crate::errors::AuthzError;
pub use crate::handlers::{
    AdminHandler, AuthorizationHandler, HandlerOutcome, HandlerSet, ManagerOwnerHandler,
    OwnerHandler, PublicReadHandler,
};
pub use crate::principal::{Principal, PrincipalProvider, StaticPrincipal};
pub use crate::registry::{
    requirement_for, PolicyRegistry, Requirement, ADMINISTRATORS_ROLE, MANAGERS_ROLE, NO_ROLE,
    USERS_ROLE,
};
pub use crate::service::{AuthorizationResult, AuthorizationService, AuthzDecisionEvent};
