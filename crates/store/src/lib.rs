pub mod errors;
pub mod membership;
pub mod repository;

pub use errors::StoreError;
pub use membership::{Account, InMemoryMembership, MembershipStore};
pub use repository::{Entity, Filter, InMemoryRepository, Repository};
