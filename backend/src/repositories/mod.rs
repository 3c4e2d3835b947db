pub mod common;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod session;
pub mod user;

pub use common::*;
pub use error::StoreError;
pub use session::{SessionRepository, SessionRepositoryTrait};
pub use user::{UserDirectory, UserRepository};
