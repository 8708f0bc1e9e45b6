//! Domain layer types and invariants.

pub mod access;
pub mod caller;
pub mod error;
pub mod roles;
pub mod todos;
pub mod users;
