//! Application services: repository ports and the access-controlled task service.

pub mod error;
pub mod repos;
pub mod todos;
