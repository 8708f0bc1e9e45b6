//! Per-user task list backend with role-aware access control and a
//! cache-aside read path.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
