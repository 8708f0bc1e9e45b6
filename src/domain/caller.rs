//! Per-request caller context.

use super::error::DomainError;
use super::roles::RoleSet;

/// Who is asking, as established by the transport from a verified credential.
///
/// Built fresh for each request and never persisted. The role set is trusted
/// as-is; only the email is checked for presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    email: String,
    roles: RoleSet,
}

impl CallerContext {
    pub fn new(email: impl Into<String>, roles: RoleSet) -> Result<Self, DomainError> {
        let email = email.into().trim().to_string();
        if email.is_empty() {
            return Err(DomainError::validation("caller email must not be empty"));
        }
        Ok(Self { email, roles })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}
