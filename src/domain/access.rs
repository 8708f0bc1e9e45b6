//! Record-level authorization.
//!
//! The decision is a pure function of the caller's roles, the caller's resolved
//! identity and the record owner. Nothing here touches storage.

use super::roles::RoleSet;
use super::users::UserId;

/// The party a decision is made for, after identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Bypasses ownership checks. No user lookup is needed.
    Admin,
    User(UserId),
}

impl Principal {
    /// The resolved identity, absent for admins.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Admin => None,
            Self::User(id) => Some(id),
        }
    }
}

/// Returns whether a caller holding `roles`, resolved to `caller` (when not an
/// admin), may read or mutate a record owned by `owner`.
pub fn authorize(roles: RoleSet, caller: Option<&UserId>, owner: &UserId) -> bool {
    if roles.is_admin() {
        return true;
    }
    caller.is_some_and(|id| id == owner)
}
