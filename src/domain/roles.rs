//! Caller roles carried by verified credentials.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A role granted to a caller by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Reader,
    Writer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "Reader",
            Self::Writer => "Writer",
            Self::Admin => "Admin",
        }
    }

    pub fn all() -> &'static [Role] {
        &[Self::Reader, Self::Writer, Self::Admin]
    }

    fn bit(self) -> u8 {
        match self {
            Self::Reader => 0b001,
            Self::Writer => 0b010,
            Self::Admin => 0b100,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or(())
    }
}

/// The set of roles held by one caller.
///
/// Role names arrive as free-form strings in tokens; parsing them into this set
/// keeps a misspelled role from silently matching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet {
    bits: u8,
}

impl RoleSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn insert(&mut self, role: Role) {
        self.bits |= role.bit();
    }

    pub fn with(mut self, role: Role) -> Self {
        self.insert(role);
        self
    }

    pub fn contains(&self, role: Role) -> bool {
        self.bits & role.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// Minimum grant for the task routes: Reader, or Admin.
    pub fn can_access_todos(&self) -> bool {
        self.contains(Role::Reader) || self.is_admin()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::all().iter().copied().filter(|role| self.contains(*role))
    }

    /// Parse role names, dropping the ones that are not recognised.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| name.as_ref().parse::<Role>().ok())
            .collect()
    }

    /// Comma separated role names, for logs.
    pub fn label(&self) -> String {
        self.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}
