//! Cache key definitions.
//!
//! Every key is scoped to the caller's email and to the view it holds, so an
//! admin's full listing and a user's own listing never share an entry.

use std::fmt::{Display, Formatter};

const KEY_PREFIX: &str = "todo-items";

/// Which listing a cached entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheView {
    /// Every record in the store, as seen by an admin.
    All,
    /// Records owned by the caller.
    Owned,
}

impl CacheView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owned => "owned",
        }
    }

    pub fn all() -> &'static [CacheView] {
        &[Self::All, Self::Owned]
    }
}

/// Composite key rendered as `todo-items:{view}:{email}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    view: CacheView,
    email: String,
}

impl CacheKey {
    /// Emails are compared case-insensitively, so the key uses the lowercased form.
    pub fn new(view: CacheView, email: &str) -> Self {
        Self {
            view,
            email: email.trim().to_ascii_lowercase(),
        }
    }

    pub fn all(email: &str) -> Self {
        Self::new(CacheView::All, email)
    }

    pub fn owned(email: &str) -> Self {
        Self::new(CacheView::Owned, email)
    }

    pub fn view(&self) -> CacheView {
        self.view
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{KEY_PREFIX}:{}:{}", self.view.as_str(), self.email)
    }
}
