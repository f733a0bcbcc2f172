//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, UserId, UserRole};

/// A storefront account.
///
/// The password hash never leaves the repository layer, so this type is safe
/// to serialize into profile views.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email (unique).
    pub email: Email,
    /// Given name, filled in at checkout or in the profile.
    pub name: Option<String>,
    /// Family name.
    pub surname: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Permission level.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Optional contact fields applied with overwrite-if-present semantics.
///
/// A field that is `None` or blank keeps the stored value; anything else
/// replaces it (trimmed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactBackfill {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
}

impl ContactBackfill {
    /// Build from raw form values, dropping blanks.
    #[must_use]
    pub fn new(name: Option<&str>, surname: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            name: present(name),
            surname: present(surname),
            phone: present(phone),
        }
    }

    /// Whether applying this would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.surname.is_none() && self.phone.is_none()
    }

    /// Apply to an in-memory user.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = Some(name.clone());
        }
        if let Some(surname) = &self.surname {
            user.surname = Some(surname.clone());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
