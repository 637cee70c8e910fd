//! Authorization module - roles, route permission table and access decisions
//!
//! Browser pages are authorized centrally by the session gate using the
//! static [`PermissionTable`]. JSON API handlers authorize themselves through
//! the [`Principal`] carried by the shared bearer-token extractor.

mod evaluator;
mod principal;
mod table;

pub use evaluator::{is_allowed, API_PREFIX};
pub use principal::Principal;
pub use table::PermissionTable;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of account roles. The upper-case names are what travels in
/// tokens, query strings and the permission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Top-level operator, not bound to an organization
    SuperAdmin,
    /// Organization administrator
    Admin,
    Staff,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Staff, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
