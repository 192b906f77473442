//! Auth data models.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Deserialize;

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
    Moderator,
    /// Roles issued by the auth service that no endpoint here accepts.
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => Self::User,
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::Other(role),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Access token claims minted by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
}
