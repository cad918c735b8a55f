use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of roles a user can hold.
///
/// Variants are declared alphabetically so the derived ordering matches the
/// order roles are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Guest,
    Moderator,
    User,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Guest, Role::Moderator, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Guest => "Guest",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not one of [`Role::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Sort and de-duplicate a role list; an empty list becomes `[Guest]`.
pub fn normalize_roles(mut roles: Vec<Role>) -> Vec<Role> {
    roles.sort();
    roles.dedup();
    if roles.is_empty() {
        roles.push(Role::Guest);
    }
    roles
}

/// User entity - represents an account in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, inactive user with generated ID and timestamps.
    pub fn new(email: String, full_name: String, password_hash: String, roles: Vec<Role>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            full_name,
            password_hash,
            roles: normalize_roles(roles),
            is_active: false,
            is_disabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    /// Append `role` if missing. Returns `true` when the set changed.
    pub fn add_role(&mut self, role: Role) -> bool {
        if self.has_role(role) {
            return false;
        }
        self.roles.push(role);
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_guest() {
        let user = User::new("a@x.com".into(), "A".into(), "hash".into(), vec![]);
        assert_eq!(user.roles, vec![Role::Guest]);
        assert!(!user.is_active);
        assert!(!user.is_disabled);
    }

    #[test]
    fn test_roles_are_sorted_and_deduplicated() {
        let roles = normalize_roles(vec![Role::User, Role::Admin, Role::User]);
        assert_eq!(roles, vec![Role::Admin, Role::User]);
    }

    #[test]
    fn test_add_role_keeps_insertion_order() {
        let mut user = User::new("a@x.com".into(), "A".into(), "hash".into(), vec![Role::User]);
        assert!(user.add_role(Role::Admin));
        assert!(!user.add_role(Role::User));
        assert_eq!(user.roles, vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("moderator".parse::<Role>().unwrap(), Role::Moderator);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_as_name() {
        let json = serde_json::to_string(&vec![Role::Admin, Role::Guest]).unwrap();
        assert_eq!(json, r#"["Admin","Guest"]"#);
    }
}
