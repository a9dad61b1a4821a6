use serde::{Deserialize, Serialize};
use std::fmt;

/// Privilege tiers as reported by the backend. The backend owns the set, so
/// unrecognized values are preserved as `Other` and never gain privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    TenantAdmin,
    SuperAdmin,
    #[serde(untagged)]
    Other(String),
}

impl Role {
    /// Coarse ordering for gate checks: member < tenant admin < super admin.
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 2,
            Role::TenantAdmin => 1,
            Role::Member | Role::Other(_) => 0,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::TenantAdmin => write!(f, "tenant_admin"),
            Role::SuperAdmin => write!(f, "super_admin"),
            Role::Other(s) => write!(f, "{}", s),
        }
    }
}

/// The authenticated user's profile record, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"super_admin\"");
        assert_eq!(serde_json::from_str::<Role>("\"tenant_admin\"").unwrap(), Role::TenantAdmin);
        assert_eq!(serde_json::from_str::<Role>("\"member\"").unwrap(), Role::Member);
    }

    #[test]
    fn unknown_role_is_preserved_without_privilege() {
        let r: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(r, Role::Other("auditor".into()));
        assert_eq!(r.rank(), 0);
        assert!(!r.is_super_admin());
        // Round-trips back to the original wire value.
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"auditor\"");
    }

    #[test]
    fn identity_defaults_role_to_member() {
        let id: Identity =
            serde_json::from_str(r#"{"id":3,"name":"Rui","email":"rui@firm.example"}"#).unwrap();
        assert_eq!(id.role, Role::Member);
    }

    #[test]
    fn tier_ordering() {
        assert!(Role::SuperAdmin.rank() > Role::TenantAdmin.rank());
        assert!(Role::TenantAdmin.rank() > Role::Member.rank());
    }
}
