//! Caller scopes and permission levels

use fleet_core::Namespace;
use serde::{Deserialize, Serialize};

/// Action a request needs to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Observe state
    Read,
    /// Change state
    Write,
}

/// Permission level granted to a caller (ordered from least to most permissive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// No permissions
    None,
    /// Read-only access
    Read,
    /// Read and write access
    ReadWrite,
}

impl PermissionLevel {
    /// Check if this level grants a permission
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => *self >= PermissionLevel::Read,
            Permission::Write => *self >= PermissionLevel::ReadWrite,
        }
    }
}

/// Tenant namespace plus permission level a caller authenticated with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedScope {
    /// Tenant the caller acts for
    pub namespace: Namespace,
    /// What the caller may do there
    pub level: PermissionLevel,
}

impl AuthorizedScope {
    /// Create a scope
    pub fn new(namespace: Namespace, level: PermissionLevel) -> Self {
        Self { namespace, level }
    }

    /// Read-only scope for a namespace
    pub fn read_only(namespace: Namespace) -> Self {
        Self::new(namespace, PermissionLevel::Read)
    }

    /// Read-write scope for a namespace
    pub fn read_write(namespace: Namespace) -> Self {
        Self::new(namespace, PermissionLevel::ReadWrite)
    }

    /// Check if this scope grants a permission
    pub fn allows(&self, permission: Permission) -> bool {
        self.level.allows(permission)
    }
}

/// Access decision result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    /// Access is allowed
    Allow,
    /// Access is denied with reason
    Deny(String),
}

impl AccessDecision {
    /// Decide whether `scope` may perform `permission` on something owned by `owner`
    pub fn evaluate(scope: &AuthorizedScope, owner: &Namespace, permission: Permission) -> Self {
        if &scope.namespace != owner {
            return Self::Deny(format!(
                "scope namespace {} does not own the target",
                scope.namespace
            ));
        }
        if !scope.allows(permission) {
            return Self::Deny(format!("{permission:?} permission required"));
        }
        Self::Allow
    }

    /// Check if access is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Get denial reason if denied
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    #[test]
    fn test_permission_level_ordering() {
        assert!(PermissionLevel::ReadWrite > PermissionLevel::Read);
        assert!(PermissionLevel::Read > PermissionLevel::None);

        assert!(PermissionLevel::ReadWrite.allows(Permission::Read));
        assert!(PermissionLevel::ReadWrite.allows(Permission::Write));
        assert!(PermissionLevel::Read.allows(Permission::Read));
        assert!(!PermissionLevel::Read.allows(Permission::Write));
        assert!(!PermissionLevel::None.allows(Permission::Read));
    }

    #[test]
    fn test_decision_requires_matching_namespace() {
        let scope = AuthorizedScope::read_write(ns("n1"));
        assert!(AccessDecision::evaluate(&scope, &ns("n1"), Permission::Write).is_allowed());

        let denied = AccessDecision::evaluate(&scope, &ns("n2"), Permission::Read);
        assert!(!denied.is_allowed());
        assert!(denied.denial_reason().unwrap().contains("n1"));
    }

    #[test]
    fn test_decision_requires_permission() {
        let scope = AuthorizedScope::read_only(ns("n1"));
        assert!(AccessDecision::evaluate(&scope, &ns("n1"), Permission::Read).is_allowed());
        assert!(!AccessDecision::evaluate(&scope, &ns("n1"), Permission::Write).is_allowed());
    }
}
