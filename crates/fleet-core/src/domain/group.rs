//! Group records
//!
//! A group is either static (members assigned explicitly) or dynamic
//! (members derived from an attribute expression). The expression lives in the
//! dynamic variant of [`GroupKind`], so a static group with an expression or a
//! dynamic group without one cannot be represented.

use crate::{GroupId, GroupName, Namespace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership semantics of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// Members stored explicitly
    Static,
    /// Members computed from an expression on every read
    Dynamic,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Group type together with the data only dynamic groups carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKind {
    /// Explicit membership
    Static,
    /// Derived membership
    Dynamic {
        /// Canonical text of the membership expression
        expression: String,
    },
}

/// A named collection of devices within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: GroupId,
    /// Owning tenant
    pub namespace: Namespace,
    /// Name, unique within the namespace
    pub name: GroupName,
    /// Static or dynamic, with the expression for the latter
    #[serde(flatten)]
    pub kind: GroupKind,
    /// When the group was registered
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a static group with a fresh id
    pub fn new_static(namespace: Namespace, name: GroupName) -> Self {
        Self {
            id: GroupId::new(),
            namespace,
            name,
            kind: GroupKind::Static,
            created_at: Utc::now(),
        }
    }

    /// Create a dynamic group with a fresh id. `expression` must already be
    /// in canonical form.
    pub fn new_dynamic(namespace: Namespace, name: GroupName, expression: String) -> Self {
        Self {
            id: GroupId::new(),
            namespace,
            name,
            kind: GroupKind::Dynamic { expression },
            created_at: Utc::now(),
        }
    }

    /// Static or dynamic
    pub fn group_type(&self) -> GroupType {
        match self.kind {
            GroupKind::Static => GroupType::Static,
            GroupKind::Dynamic { .. } => GroupType::Dynamic,
        }
    }

    /// Membership expression, present exactly for dynamic groups
    pub fn expression(&self) -> Option<&str> {
        match &self.kind {
            GroupKind::Static => None,
            GroupKind::Dynamic { expression } => Some(expression),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns() -> Namespace {
        Namespace::new("acme").unwrap()
    }

    #[test]
    fn test_type_and_expression_agree() {
        let g = Group::new_static(ns(), GroupName::new("a").unwrap());
        assert_eq!(g.group_type(), GroupType::Static);
        assert_eq!(g.expression(), None);

        let g = Group::new_dynamic(
            ns(),
            GroupName::new("b").unwrap(),
            "role == \"sensor\"".to_string(),
        );
        assert_eq!(g.group_type(), GroupType::Dynamic);
        assert_eq!(g.expression(), Some("role == \"sensor\""));
    }

    #[test]
    fn test_serialized_shape() {
        let g = Group::new_dynamic(ns(), GroupName::new("b").unwrap(), "x exists".to_string());
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "dynamic");
        assert_eq!(json["expression"], "x exists");
        assert_eq!(json["namespace"], "acme");

        let back: Group = serde_json::from_value(json).unwrap();
        assert_eq!(back, g);
    }
}
