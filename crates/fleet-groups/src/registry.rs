//! Group registry: create, fetch, list and rename group records

use crate::expression::Expression;
use fleet_core::{
    FleetError, Group, GroupId, GroupName, GroupStore, GroupType, Namespace, PagePolicy,
    PageRequest, Paginated, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Request body for group creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    /// Name, unique within the namespace
    pub name: GroupName,
    /// Static or dynamic
    pub group_type: GroupType,
    /// Membership expression; required for dynamic groups, absent for static ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl GroupDefinition {
    /// Static group definition
    pub fn static_group(name: GroupName) -> Self {
        Self {
            name,
            group_type: GroupType::Static,
            expression: None,
        }
    }

    /// Dynamic group definition
    pub fn dynamic_group(name: GroupName, expression: impl Into<String>) -> Self {
        Self {
            name,
            group_type: GroupType::Dynamic,
            expression: Some(expression.into()),
        }
    }
}

/// CRUD over group records, scoped to namespaces
#[derive(Clone)]
pub struct GroupRegistry {
    store: Arc<dyn GroupStore>,
    page_policy: PagePolicy,
}

impl GroupRegistry {
    /// Create a registry over a group store
    pub fn new(store: Arc<dyn GroupStore>, page_policy: PagePolicy) -> Self {
        Self { store, page_policy }
    }

    /// Parse an expression without persisting anything
    pub fn validate_expression(&self, text: &str) -> Result<Expression> {
        Ok(Expression::parse(text)?)
    }

    /// Register a new group and return its id.
    ///
    /// Dynamic expressions are stored in canonical form.
    pub async fn create(&self, namespace: Namespace, definition: GroupDefinition) -> Result<GroupId> {
        let GroupDefinition {
            name,
            group_type,
            expression,
        } = definition;

        let group = match (group_type, expression) {
            (GroupType::Static, None) => Group::new_static(namespace, name),
            (GroupType::Static, Some(_)) => {
                return Err(FleetError::malformed_payload(
                    "static groups do not take an expression",
                ))
            }
            (GroupType::Dynamic, None) => {
                return Err(FleetError::invalid_expression(
                    "dynamic groups require an expression",
                ))
            }
            (GroupType::Dynamic, Some(text)) => {
                let parsed = Expression::parse(&text)?;
                Group::new_dynamic(namespace, name, parsed.to_string())
            }
        };

        let id = group.id;
        info!(
            group = %id,
            namespace = %group.namespace,
            name = %group.name,
            group_type = %group.group_type(),
            "creating group"
        );
        self.store.insert_group(group).await?;
        Ok(id)
    }

    /// Fetch a group. Fails with `NotFound` if it does not exist.
    pub async fn get(&self, id: GroupId) -> Result<Group> {
        self.store
            .get_group(id)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("group {id}")))
    }

    /// Groups of a namespace ordered by name
    pub async fn list(&self, namespace: &Namespace, page: PageRequest) -> Result<Paginated<Group>> {
        let page = page.resolve(&self.page_policy);
        debug!(%namespace, offset = page.offset, limit = page.limit, "listing groups");
        self.store.list_groups(namespace, page).await
    }

    /// Change a group's name, leaving everything else untouched
    pub async fn rename(&self, id: GroupId, new_name: GroupName) -> Result<Group> {
        let group = self.store.rename_group(id, new_name).await?;
        info!(group = %id, name = %group.name, "renamed group");
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use fleet_core::GroupKind;
    use fleet_effects::MemoryGroupStore;

    fn registry() -> GroupRegistry {
        GroupRegistry::new(Arc::new(MemoryGroupStore::new()), PagePolicy::default())
    }

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    fn name(value: &str) -> GroupName {
        GroupName::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_dynamic_stores_canonical_expression() {
        let registry = registry();
        let id = registry
            .create(ns("a"), GroupDefinition::dynamic_group(name("g"), "ROLE = sensor"))
            .await
            .unwrap();

        let group = registry.get(id).await.unwrap();
        assert_eq!(
            group.kind,
            GroupKind::Dynamic {
                expression: r#"ROLE == "sensor""#.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_definitions() {
        let registry = registry();

        assert_matches!(
            registry
                .create(ns("a"), GroupDefinition::dynamic_group(name("g"), "role =="))
                .await,
            Err(FleetError::InvalidExpression { .. })
        );

        let mut missing = GroupDefinition::static_group(name("g"));
        missing.group_type = GroupType::Dynamic;
        assert_matches!(
            registry.create(ns("a"), missing).await,
            Err(FleetError::InvalidExpression { .. })
        );

        let mut extra = GroupDefinition::static_group(name("g"));
        extra.expression = Some("a exists".to_string());
        assert_matches!(
            registry.create(ns("a"), extra).await,
            Err(FleetError::MalformedPayload { .. })
        );

        registry
            .create(ns("a"), GroupDefinition::static_group(name("g")))
            .await
            .unwrap();
        assert_matches!(
            registry
                .create(ns("a"), GroupDefinition::static_group(name("g")))
                .await,
            Err(FleetError::DuplicateName { .. })
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_other_fields() {
        let registry = registry();
        let id = registry
            .create(ns("a"), GroupDefinition::dynamic_group(name("old"), "x exists"))
            .await
            .unwrap();
        let before = registry.get(id).await.unwrap();

        let after = registry.rename(id, name("new")).await.unwrap();
        assert_eq!(after.name, name("new"));
        assert_eq!(after.id, before.id);
        assert_eq!(after.namespace, before.namespace);
        assert_eq!(after.kind, before.kind);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_list_uses_default_page() {
        let store = Arc::new(MemoryGroupStore::new());
        let registry = GroupRegistry::new(
            store,
            PagePolicy {
                default_limit: 2,
                max_limit: 3,
            },
        );
        for n in ["a", "b", "c", "d"] {
            registry
                .create(ns("x"), GroupDefinition::static_group(name(n)))
                .await
                .unwrap();
        }

        let page = registry.list(&ns("x"), PageRequest::default()).await.unwrap();
        assert_eq!(page.values.len(), 2);
        assert_eq!(page.total, 4);

        let page = registry.list(&ns("x"), PageRequest::new(0, 100)).await.unwrap();
        assert_eq!(page.values.len(), 3);
    }

    #[test]
    fn test_definition_wire_shape() {
        let def: GroupDefinition = serde_json::from_value(serde_json::json!({
            "name": "sensors",
            "groupType": "dynamic",
            "expression": "role == sensor",
        }))
        .unwrap();
        assert_eq!(def.group_type, GroupType::Dynamic);

        let def: GroupDefinition = serde_json::from_value(serde_json::json!({
            "name": "fixed",
            "groupType": "static",
        }))
        .unwrap();
        assert_eq!(def.expression, None);
    }
}
