//! Resolved namespace model: rows validated and linked into a two-level
//! tree for runtime lookup.

use crate::config::types::{kind_token, DescriptorOverrides, NamespaceRow, TOP_LEVEL_PID};
use crate::error::ConfigError;
use crate::ident::IdStrategy;
use std::collections::HashMap;

/// Which statement path a namespace takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespaceKind {
    /// One configured statement, rendered per operation.
    Single,
    /// Statements derived from the table name and policy predicates.
    Crud,
}

/// Column names one entity uses for the framework-managed fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub id_field: String,
    pub name_field: String,
    pub creator_id_field: String,
    pub updater_id_field: String,
    pub create_date_field: String,
    pub update_date_field: String,
    pub uid_field: String,
    pub state_field: String,
    pub has_is_deleted: bool,
    pub del_field: String,
    pub user_id_field: String,
    pub tenant_id_field: String,
}

impl Default for EntityDescriptor {
    fn default() -> Self {
        EntityDescriptor {
            id_field: "id".into(),
            name_field: "name".into(),
            creator_id_field: "creator_id".into(),
            updater_id_field: "updater_id".into(),
            create_date_field: "create_date".into(),
            update_date_field: "update_date".into(),
            uid_field: "uid".into(),
            state_field: "stat".into(),
            has_is_deleted: true,
            del_field: "is_deleted".into(),
            user_id_field: "user_id".into(),
            tenant_id_field: "tenant_id".into(),
        }
    }
}

impl EntityDescriptor {
    /// Apply stored overrides onto the defaults. A row without any
    /// overrides gets the defaults with the soft-delete marker off.
    fn resolve(overrides: Option<&DescriptorOverrides>) -> Self {
        let mut d = EntityDescriptor::default();
        let o = match overrides {
            Some(o) => o,
            None => {
                d.has_is_deleted = false;
                return d;
            }
        };
        if let Some(v) = &o.id_field {
            d.id_field = v.clone();
        }
        if let Some(v) = &o.name_field {
            d.name_field = v.clone();
        }
        if let Some(v) = &o.creator_id_field {
            d.creator_id_field = v.clone();
        }
        if let Some(v) = &o.updater_id_field {
            d.updater_id_field = v.clone();
        }
        if let Some(v) = &o.create_date_field {
            d.create_date_field = v.clone();
        }
        if let Some(v) = &o.update_date_field {
            d.update_date_field = v.clone();
        }
        if let Some(v) = &o.uid_field {
            d.uid_field = v.clone();
        }
        if let Some(v) = &o.state_field {
            d.state_field = v.clone();
        }
        if let Some(v) = o.has_is_deleted {
            d.has_is_deleted = v;
        }
        if let Some(v) = &o.del_field {
            d.del_field = v.clone();
        }
        if let Some(v) = &o.user_id_field {
            d.user_id_field = v.clone();
        }
        if let Some(v) = &o.tenant_id_field {
            d.tenant_id_field = v.clone();
        }
        d
    }
}

/// One namespace, fully resolved for runtime use.
#[derive(Clone, Debug)]
pub struct NamespaceConfig {
    pub id: i64,
    pub namespace: String,
    /// Human description from the config row.
    pub name: Option<String>,
    pub kind: NamespaceKind,
    pub table_name: Option<String>,
    pub list_order_by_date: bool,
    /// Key into the typed-entity binding registry, when one applies.
    pub binding_name: Option<String>,
    pub sql: Option<String>,
    pub info_sql: Option<String>,
    pub list_sql: Option<String>,
    pub create_sql: Option<String>,
    pub update_sql: Option<String>,
    pub delete_sql: Option<String>,
    pub tenant_isolation: bool,
    pub current_user_only: bool,
    pub id_strategy: IdStrategy,
    pub descriptor: EntityDescriptor,
}

impl NamespaceConfig {
    fn resolve(row: NamespaceRow) -> Self {
        let descriptor = EntityDescriptor::resolve(row.table_model.as_ref());
        let kind = match row.kind.as_deref() {
            Some(kind_token::SINGLE) => NamespaceKind::Single,
            _ => NamespaceKind::Crud,
        };
        let id_strategy = row
            .id_type
            .or(row.table_model.as_ref().and_then(|m| m.id_type))
            .and_then(IdStrategy::from_code)
            .unwrap_or_default();
        NamespaceConfig {
            id: row.id,
            namespace: row.namespace,
            name: row.name,
            kind,
            table_name: row.table_name,
            list_order_by_date: row.list_order_by_date.unwrap_or(true),
            binding_name: row.clz_name,
            sql: row.sql,
            info_sql: row.info_sql,
            list_sql: row.list_sql,
            create_sql: row.create_sql,
            update_sql: row.update_sql,
            delete_sql: row.delete_sql,
            tenant_isolation: row.tenant_isolation.unwrap_or(false),
            current_user_only: row.current_user_only.unwrap_or(false),
            id_strategy,
            descriptor,
        }
    }
}

#[derive(Debug)]
struct Node {
    config: NamespaceConfig,
    children: HashMap<String, usize>,
}

/// All loaded namespaces, addressable by name and sub-name. Built fresh on
/// every reload and swapped in whole, so lookups never observe a half-built
/// tree.
#[derive(Debug)]
pub struct NamespaceRegistry {
    nodes: Vec<Node>,
    roots: HashMap<String, usize>,
}

impl NamespaceRegistry {
    /// Link loaded rows into the tree. First pass registers top-level rows,
    /// second pass attaches children by parent row id.
    pub fn from_rows(rows: Vec<NamespaceRow>) -> Result<Self, ConfigError> {
        let mut nodes: Vec<Node> = Vec::with_capacity(rows.len());
        let mut roots: HashMap<String, usize> = HashMap::new();
        let mut by_row_id: HashMap<i64, usize> = HashMap::new();

        let (tops, subs): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(|r| r.pid == TOP_LEVEL_PID);

        for row in tops {
            let row_id = row.id;
            let config = NamespaceConfig::resolve(row);
            if roots.contains_key(&config.namespace) {
                return Err(ConfigError::DuplicateNamespace(config.namespace));
            }
            let idx = nodes.len();
            roots.insert(config.namespace.clone(), idx);
            by_row_id.insert(row_id, idx);
            nodes.push(Node {
                config,
                children: HashMap::new(),
            });
        }

        for row in subs {
            let parent_id = row.pid;
            let config = NamespaceConfig::resolve(row);
            let parent = *by_row_id.get(&parent_id).ok_or_else(|| {
                ConfigError::OrphanedNamespace {
                    namespace: config.namespace.clone(),
                    parent_id,
                }
            })?;
            if nodes[parent].children.contains_key(&config.namespace) {
                return Err(ConfigError::DuplicateNamespace(config.namespace));
            }
            let idx = nodes.len();
            nodes[parent].children.insert(config.namespace.clone(), idx);
            nodes.push(Node {
                config,
                children: HashMap::new(),
            });
        }

        Ok(NamespaceRegistry { nodes, roots })
    }

    /// Empty registry, the state before the first successful load.
    pub fn unloaded() -> Self {
        NamespaceRegistry {
            nodes: Vec::new(),
            roots: HashMap::new(),
        }
    }

    /// Look up a namespace, descending one level when `sub` is given.
    pub fn resolve(
        &self,
        namespace: &str,
        sub: Option<&str>,
    ) -> Result<&NamespaceConfig, ConfigError> {
        let idx = *self
            .roots
            .get(namespace)
            .ok_or_else(|| ConfigError::UnknownNamespace(namespace.to_string()))?;
        let idx = match sub {
            None => idx,
            Some(sub) => *self.nodes[idx]
                .children
                .get(sub)
                .ok_or_else(|| ConfigError::UnknownNamespace(sub.to_string()))?,
        };
        Ok(&self.nodes[idx].config)
    }

    /// Top-level namespace names, for the admin listing.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, pid: i64, namespace: &str) -> NamespaceRow {
        NamespaceRow {
            id,
            pid,
            namespace: namespace.to_string(),
            table_name: Some(namespace.to_string()),
            ..NamespaceRow::default()
        }
    }

    #[test]
    fn two_levels_resolve_by_name() {
        let mut child = row(2, 1, "comment");
        child.kind = Some("SINGLE".into());
        let reg =
            NamespaceRegistry::from_rows(vec![row(1, -1, "news"), child, row(3, -1, "user")])
                .unwrap();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.resolve("news", None).unwrap().kind, NamespaceKind::Crud);
        assert_eq!(
            reg.resolve("news", Some("comment")).unwrap().kind,
            NamespaceKind::Single
        );
    }

    #[test]
    fn unknown_names_are_reported_as_such() {
        let reg = NamespaceRegistry::from_rows(vec![row(1, -1, "news")]).unwrap();
        assert!(matches!(
            reg.resolve("missing", None),
            Err(ConfigError::UnknownNamespace(ref n)) if n == "missing"
        ));
        assert!(matches!(
            reg.resolve("news", Some("missing")),
            Err(ConfigError::UnknownNamespace(ref n)) if n == "missing"
        ));
    }

    #[test]
    fn a_child_without_its_parent_fails_the_build() {
        let err = NamespaceRegistry::from_rows(vec![row(1, -1, "news"), row(2, 9, "comment")])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OrphanedNamespace { parent_id: 9, .. }
        ));
    }

    #[test]
    fn duplicate_names_fail_the_build() {
        let err =
            NamespaceRegistry::from_rows(vec![row(1, -1, "news"), row(2, -1, "news")]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateNamespace(_)));
    }

    #[test]
    fn a_row_without_overrides_has_soft_delete_off() {
        let reg = NamespaceRegistry::from_rows(vec![row(1, -1, "news")]).unwrap();
        let cfg = reg.resolve("news", None).unwrap();
        assert!(!cfg.descriptor.has_is_deleted);
        assert_eq!(cfg.descriptor.id_field, "id");
    }

    #[test]
    fn overrides_keep_the_soft_delete_default_on() {
        let mut r = row(1, -1, "news");
        r.table_model = Some(DescriptorOverrides {
            del_field: Some("del".into()),
            ..DescriptorOverrides::default()
        });
        let reg = NamespaceRegistry::from_rows(vec![r]).unwrap();
        let cfg = reg.resolve("news", None).unwrap();
        assert!(cfg.descriptor.has_is_deleted);
        assert_eq!(cfg.descriptor.del_field, "del");
    }

    #[test]
    fn id_strategy_prefers_the_row_code() {
        let mut r = row(1, -1, "news");
        r.id_type = Some(2);
        r.table_model = Some(DescriptorOverrides {
            id_type: Some(3),
            ..DescriptorOverrides::default()
        });
        let reg = NamespaceRegistry::from_rows(vec![r]).unwrap();
        assert_eq!(
            reg.resolve("news", None).unwrap().id_strategy,
            IdStrategy::Distributed
        );

        let mut r = row(1, -1, "item");
        r.id_type = Some(99);
        let reg = NamespaceRegistry::from_rows(vec![r]).unwrap();
        assert_eq!(
            reg.resolve("item", None).unwrap().id_strategy,
            IdStrategy::AutoIncrement
        );
    }
}
