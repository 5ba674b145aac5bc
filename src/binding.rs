//! Code-registered table bindings for the typed create/update helpers.

use std::collections::HashMap;

/// Where a typed entity writes, declared at registration time rather than
/// discovered from the value itself.
#[derive(Clone, Debug)]
pub struct TableBinding {
    pub table_name: String,
    pub id_field: String,
    /// Whether create reports the database-generated key back.
    pub echo_id: bool,
}

impl TableBinding {
    pub fn new(table_name: &str) -> Self {
        TableBinding {
            table_name: table_name.to_string(),
            id_field: "id".to_string(),
            echo_id: true,
        }
    }

    pub fn id_field(mut self, field: &str) -> Self {
        self.id_field = field.to_string();
        self
    }

    pub fn echo_id(mut self, echo: bool) -> Self {
        self.echo_id = echo;
        self
    }
}

/// Bindings by name. Config rows refer to these through their `clz_name`
/// column; the typed facade helpers address them directly.
#[derive(Clone, Debug, Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, TableBinding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &str, binding: TableBinding) -> Self {
        self.bindings.insert(name.to_string(), binding);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TableBinding> {
        self.bindings.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_resolve_by_name() {
        let registry = BindingRegistry::new()
            .register("Article", TableBinding::new("article").id_field("article_id"))
            .register("Tag", TableBinding::new("tag").echo_id(false));

        let article = registry.get("Article").unwrap();
        assert_eq!(article.table_name, "article");
        assert_eq!(article.id_field, "article_id");
        assert!(article.echo_id);

        assert!(!registry.get("Tag").unwrap().echo_id);
        assert!(registry.get("missing").is_none());
    }
}
