//! Item definition registry

use std::sync::Arc;

use satchel_core::ItemId;

use crate::item::{ItemDefinition, ItemInstance};
use crate::persistence::PersistError;

/// All item definitions known to a game, keyed by id
///
/// Definitions are shared immutably; every instance of an item points at the
/// same catalog entry. Duplicate ids keep the first definition seen.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    definitions: Vec<Arc<ItemDefinition>>,
}

impl ItemCatalog {
    pub fn new(definitions: Vec<ItemDefinition>) -> Self {
        let mut definitions: Vec<Arc<ItemDefinition>> =
            definitions.into_iter().map(Arc::new).collect();
        definitions.sort_by(|a, b| a.id.cmp(&b.id));
        definitions.dedup_by(|a, b| a.id == b.id);
        Self { definitions }
    }

    /// Parse a catalog from its JSON array form
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let definitions: Vec<ItemDefinition> =
            serde_json::from_str(json).map_err(|e| PersistError::Serialization(e.to_string()))?;
        Ok(Self::new(definitions))
    }

    /// Look up a definition by id
    pub fn lookup(&self, id: &ItemId) -> Option<Arc<ItemDefinition>> {
        self.definitions
            .binary_search_by(|def| def.id.cmp(id))
            .ok()
            .map(|index| self.definitions[index].clone())
    }

    /// Look up a definition by id name
    pub fn lookup_name(&self, name: &str) -> Option<Arc<ItemDefinition>> {
        self.lookup(&ItemId::new(name))
    }

    /// Build a plain instance of a cataloged item
    pub fn instance(&self, name: &str) -> Option<ItemInstance> {
        self.lookup_name(name).map(ItemInstance::new)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemDefinition>> {
        self.definitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemCatalog {
        ItemCatalog::new(vec![
            ItemDefinition::new("sword", "Sword"),
            ItemDefinition::new("arrow", "Arrow").with_max_stack(20),
            ItemDefinition::new("potion", "Potion").with_usable(true),
        ])
    }

    #[test]
    fn test_lookup_by_id_and_name() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.lookup(&ItemId::new("arrow")).is_some());
        assert!(catalog.lookup_name("sword").is_some());
        assert!(catalog.lookup_name("shield").is_none());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let catalog = ItemCatalog::new(vec![
            ItemDefinition::new("arrow", "Arrow").with_max_stack(20),
            ItemDefinition::new("arrow", "Bundle of Arrows").with_max_stack(99),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup_name("arrow").unwrap().max_stack, 20);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            { "id": "arrow", "name": "Arrow", "max_stack": 20 },
            { "id": "potion", "name": "Potion", "max_stack": 5, "usable": true }
        ]"#;
        let catalog = ItemCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let instance = catalog.instance("potion").unwrap();
        assert!(instance.definition.usable);
        assert_eq!(instance.max_stack(), 5);
    }

    #[test]
    fn test_instance_shares_definition() {
        let catalog = sample();
        let a = catalog.instance("arrow").unwrap();
        let b = catalog.instance("arrow").unwrap();
        assert!(Arc::ptr_eq(&a.definition, &b.definition));
    }
}
