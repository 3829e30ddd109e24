//! Item definitions, per-instance data and item instances

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use satchel_core::ItemId;
use serde::{Deserialize, Serialize};

use crate::hooks::{ItemBehavior, NoBehavior};

/// Instance property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstanceValue {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Text value
    Text(String),
}

impl InstanceValue {
    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-instance item payload (durability, enchantments, rolled stats)
///
/// Instances carrying data only stack with instances carrying equal data.
/// `kind` names the data family; instances of different kinds are
/// incomparable and rank equal, same-kind instances rank by `quality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceData {
    /// Data family this payload belongs to
    pub kind: String,
    /// Ranking scalar used by best-item queries
    pub quality: i32,
    /// Free-form extra properties
    pub properties: BTreeMap<String, InstanceValue>,
}

impl InstanceData {
    /// Create new instance data
    pub fn new(kind: impl Into<String>, quality: i32) -> Self {
        Self {
            kind: kind.into(),
            quality,
            properties: BTreeMap::new(),
        }
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: InstanceValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&InstanceValue> {
        self.properties.get(key)
    }

    /// Rank against another payload
    pub fn rank_against(&self, other: &InstanceData) -> Ordering {
        if self.kind != other.kind {
            return Ordering::Equal;
        }
        self.quality.cmp(&other.quality)
    }
}

fn default_behavior() -> Arc<dyn ItemBehavior> {
    Arc::new(NoBehavior)
}

fn default_max_stack() -> u32 {
    1
}

/// Static metadata for an item type
///
/// Definitions are immutable once published and shared by reference; the
/// catalog owns them, item instances point back at them.
#[derive(Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Unique identifier
    #[serde(with = "id_serde")]
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Maximum stack size (1 = not stackable)
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    /// Whether the item can be bound into an equipment slot
    #[serde(default)]
    pub equippable: bool,
    /// Whether the item can be used
    #[serde(default)]
    pub usable: bool,
    /// Tags for filtering and equipment slot matching
    #[serde(default)]
    pub tags: Vec<String>,
    /// Behavior strategy consulted by policy and event hooks
    #[serde(skip, default = "default_behavior")]
    pub behavior: Arc<dyn ItemBehavior>,
}

impl ItemDefinition {
    /// Create a new item definition
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            max_stack: 1,
            equippable: false,
            usable: false,
            tags: Vec::new(),
            behavior: default_behavior(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set max stack size
    pub fn with_max_stack(mut self, max: u32) -> Self {
        self.max_stack = max.max(1);
        self
    }

    /// Set equippable
    pub fn with_equippable(mut self, equippable: bool) -> Self {
        self.equippable = equippable;
        self
    }

    /// Set usable
    pub fn with_usable(mut self, usable: bool) -> Self {
        self.usable = usable;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach a behavior strategy
    pub fn with_behavior(mut self, behavior: Arc<dyn ItemBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Check if the definition carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }
}

impl PartialEq for ItemDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ItemDefinition {}

impl fmt::Debug for ItemDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("max_stack", &self.max_stack)
            .field("equippable", &self.equippable)
            .field("usable", &self.usable)
            .field("tags", &self.tags)
            .finish()
    }
}

/// A concrete stackable unit: a definition plus optional instance data
#[derive(Clone)]
pub struct ItemInstance {
    /// Shared definition
    pub definition: Arc<ItemDefinition>,
    /// Per-instance payload, if any
    pub data: Option<InstanceData>,
}

impl ItemInstance {
    /// Create an instance without per-instance data
    pub fn new(definition: Arc<ItemDefinition>) -> Self {
        Self {
            definition,
            data: None,
        }
    }

    /// Attach instance data
    pub fn with_data(mut self, data: InstanceData) -> Self {
        self.data = Some(data);
        self
    }

    /// The definition's identifier
    #[inline]
    pub fn id(&self) -> &ItemId {
        &self.definition.id
    }

    /// The definition's stack capacity
    #[inline]
    pub fn max_stack(&self) -> u32 {
        self.definition.max_stack
    }

    /// Whether two instances may occupy the same slot
    ///
    /// Same definition id and equal instance data (or both absent).
    pub fn stack_compatible(&self, other: &ItemInstance) -> bool {
        (Arc::ptr_eq(&self.definition, &other.definition)
            || self.definition.id == other.definition.id)
            && self.data == other.data
    }

    /// Rank against another instance for best-item queries
    ///
    /// Absent data ranks below present data; both absent rank equal.
    pub fn rank(&self, other: &ItemInstance) -> Ordering {
        match (&self.data, &other.data) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.rank_against(b),
        }
    }
}

impl PartialEq for ItemInstance {
    fn eq(&self, other: &Self) -> bool {
        self.stack_compatible(other)
    }
}

impl fmt::Debug for ItemInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemInstance")
            .field("id", &self.definition.id)
            .field("data", &self.data)
            .finish()
    }
}

mod id_serde {
    use satchel_core::ItemId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ItemId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(id.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ItemId, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ItemId::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_definition() {
        let item = ItemDefinition::new("health_potion", "Health Potion")
            .with_max_stack(10)
            .with_usable(true)
            .with_tag("consumable");

        assert_eq!(item.id.name(), "health_potion");
        assert!(item.is_stackable());
        assert!(item.usable);
        assert!(item.has_tag("consumable"));
        assert!(!item.has_tag("weapon"));
    }

    #[test]
    fn test_stack_compatibility() {
        let def = Arc::new(ItemDefinition::new("arrow", "Arrow").with_max_stack(50));
        let plain_a = ItemInstance::new(def.clone());
        let plain_b = ItemInstance::new(def.clone());
        let poisoned = ItemInstance::new(def).with_data(InstanceData::new("poison", 3));

        assert!(plain_a.stack_compatible(&plain_b));
        assert!(!plain_a.stack_compatible(&poisoned));

        let other_def = Arc::new(ItemDefinition::new("bolt", "Bolt").with_max_stack(50));
        let bolt = ItemInstance::new(other_def);
        assert!(!plain_a.stack_compatible(&bolt));
    }

    #[test]
    fn test_ranking() {
        let def = Arc::new(ItemDefinition::new("sword", "Sword"));
        let plain = ItemInstance::new(def.clone());
        let fine = ItemInstance::new(def.clone()).with_data(InstanceData::new("forge", 2));
        let masterwork = ItemInstance::new(def.clone()).with_data(InstanceData::new("forge", 7));

        // Data outranks no data, quality decides within a kind
        assert_eq!(plain.rank(&fine), Ordering::Less);
        assert_eq!(masterwork.rank(&fine), Ordering::Greater);
        assert_eq!(fine.rank(&fine), Ordering::Equal);

        // Different data kinds are incomparable and rank equal
        let blessed = ItemInstance::new(def).with_data(InstanceData::new("temple", 1));
        assert_eq!(masterwork.rank(&blessed), Ordering::Equal);
    }

    #[test]
    fn test_instance_properties() {
        let data = InstanceData::new("forge", 4)
            .with_property("durability", InstanceValue::Int(80))
            .with_property("engraved", InstanceValue::Bool(true));

        assert_eq!(data.property("durability").and_then(|v| v.as_int()), Some(80));
        assert_eq!(data.property("engraved").and_then(|v| v.as_bool()), Some(true));
        assert!(data.property("missing").is_none());
    }
}
