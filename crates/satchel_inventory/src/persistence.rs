//! Saving and loading containers

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ItemCatalog;
use crate::equipment::Equipment;
use crate::inventory::Inventory;
use crate::item::{InstanceData, ItemInstance};

/// Current save record version
const SAVE_VERSION: u32 = 1;

/// On-disk encoding for saved containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveFormat {
    /// Human-readable, for debugging and hand-edited fixtures
    Json,
    /// Compact, for shipping saves
    #[default]
    Binary,
}

/// Errors from saving or loading containers
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("unknown item id: {0}")]
    UnknownItem(String),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("corrupted save data: {0}")]
    Corrupted(String),
}

#[derive(Serialize, Deserialize)]
struct SlotRecord {
    item: Option<String>,
    data: Option<InstanceData>,
    count: u32,
}

#[derive(Serialize, Deserialize)]
struct InventoryRecord {
    version: u32,
    slots: Vec<SlotRecord>,
}

#[derive(Serialize, Deserialize)]
struct EquipSlotRecord {
    tag: String,
    item: Option<String>,
    data: Option<InstanceData>,
}

#[derive(Serialize, Deserialize)]
struct EquipmentRecord {
    version: u32,
    slots: Vec<EquipSlotRecord>,
}

fn encode<T: Serialize>(value: &T, format: SaveFormat) -> Result<Vec<u8>, PersistError> {
    match format {
        SaveFormat::Json => {
            serde_json::to_vec(value).map_err(|e| PersistError::Serialization(e.to_string()))
        }
        SaveFormat::Binary => {
            bincode::serialize(value).map_err(|e| PersistError::Serialization(e.to_string()))
        }
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8], format: SaveFormat) -> Result<T, PersistError> {
    match format {
        SaveFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| PersistError::Serialization(e.to_string()))
        }
        SaveFormat::Binary => {
            bincode::deserialize(bytes).map_err(|e| PersistError::Serialization(e.to_string()))
        }
    }
}

fn check_version(found: u32) -> Result<(), PersistError> {
    if found != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

/// Rebuild an instance from its saved id and per-instance data
fn restore_instance(
    name: &str,
    data: Option<InstanceData>,
    catalog: &ItemCatalog,
) -> Result<ItemInstance, PersistError> {
    let definition = catalog
        .lookup_name(name)
        .ok_or_else(|| PersistError::UnknownItem(name.to_string()))?;
    let mut instance = ItemInstance::new(definition);
    if let Some(data) = data {
        instance = instance.with_data(data);
    }
    Ok(instance)
}

/// Serialize an inventory's slots
///
/// Hooks never persist; reattach them after [`load_inventory`].
pub fn save_inventory(inventory: &Inventory, format: SaveFormat) -> Result<Vec<u8>, PersistError> {
    let record = InventoryRecord {
        version: SAVE_VERSION,
        slots: inventory
            .slots()
            .iter()
            .map(|slot| SlotRecord {
                item: slot.item().map(|item| item.id().name().to_string()),
                data: slot.item().and_then(|item| item.data.clone()),
                count: slot.count(),
            })
            .collect(),
    };
    encode(&record, format)
}

/// Rebuild an inventory against the given catalog
pub fn load_inventory(
    bytes: &[u8],
    catalog: &ItemCatalog,
    format: SaveFormat,
) -> Result<Inventory, PersistError> {
    let record: InventoryRecord = decode(bytes, format)?;
    check_version(record.version)?;

    let mut inventory = Inventory::new(record.slots.len());
    for (index, slot) in record.slots.into_iter().enumerate() {
        match slot.item {
            Some(name) => {
                if slot.count == 0 {
                    return Err(PersistError::Corrupted(format!(
                        "slot {} holds {} with a zero count",
                        index, name
                    )));
                }
                let instance = restore_instance(&name, slot.data, catalog)?;
                if slot.count > instance.max_stack() {
                    return Err(PersistError::Corrupted(format!(
                        "slot {} holds {}x {} but the stack limit is {}",
                        index,
                        slot.count,
                        name,
                        instance.max_stack()
                    )));
                }
                inventory.put_slot(index, instance, slot.count);
            }
            None => {
                if slot.count != 0 {
                    return Err(PersistError::Corrupted(format!(
                        "empty slot {} carries a count of {}",
                        index, slot.count
                    )));
                }
            }
        }
    }
    log::debug!("loaded inventory with {} slots", inventory.size());
    Ok(inventory)
}

/// Serialize an equipment set's slot tags and occupants
pub fn save_equipment(equipment: &Equipment, format: SaveFormat) -> Result<Vec<u8>, PersistError> {
    let record = EquipmentRecord {
        version: SAVE_VERSION,
        slots: equipment
            .slots()
            .iter()
            .map(|slot| EquipSlotRecord {
                tag: slot.tag().to_string(),
                item: slot.item().map(|item| item.id().name().to_string()),
                data: slot.item().and_then(|item| item.data.clone()),
            })
            .collect(),
    };
    encode(&record, format)
}

/// Rebuild an equipment set against the given catalog
pub fn load_equipment(
    bytes: &[u8],
    catalog: &ItemCatalog,
    format: SaveFormat,
) -> Result<Equipment, PersistError> {
    let record: EquipmentRecord = decode(bytes, format)?;
    check_version(record.version)?;

    let mut equipment = Equipment::new();
    for slot in &record.slots {
        equipment.add_slot(slot.tag.clone());
    }
    for (index, slot) in record.slots.into_iter().enumerate() {
        if let Some(name) = slot.item {
            let instance = restore_instance(&name, slot.data, catalog)?;
            let accepted = equipment
                .slot(index)
                .map_or(false, |s| s.accepts(&instance));
            if !accepted {
                return Err(PersistError::Corrupted(format!(
                    "slot {} tagged {} cannot hold {}",
                    index,
                    slot.tag,
                    name
                )));
            }
            equipment.put_slot(index, instance);
        }
    }
    log::debug!("loaded equipment with {} slots", equipment.len());
    Ok(equipment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemDefinition;
    use satchel_core::ActionSource;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec![
            ItemDefinition::new("arrow", "Arrow").with_max_stack(20),
            ItemDefinition::new("sword", "Sword"),
            ItemDefinition::new("iron_helmet", "Iron Helmet")
                .with_equippable(true)
                .with_tag("head"),
        ])
    }

    #[test]
    fn test_inventory_round_trip() {
        let catalog = catalog();
        let arrow = catalog.instance("arrow").unwrap();
        let sword = catalog
            .instance("sword")
            .unwrap()
            .with_data(InstanceData::new("forge", 3));
        let mut inventory = Inventory::new(4);
        inventory.try_add(&arrow, 25, ActionSource::Internal);
        inventory.try_add(&sword, 1, ActionSource::Internal);

        for format in [SaveFormat::Json, SaveFormat::Binary] {
            let bytes = save_inventory(&inventory, format).unwrap();
            let loaded = load_inventory(&bytes, &catalog, format).unwrap();

            assert_eq!(loaded.size(), 4);
            assert_eq!(loaded.count(&arrow), 25);
            assert_eq!(loaded.count(&sword), 1);
            assert_eq!(loaded.count_at(0), 20);
            assert_eq!(loaded.count_at(1), 5);
        }
    }

    #[test]
    fn test_equipment_round_trip() {
        let catalog = catalog();
        let helmet = catalog.instance("iron_helmet").unwrap();
        let mut equipment = Equipment::new().with_slot("head").with_slot("finger");
        equipment.put_slot(0, helmet.clone());

        let bytes = save_equipment(&equipment, SaveFormat::Binary).unwrap();
        let loaded = load_equipment(&bytes, &catalog, SaveFormat::Binary).unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(loaded.is_equipped(&helmet));
        assert_eq!(loaded.slot(1).unwrap().tag(), "finger");
        assert!(loaded.slot(1).unwrap().is_free());
    }

    #[test]
    fn test_unknown_item_rejected() {
        let bytes = br#"{"version":1,"slots":[{"item":"ghost","data":null,"count":1}]}"#;
        let err = load_inventory(bytes, &catalog(), SaveFormat::Json).unwrap_err();
        assert!(matches!(err, PersistError::UnknownItem(name) if name == "ghost"));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let bytes = br#"{"version":99,"slots":[]}"#;
        let err = load_inventory(bytes, &catalog(), SaveFormat::Json).unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[test]
    fn test_corrupted_counts_rejected() {
        let catalog = catalog();

        let zero = br#"{"version":1,"slots":[{"item":"arrow","data":null,"count":0}]}"#;
        assert!(matches!(
            load_inventory(zero, &catalog, SaveFormat::Json),
            Err(PersistError::Corrupted(_))
        ));

        let oversized = br#"{"version":1,"slots":[{"item":"arrow","data":null,"count":50}]}"#;
        assert!(matches!(
            load_inventory(oversized, &catalog, SaveFormat::Json),
            Err(PersistError::Corrupted(_))
        ));

        let phantom = br#"{"version":1,"slots":[{"item":null,"data":null,"count":3}]}"#;
        assert!(matches!(
            load_inventory(phantom, &catalog, SaveFormat::Json),
            Err(PersistError::Corrupted(_))
        ));
    }

    #[test]
    fn test_mismatched_equipment_slot_rejected() {
        let bytes =
            br#"{"version":1,"slots":[{"tag":"finger","item":"iron_helmet","data":null}]}"#;
        let err = load_equipment(bytes, &catalog(), SaveFormat::Json).unwrap_err();
        assert!(matches!(err, PersistError::Corrupted(_)));
    }
}
