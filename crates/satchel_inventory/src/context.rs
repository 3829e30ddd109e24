//! Ephemeral descriptors of one attempted action
//!
//! Contexts bind together the acting container(s), slot index(es), item and
//! amount/flags of a single operation. They are built on the stack, passed by
//! value into policy and event hooks and never stored.

use crate::equipment::{EquipFlags, Equipment};
use crate::inventory::{Inventory, TransferFlags};
use crate::item::ItemInstance;

/// One attempted add
#[derive(Clone, Copy)]
pub struct AddItemContext<'a> {
    /// Receiving container
    pub inventory: &'a Inventory,
    /// Item being added
    pub item: &'a ItemInstance,
    /// Requested amount
    pub amount: u32,
}

/// One attempted take
#[derive(Clone, Copy)]
pub struct TakeItemContext<'a> {
    /// Source container
    pub inventory: &'a Inventory,
    /// Item being removed
    pub item: &'a ItemInstance,
    /// Requested amount
    pub amount: u32,
}

/// One attempted transfer between two slots or two containers
#[derive(Clone, Copy)]
pub struct TransferItemContext<'a> {
    /// Container items leave from
    pub source: &'a Inventory,
    /// Container items arrive in
    pub target: &'a Inventory,
    /// Source slot, absent for count-based bulk transfers
    pub source_slot: Option<usize>,
    /// Target slot, absent for count-based bulk transfers
    pub target_slot: Option<usize>,
    /// Occupant of the source side
    pub source_item: Option<&'a ItemInstance>,
    /// Occupant of the target side
    pub target_item: Option<&'a ItemInstance>,
    /// Units requested to move
    pub amount: u32,
    /// Behavior switches for this transfer
    pub flags: TransferFlags,
    /// Whether source and target are the same container
    pub within_inventory: bool,
}

impl TransferItemContext<'_> {
    /// True for count-based transfers that may touch several slots
    pub fn is_multi_slot(&self) -> bool {
        self.source_slot.is_none()
    }
}

/// One attempted equip
#[derive(Clone, Copy)]
pub struct EquipItemContext<'a> {
    /// Receiving equipment set
    pub equipment: &'a Equipment,
    /// Item being equipped
    pub item: &'a ItemInstance,
    /// Container the item is taken from, if any
    pub inventory: Option<&'a Inventory>,
    /// Slot the item sits in within that container
    pub inventory_slot: Option<usize>,
    /// Behavior switches for this equip
    pub flags: EquipFlags,
}

/// One attempted unequip
#[derive(Clone, Copy)]
pub struct UnequipItemContext<'a> {
    /// Equipment set the item leaves
    pub equipment: &'a Equipment,
    /// Item being unequipped
    pub item: &'a ItemInstance,
    /// Container the item returns to, if any
    pub inventory: Option<&'a Inventory>,
    /// Behavior switches for this unequip
    pub flags: EquipFlags,
}

/// One attempted item use
#[derive(Clone, Copy)]
pub struct UseItemContext<'a> {
    /// Container holding the item
    pub inventory: &'a Inventory,
    /// Slot the item sits in
    pub slot_index: usize,
    /// Item being used
    pub item: &'a ItemInstance,
}

/// One attempted drop into the world
#[derive(Clone, Copy)]
pub struct DropItemContext<'a> {
    /// Container the items left, absent for items that never entered one
    pub inventory: Option<&'a Inventory>,
    /// Item being dropped
    pub item: &'a ItemInstance,
    /// Units handed to the drop collaborator
    pub amount: u32,
}

/// One attempted pickup from the world
#[derive(Clone, Copy)]
pub struct PickupItemContext<'a> {
    /// Receiving container
    pub inventory: &'a Inventory,
    /// Item being picked up
    pub item: &'a ItemInstance,
    /// Units actually placed
    pub amount: u32,
}
