//! Typed equipment slot sets

use std::fmt;
use std::sync::Arc;

use satchel_core::{ActionSource, OperationResult, Reason};

use crate::context::{EquipItemContext, UnequipItemContext};
use crate::hooks::EquipmentHooks;
use crate::inventory::Inventory;
use crate::item::ItemInstance;
use crate::pickup::DropSink;

/// Behavior switches for equip and unequip operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EquipFlags(u8);

impl EquipFlags {
    /// No special behavior
    pub const NONE: Self = Self(0);
    /// Skip the policy hooks
    pub const IGNORE_CONDITIONS: Self = Self(1 << 0);
    /// Move the item between the inventory and the equipment set
    pub const MODIFY_INVENTORY: Self = Self(1 << 1);
    /// Permit evicting an occupant when every accepting slot is taken
    pub const ALLOW_ITEM_SWAP: Self = Self(1 << 2);

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for EquipFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EquipFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One typed equipment slot holding at most one item
#[derive(Debug, Clone)]
pub struct EquipmentSlot {
    tag: String,
    item: Option<ItemInstance>,
}

impl EquipmentSlot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            item: None,
        }
    }

    /// The tag an item must carry to fit here
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn item(&self) -> Option<&ItemInstance> {
        self.item.as_ref()
    }

    pub fn is_free(&self) -> bool {
        self.item.is_none()
    }

    /// Whether this slot's type matches the item
    pub fn accepts(&self, item: &ItemInstance) -> bool {
        item.definition.equippable && item.definition.has_tag(&self.tag)
    }

    pub(crate) fn put(&mut self, item: ItemInstance) {
        debug_assert!(self.item.is_none());
        debug_assert!(self.accepts(&item));
        self.item = Some(item);
    }

    pub(crate) fn clear(&mut self) -> Option<ItemInstance> {
        self.item.take()
    }
}

/// An ordered set of typed equipment slots
///
/// Items enter through [`equip`] and leave through the unequip family; both
/// consult policy hooks first and fire event hooks once the outcome is
/// final. Anything that cannot return to an inventory goes to the drop sink,
/// so no unit is ever silently destroyed.
///
/// [`equip`]: Equipment::equip
#[derive(Clone, Default)]
pub struct Equipment {
    slots: Vec<EquipmentSlot>,
    hooks: Option<Arc<dyn EquipmentHooks>>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot accepting items tagged `tag`
    pub fn with_slot(mut self, tag: impl Into<String>) -> Self {
        self.add_slot(tag);
        self
    }

    /// Grow the set by one slot at the end
    pub fn add_slot(&mut self, tag: impl Into<String>) {
        self.slots.push(EquipmentSlot::new(tag));
    }

    /// Attach set-level hooks
    pub fn with_hooks(mut self, hooks: Arc<dyn EquipmentHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Replace the set-level hooks
    pub fn set_hooks(&mut self, hooks: Arc<dyn EquipmentHooks>) {
        self.hooks = Some(hooks);
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read-only view of all slots
    pub fn slots(&self) -> &[EquipmentSlot] {
        &self.slots
    }

    /// One slot, if the index is in range
    pub fn slot(&self, index: usize) -> Option<&EquipmentSlot> {
        self.slots.get(index)
    }

    /// Whether a stack-compatible copy of `item` is currently worn
    pub fn is_equipped(&self, item: &ItemInstance) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.item().map_or(false, |o| o.stack_compatible(item)))
    }

    /// First equipped item matching the predicate, in slot order
    pub fn first_equipped(
        &self,
        pred: impl Fn(&ItemInstance) -> bool,
    ) -> Option<(usize, &ItemInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.item().map(|item| (index, item)))
            .find(|(_, item)| pred(item))
    }

    /// All equipped items matching the predicate, in slot order
    pub fn equipped(&self, pred: impl Fn(&ItemInstance) -> bool) -> Vec<(usize, &ItemInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.item().map(|item| (index, item)))
            .filter(|(_, item)| pred(item))
            .collect()
    }

    /// First free slot whose type accepts the item
    pub fn free_slot(&self, item: &ItemInstance) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.is_free() && slot.accepts(item))
    }

    /// First free accepting slot, falling back to the first occupied one
    pub fn free_or_swap_slot(&self, item: &ItemInstance) -> Option<usize> {
        self.free_slot(item)
            .or_else(|| self.slots.iter().position(|slot| slot.accepts(item)))
    }

    /// Equip an item into the first accepting slot
    ///
    /// Free slots always win over occupied ones; an occupant is only evicted
    /// under `ALLOW_ITEM_SWAP`, via a full unequip that fires its own hooks.
    /// With `MODIFY_INVENTORY` and a source slot the equipped unit leaves the
    /// inventory once the item is placed.
    pub fn equip(
        &mut self,
        item: &ItemInstance,
        mut inventory: Option<(&mut Inventory, usize)>,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        if !item.definition.equippable {
            let result = OperationResult::failure(Reason::ItemNotEquippable);
            if !source.is_internal() {
                let ctx = self.equip_ctx(item, &inventory, flags);
                self.fire_equip_failed(ctx, &result);
            }
            return result;
        }
        if self.is_equipped(item) {
            let result = OperationResult::failure(Reason::AlreadyEquipped);
            if !source.is_internal() {
                let ctx = self.equip_ctx(item, &inventory, flags);
                if let Some(hooks) = &self.hooks {
                    hooks.on_already_equipped(ctx, &result);
                }
                item.definition.behavior.on_already_equipped(ctx, &result);
            }
            return result;
        }
        if !flags.contains(EquipFlags::IGNORE_CONDITIONS) && !source.is_internal() {
            let verdict = self.permit_equip(self.equip_ctx(item, &inventory, flags));
            if verdict.is_failure() {
                let result = OperationResult::failure(verdict.reason());
                let ctx = self.equip_ctx(item, &inventory, flags);
                self.fire_equip_failed(ctx, &result);
                return result;
            }
        }

        let chosen = if flags.contains(EquipFlags::ALLOW_ITEM_SWAP) {
            self.free_or_swap_slot(item)
        } else {
            self.free_slot(item)
        };
        let Some(slot_index) = chosen else {
            let result = OperationResult::failure(Reason::NoFreeSlots);
            if !source.is_internal() {
                let ctx = self.equip_ctx(item, &inventory, flags);
                self.fire_equip_failed(ctx, &result);
            }
            return result;
        };

        // Evict the occupant with a full unequip so its hooks fire
        if !self.slots[slot_index].is_free() {
            let mut evict_flags = EquipFlags::MODIFY_INVENTORY;
            if flags.contains(EquipFlags::IGNORE_CONDITIONS) {
                evict_flags |= EquipFlags::IGNORE_CONDITIONS;
            }
            let evicted = self.unequip_slot(
                slot_index,
                inventory.as_mut().map(|(inv, _)| &mut **inv),
                evict_flags,
                source,
                sink,
            );
            if evicted.is_failure() {
                let result = OperationResult::failure(evicted.reason());
                if !source.is_internal() {
                    let ctx = self.equip_ctx(item, &inventory, flags);
                    self.fire_equip_failed(ctx, &result);
                }
                return result;
            }
        }

        self.slots[slot_index].put(item.clone());

        // Pull the equipped unit out of its source slot without re-running policy
        if flags.contains(EquipFlags::MODIFY_INVENTORY) {
            if let Some((inv, inv_slot)) = inventory.as_mut() {
                let take = inv.take_at(*inv_slot, 1, ActionSource::Internal);
                debug_assert!(take.is_success(), "equip source slot did not hold the item");
                if take.is_failure() {
                    log::warn!(
                        "equip could not remove {} from source slot {}",
                        item.id(),
                        inv_slot
                    );
                }
            }
        }

        let result = OperationResult::success(Reason::Equipped);
        if !source.is_internal() {
            let ctx = self.equip_ctx(item, &inventory, flags);
            if let Some(hooks) = &self.hooks {
                hooks.on_equipped(ctx, &result);
            }
            item.definition.behavior.on_equipped(ctx, &result);
        }
        log::debug!("equipped {} into slot {}", item.id(), slot_index);
        result
    }

    /// Unequip a worn item, returning it to `inventory` or the sink
    pub fn unequip(
        &mut self,
        item: &ItemInstance,
        inventory: Option<&mut Inventory>,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        let found = self
            .slots
            .iter()
            .position(|slot| slot.item().map_or(false, |o| o.stack_compatible(item)));
        let Some(slot_index) = found else {
            let result = OperationResult::failure(Reason::NotEquipped);
            if !source.is_internal() {
                let ctx = UnequipItemContext {
                    equipment: self,
                    item,
                    inventory: inventory.as_deref(),
                    flags,
                };
                if let Some(hooks) = &self.hooks {
                    hooks.on_already_unequipped(ctx, &result);
                }
                item.definition.behavior.on_already_unequipped(ctx, &result);
            }
            return result;
        };
        self.unequip_slot(slot_index, inventory, flags, source, sink)
    }

    /// Unequip whatever occupies one slot
    pub fn unequip_at(
        &mut self,
        slot_index: usize,
        inventory: Option<&mut Inventory>,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        if slot_index >= self.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }
        self.unequip_slot(slot_index, inventory, flags, source, sink)
    }

    /// Shrink the set by one slot, vacating its occupant first
    pub fn remove_slot(
        &mut self,
        slot_index: usize,
        inventory: Option<&mut Inventory>,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        if slot_index >= self.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }
        if !self.slots[slot_index].is_free() {
            let vacated = self.unequip_slot(
                slot_index,
                inventory,
                EquipFlags::MODIFY_INVENTORY | EquipFlags::IGNORE_CONDITIONS,
                ActionSource::Internal,
                sink,
            );
            if vacated.is_failure() {
                return vacated;
            }
        }
        self.slots.remove(slot_index);
        OperationResult::success(Reason::Permitted)
    }

    pub(crate) fn put_slot(&mut self, index: usize, item: ItemInstance) {
        self.slots[index].put(item);
    }

    /// Clear one slot and route its occupant out of the set
    ///
    /// The slot empties before the occupant re-enters any container, so an
    /// immediate re-equip into the same slot observes it free. An occupant
    /// that cannot return to the inventory goes to the sink.
    fn unequip_slot(
        &mut self,
        slot_index: usize,
        mut inventory: Option<&mut Inventory>,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        let Some(occupant) = self.slots[slot_index].item().cloned() else {
            return OperationResult::failure(Reason::SlotIsEmpty);
        };

        if !flags.contains(EquipFlags::IGNORE_CONDITIONS) && !source.is_internal() {
            let verdict = {
                let ctx = UnequipItemContext {
                    equipment: self,
                    item: &occupant,
                    inventory: inventory.as_deref(),
                    flags,
                };
                self.permit_unequip(ctx)
            };
            if verdict.is_failure() {
                let result = OperationResult::failure(verdict.reason());
                let ctx = UnequipItemContext {
                    equipment: self,
                    item: &occupant,
                    inventory: inventory.as_deref(),
                    flags,
                };
                self.fire_unequip_failed(ctx, &result);
                return result;
            }
        }

        self.slots[slot_index].clear();

        match (
            flags.contains(EquipFlags::MODIFY_INVENTORY),
            inventory.as_deref_mut(),
        ) {
            (true, Some(inv)) => {
                let add = inv.try_add(&occupant, 1, ActionSource::Internal);
                let leftover = add.into_payload().unwrap_or(1);
                if leftover > 0 {
                    sink.spawn(&occupant, leftover);
                }
            }
            _ => sink.spawn(&occupant, 1),
        }

        let result = OperationResult::success(Reason::Unequipped);
        if !source.is_internal() {
            let ctx = UnequipItemContext {
                equipment: self,
                item: &occupant,
                inventory: inventory.as_deref(),
                flags,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_unequipped(ctx, &result);
            }
            occupant.definition.behavior.on_unequipped(ctx, &result);
        }
        log::debug!("unequipped {} from slot {}", occupant.id(), slot_index);
        result
    }

    fn equip_ctx<'a>(
        &'a self,
        item: &'a ItemInstance,
        inventory: &'a Option<(&mut Inventory, usize)>,
        flags: EquipFlags,
    ) -> EquipItemContext<'a> {
        EquipItemContext {
            equipment: self,
            item,
            inventory: inventory.as_ref().map(|(inv, _)| &**inv),
            inventory_slot: inventory.as_ref().map(|(_, slot)| *slot),
            flags,
        }
    }

    fn permit_equip(&self, ctx: EquipItemContext<'_>) -> OperationResult {
        if let Some(hooks) = &self.hooks {
            let verdict = hooks.can_equip(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
        ctx.item.definition.behavior.can_equip(ctx)
    }

    fn permit_unequip(&self, ctx: UnequipItemContext<'_>) -> OperationResult {
        if let Some(hooks) = &self.hooks {
            let verdict = hooks.can_unequip(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
        ctx.item.definition.behavior.can_unequip(ctx)
    }

    fn fire_equip_failed(&self, ctx: EquipItemContext<'_>, result: &OperationResult) {
        if let Some(hooks) = &self.hooks {
            hooks.on_equip_failed(ctx, result);
        }
        ctx.item.definition.behavior.on_equip_failed(ctx, result);
    }

    fn fire_unequip_failed(&self, ctx: UnequipItemContext<'_>, result: &OperationResult) {
        if let Some(hooks) = &self.hooks {
            hooks.on_unequip_failed(ctx, result);
        }
        ctx.item.definition.behavior.on_unequip_failed(ctx, result);
    }
}

impl fmt::Debug for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equipment")
            .field("slots", &self.slots.len())
            .field(
                "worn",
                &self.slots.iter().filter(|slot| !slot.is_free()).count(),
            )
            .finish()
    }
}
