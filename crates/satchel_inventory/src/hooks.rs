//! Policy and event hooks
//!
//! Policy hooks (`can_*`) run before a mutation and may veto it by returning
//! a failure; the operation aborts with that reason and nothing changes.
//! Event hooks (`on_*`) run strictly after the outcome is decided and only
//! observe. Sub-operations carrying [`ActionSource::Internal`] skip both.
//!
//! [`ActionSource::Internal`]: satchel_core::ActionSource::Internal

use satchel_core::{OperationResult, Reason};

use crate::context::{
    AddItemContext, DropItemContext, EquipItemContext, PickupItemContext, TakeItemContext,
    TransferItemContext, UnequipItemContext, UseItemContext,
};

fn permitted() -> OperationResult {
    OperationResult::success(Reason::Permitted)
}

/// Container-level extension points
///
/// Every method has a permissive or no-op default; implement only what the
/// host cares about. Attach with [`Inventory::with_hooks`].
///
/// [`Inventory::with_hooks`]: crate::inventory::Inventory::with_hooks
pub trait InventoryHooks {
    /// Veto point before items are added
    fn can_add(&self, _ctx: AddItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before items are taken
    fn can_take(&self, _ctx: TakeItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before a transfer touches this container
    fn can_transfer(&self, _ctx: TransferItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before an item is used out of this container
    fn can_use(&self, _ctx: UseItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Items were added
    fn on_added(&self, _ctx: AddItemContext<'_>, _result: &OperationResult<u32>) {}

    /// An add was rejected or placed nothing
    fn on_add_failed(&self, _ctx: AddItemContext<'_>, _result: &OperationResult<u32>) {}

    /// Items were taken
    fn on_taken(&self, _ctx: TakeItemContext<'_>, _result: &OperationResult<u32>) {}

    /// A take was rejected or came up short
    fn on_take_failed(&self, _ctx: TakeItemContext<'_>, _result: &OperationResult<u32>) {}

    /// A transfer involving this container completed
    fn on_transferred(&self, _ctx: TransferItemContext<'_>, _result: &OperationResult) {}

    /// A transfer involving this container was rejected
    fn on_transfer_failed(&self, _ctx: TransferItemContext<'_>, _result: &OperationResult) {}

    /// An item was used
    fn on_used(&self, _ctx: UseItemContext<'_>, _result: &OperationResult) {}

    /// An item use was rejected
    fn on_use_failed(&self, _ctx: UseItemContext<'_>, _result: &OperationResult) {}

    /// Items left this container for the world
    fn on_dropped(&self, _ctx: DropItemContext<'_>, _result: &OperationResult) {}

    /// Items entered this container from the world
    fn on_picked_up(&self, _ctx: PickupItemContext<'_>, _result: &OperationResult<u32>) {}

    /// A pickup placed nothing
    fn on_pickup_failed(&self, _ctx: PickupItemContext<'_>, _result: &OperationResult<u32>) {}
}

/// Equipment-level extension points
pub trait EquipmentHooks {
    /// Veto point before an item is equipped
    fn can_equip(&self, _ctx: EquipItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before an item is unequipped
    fn can_unequip(&self, _ctx: UnequipItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// An item was equipped
    fn on_equipped(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// The item was already equipped, nothing changed
    fn on_already_equipped(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// An equip was rejected
    fn on_equip_failed(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// An item was unequipped
    fn on_unequipped(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}

    /// The item was not equipped, nothing changed
    fn on_already_unequipped(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}

    /// An unequip was rejected
    fn on_unequip_failed(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}
}

/// Item-level behavior strategy
///
/// Replaces per-item-type subclassing: a definition carries one strategy
/// object and the engine consults it wherever the item participates in an
/// operation. `on_use` is where a usable item performs its effect.
pub trait ItemBehavior {
    /// Veto point before this item is added to a container
    fn can_add(&self, _ctx: AddItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before this item is taken from a container
    fn can_take(&self, _ctx: TakeItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before this item is transferred
    fn can_transfer(&self, _ctx: TransferItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before this item is equipped
    fn can_equip(&self, _ctx: EquipItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before this item is unequipped
    fn can_unequip(&self, _ctx: UnequipItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// Veto point before this item is used
    fn can_use(&self, _ctx: UseItemContext<'_>) -> OperationResult {
        permitted()
    }

    /// The item was added to a container
    fn on_added(&self, _ctx: AddItemContext<'_>, _result: &OperationResult<u32>) {}

    /// Adding the item was rejected
    fn on_add_failed(&self, _ctx: AddItemContext<'_>, _result: &OperationResult<u32>) {}

    /// The item was taken from a container
    fn on_taken(&self, _ctx: TakeItemContext<'_>, _result: &OperationResult<u32>) {}

    /// Taking the item was rejected
    fn on_take_failed(&self, _ctx: TakeItemContext<'_>, _result: &OperationResult<u32>) {}

    /// The item was transferred
    fn on_transferred(&self, _ctx: TransferItemContext<'_>, _result: &OperationResult) {}

    /// Transferring the item was rejected
    fn on_transfer_failed(&self, _ctx: TransferItemContext<'_>, _result: &OperationResult) {}

    /// The item was equipped
    fn on_equipped(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// The item was already equipped
    fn on_already_equipped(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// Equipping the item was rejected
    fn on_equip_failed(&self, _ctx: EquipItemContext<'_>, _result: &OperationResult) {}

    /// The item was unequipped
    fn on_unequipped(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}

    /// The item was not equipped to begin with
    fn on_already_unequipped(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}

    /// Unequipping the item was rejected
    fn on_unequip_failed(&self, _ctx: UnequipItemContext<'_>, _result: &OperationResult) {}

    /// The item's effect: runs once per successful use
    fn on_use(&self, _ctx: UseItemContext<'_>, _result: &OperationResult) {}

    /// Using the item was rejected
    fn on_use_failed(&self, _ctx: UseItemContext<'_>, _result: &OperationResult) {}

    /// The item left the model for the world
    fn on_dropped(&self, _ctx: DropItemContext<'_>, _result: &OperationResult) {}

    /// The item entered a container from the world
    fn on_picked_up(&self, _ctx: PickupItemContext<'_>, _result: &OperationResult<u32>) {}

    /// A pickup of the item placed nothing
    fn on_pickup_failed(&self, _ctx: PickupItemContext<'_>, _result: &OperationResult<u32>) {}
}

/// Behavior that permits everything and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBehavior;

impl ItemBehavior for NoBehavior {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_permit() {
        struct Bare;
        impl InventoryHooks for Bare {}
        impl EquipmentHooks for Bare {}

        // A hook type that overrides nothing must not veto anything; probe
        // one policy per trait through a real container.
        let inv = crate::inventory::Inventory::new(1);
        let item = crate::item::ItemInstance::new(std::sync::Arc::new(
            crate::item::ItemDefinition::new("probe", "Probe"),
        ));
        let ctx = AddItemContext {
            inventory: &inv,
            item: &item,
            amount: 1,
        };
        assert!(Bare.can_add(ctx).is_success());
        assert!(NoBehavior.can_add(ctx).is_success());
    }
}
