//! Slotted inventories and typed equipment for games
//!
//! Containers hold stacks of items in a fixed number of ordered slots;
//! equipment sets hold single items in tag-typed slots. Every mutating
//! operation validates before it commits, reports a typed
//! [`OperationResult`], and consults optional policy and event hooks.
//!
//! ```ignore
//! use satchel_inventory::prelude::*;
//! use std::sync::Arc;
//!
//! let arrow = ItemInstance::new(Arc::new(
//!     ItemDefinition::new("arrow", "Arrow").with_max_stack(20),
//! ));
//! let mut quiver = Inventory::new(4);
//!
//! let result = quiver.try_add(&arrow, 30, ActionSource::External);
//! assert!(result.is_success());
//! assert_eq!(quiver.count(&arrow), 30);
//! ```

pub mod catalog;
pub mod context;
pub mod equipment;
pub mod hooks;
pub mod inventory;
pub mod item;
pub mod persistence;
pub mod pickup;
pub mod slot;

/// Commonly used types
pub mod prelude {
    pub use satchel_core::{ActionSource, Domain, ItemId, OperationResult, Reason};

    pub use crate::catalog::ItemCatalog;
    pub use crate::equipment::{EquipFlags, Equipment, EquipmentSlot};
    pub use crate::hooks::{EquipmentHooks, InventoryHooks, ItemBehavior};
    pub use crate::inventory::{Inventory, TransferFlags};
    pub use crate::item::{InstanceData, InstanceValue, ItemDefinition, ItemInstance};
    pub use crate::persistence::{PersistError, SaveFormat};
    pub use crate::pickup::{DiscardSink, DropSink, GroundItems, PickupStash};
    pub use crate::slot::Slot;
}

pub use prelude::*;
