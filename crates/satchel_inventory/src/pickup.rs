//! Drop sinks and world-side item piles

use satchel_core::{ActionSource, OperationResult, Reason};

use crate::context::PickupItemContext;
use crate::inventory::Inventory;
use crate::item::ItemInstance;

/// Receives units that leave every container
///
/// Hosts implement this to spawn world pickups, mail overflow to a stash,
/// or whatever else fits. Operations that can push items out of a container
/// take a sink so the units always have somewhere to land.
pub trait DropSink {
    fn spawn(&mut self, item: &ItemInstance, amount: u32);
}

/// A sink that destroys whatever it receives
///
/// For callers that have decided the units are forfeit, such as a shop
/// consuming a payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl DropSink for DiscardSink {
    fn spawn(&mut self, _item: &ItemInstance, _amount: u32) {}
}

/// A pile of identical units lying outside any container
#[derive(Debug, Clone)]
pub struct PickupStash {
    item: ItemInstance,
    amount: u32,
}

impl PickupStash {
    pub fn new(item: ItemInstance, amount: u32) -> Self {
        Self { item, amount }
    }

    pub fn item(&self) -> &ItemInstance {
        &self.item
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Move as much of the pile as fits into the inventory
    ///
    /// Partial pickups succeed and shrink the pile; the payload is the
    /// amount picked up. Fails without touching the pile when nothing fits.
    pub fn pick_up(&mut self, inventory: &mut Inventory) -> OperationResult<u32> {
        if self.amount == 0 {
            return OperationResult::failure(Reason::InvalidAmount);
        }

        let add = inventory.try_add(&self.item, self.amount, ActionSource::External);
        let left = match add.payload() {
            Some(&left) => left,
            None => self.amount,
        };
        let picked = self.amount - left;

        if picked > 0 {
            self.amount = left;
            let ctx = PickupItemContext {
                inventory,
                item: &self.item,
                amount: picked,
            };
            let result = OperationResult::with_payload(Reason::ItemsPickedUp, picked);
            if let Some(hooks) = inventory.hooks() {
                hooks.on_picked_up(ctx, &result);
            }
            self.item.definition.behavior.on_picked_up(ctx, &result);
            log::debug!("picked up {}x {} ({} remain)", picked, self.item.id(), left);
            result
        } else {
            let reason = if add.is_failure() {
                add.reason()
            } else {
                Reason::NotEnoughSpace
            };
            let ctx = PickupItemContext {
                inventory,
                item: &self.item,
                amount: self.amount,
            };
            let result = OperationResult::failure(reason);
            if let Some(hooks) = inventory.hooks() {
                hooks.on_pickup_failed(ctx, &result);
            }
            self.item.definition.behavior.on_pickup_failed(ctx, &result);
            result
        }
    }
}

/// Dropped items accumulated as merged piles
///
/// The default sink for gameplay: compatible drops merge into one pile, so
/// conservation checks can compare container totals against ground totals.
#[derive(Debug, Clone, Default)]
pub struct GroundItems {
    piles: Vec<PickupStash>,
}

impl GroundItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units on the ground compatible with `item`
    pub fn count(&self, item: &ItemInstance) -> u32 {
        self.piles
            .iter()
            .filter(|pile| pile.item.stack_compatible(item))
            .fold(0u32, |acc, pile| acc.saturating_add(pile.amount))
    }

    pub fn piles(&self) -> &[PickupStash] {
        &self.piles
    }

    pub fn len(&self) -> usize {
        self.piles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.piles.is_empty()
    }

    /// Remove and return one pile, if the index is in range
    pub fn take_pile(&mut self, index: usize) -> Option<PickupStash> {
        if index < self.piles.len() {
            Some(self.piles.remove(index))
        } else {
            None
        }
    }

    /// Mutable access to one pile for in-place pickup
    pub fn pile_mut(&mut self, index: usize) -> Option<&mut PickupStash> {
        self.piles.get_mut(index)
    }

    /// Drop empty piles after pickups
    pub fn prune(&mut self) {
        self.piles.retain(|pile| pile.amount > 0);
    }
}

impl DropSink for GroundItems {
    fn spawn(&mut self, item: &ItemInstance, amount: u32) {
        if amount == 0 {
            return;
        }
        for pile in &mut self.piles {
            if pile.item.stack_compatible(item) {
                pile.amount = pile.amount.saturating_add(amount);
                return;
            }
        }
        self.piles.push(PickupStash::new(item.clone(), amount));
    }
}
