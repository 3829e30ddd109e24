//! Fixed-capacity slotted containers and their algorithms

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use satchel_core::{ActionSource, OperationResult, Reason};

use crate::context::{
    AddItemContext, DropItemContext, TakeItemContext, TransferItemContext, UseItemContext,
};
use crate::equipment::{EquipFlags, Equipment};
use crate::hooks::InventoryHooks;
use crate::item::ItemInstance;
use crate::pickup::DropSink;
use crate::slot::Slot;

/// Behavior switches for slot-to-slot transfers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransferFlags(u8);

impl TransferFlags {
    /// No special behavior
    pub const NONE: Self = Self(0);
    /// Permit swapping with a slot occupied by an incompatible item
    pub const SWAP_IF_OCCUPIED_BY_ANOTHER: Self = Self(1 << 0);
    /// Permit swapping with a full slot occupied by the same item
    pub const SWAP_IF_OCCUPIED_BY_SAME: Self = Self(1 << 1);
    /// Permit moving only part of the source stack when space is short
    pub const ALLOW_PARTIAL_TRANSFER: Self = Self(1 << 2);

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TransferFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TransferFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Resolved shape of one transfer, decided before anything mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferPlan {
    /// Move `amount` units onto a compatible target stack
    Combine { amount: u32 },
    /// Move the whole source stack into an empty target
    Move,
    /// Exchange the two slot contents
    Swap,
}

/// Decide what a transfer would do, without touching either slot
fn plan_transfer(source: &Slot, target: &Slot, flags: TransferFlags) -> Result<TransferPlan, Reason> {
    let Some(source_item) = source.item() else {
        return Err(Reason::SlotIsEmpty);
    };

    let Some(target_item) = target.item() else {
        return Ok(TransferPlan::Move);
    };

    if target_item.stack_compatible(source_item) {
        let space = target.space_left();
        if space >= source.count() {
            Ok(TransferPlan::Combine {
                amount: source.count(),
            })
        } else if flags.contains(TransferFlags::ALLOW_PARTIAL_TRANSFER) && space > 0 {
            Ok(TransferPlan::Combine { amount: space })
        } else if flags.contains(TransferFlags::SWAP_IF_OCCUPIED_BY_SAME) {
            Ok(TransferPlan::Swap)
        } else {
            Err(Reason::NotEnoughSpace)
        }
    } else if flags.contains(TransferFlags::SWAP_IF_OCCUPIED_BY_ANOTHER) {
        Ok(TransferPlan::Swap)
    } else {
        Err(Reason::NotAllowed)
    }
}

/// Carry out a previously decided transfer plan
fn apply_transfer(source: &mut Slot, target: &mut Slot, plan: TransferPlan) {
    match plan {
        TransferPlan::Combine { amount } => {
            let moved = target.fill(amount);
            debug_assert_eq!(moved, amount);
            source.deduct(amount);
        }
        TransferPlan::Move => {
            if let Some((item, count)) = source.clear() {
                target.put(item, count);
            }
        }
        TransferPlan::Swap => Slot::swap(source, target),
    }
}

/// Consult both containers' and both items' transfer policies
fn permit_transfer(ctx: TransferItemContext<'_>) -> OperationResult {
    if let Some(hooks) = ctx.source.hooks() {
        let verdict = hooks.can_transfer(ctx);
        if verdict.is_failure() {
            return verdict;
        }
    }
    if !std::ptr::eq(ctx.source, ctx.target) {
        if let Some(hooks) = ctx.target.hooks() {
            let verdict = hooks.can_transfer(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
    }
    if let Some(item) = ctx.source_item {
        let verdict = item.definition.behavior.can_transfer(ctx);
        if verdict.is_failure() {
            return verdict;
        }
    }
    if let Some(item) = ctx.target_item {
        let verdict = item.definition.behavior.can_transfer(ctx);
        if verdict.is_failure() {
            return verdict;
        }
    }
    OperationResult::success(Reason::Permitted)
}

/// Notify both containers and both items of a transfer outcome
fn fire_transfer_events(ctx: TransferItemContext<'_>, result: &OperationResult) {
    let same = std::ptr::eq(ctx.source, ctx.target);
    if result.is_success() {
        if let Some(hooks) = ctx.source.hooks() {
            hooks.on_transferred(ctx, result);
        }
        if !same {
            if let Some(hooks) = ctx.target.hooks() {
                hooks.on_transferred(ctx, result);
            }
        }
        if let Some(item) = ctx.source_item {
            item.definition.behavior.on_transferred(ctx, result);
        }
        if let Some(item) = ctx.target_item {
            item.definition.behavior.on_transferred(ctx, result);
        }
    } else {
        if let Some(hooks) = ctx.source.hooks() {
            hooks.on_transfer_failed(ctx, result);
        }
        if !same {
            if let Some(hooks) = ctx.target.hooks() {
                hooks.on_transfer_failed(ctx, result);
            }
        }
        if let Some(item) = ctx.source_item {
            item.definition.behavior.on_transfer_failed(ctx, result);
        }
        if let Some(item) = ctx.target_item {
            item.definition.behavior.on_transfer_failed(ctx, result);
        }
    }
}

/// A fixed-capacity ordered sequence of slots
///
/// The slot count is fixed at construction; a zero-slot container is the
/// "not created" state and rejects every mutating operation. All slot
/// mutation goes through the operations here, which consult policy hooks
/// before touching anything and fire event hooks once the outcome is final.
#[derive(Clone, Default)]
pub struct Inventory {
    slots: Vec<Slot>,
    hooks: Option<Arc<dyn InventoryHooks>>,
}

impl Inventory {
    /// Create an inventory with `size` empty slots
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Slot::empty(); size],
            hooks: None,
        }
    }

    /// Attach container-level hooks
    pub fn with_hooks(mut self, hooks: Arc<dyn InventoryHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Replace the container-level hooks
    pub fn set_hooks(&mut self, hooks: Arc<dyn InventoryHooks>) {
        self.hooks = Some(hooks);
    }

    pub(crate) fn hooks(&self) -> Option<&Arc<dyn InventoryHooks>> {
        self.hooks.as_ref()
    }

    /// Number of slots
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Whether this container has any slots to operate on
    pub fn is_created(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Read-only view of all slots
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// One slot, if the index is in range
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// The occupant of a slot; out-of-range indices yield `None`
    pub fn item_at(&self, index: usize) -> Option<&ItemInstance> {
        self.slots.get(index).and_then(Slot::item)
    }

    /// The count stored in a slot; out-of-range indices yield 0
    pub fn count_at(&self, index: usize) -> u32 {
        self.slots.get(index).map_or(0, Slot::count)
    }

    /// Iterate over occupied slots as (index, item, count)
    pub fn items(&self) -> impl Iterator<Item = (usize, &ItemInstance, u32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.item().map(|item| (index, item, slot.count())))
    }

    /// First occupied slot matching the predicate, in slot order
    pub fn find_first(
        &self,
        pred: impl Fn(&ItemInstance) -> bool,
    ) -> Option<(usize, &ItemInstance)> {
        self.items()
            .find(|(_, item, _)| pred(item))
            .map(|(index, item, _)| (index, item))
    }

    /// All occupied slots matching the predicate, in slot order
    pub fn find_all(&self, pred: impl Fn(&ItemInstance) -> bool) -> Vec<(usize, &ItemInstance)> {
        self.items()
            .filter(|(_, item, _)| pred(item))
            .map(|(index, item, _)| (index, item))
            .collect()
    }

    /// Best match under the built-in item ranking
    pub fn find_best(
        &self,
        pred: impl Fn(&ItemInstance) -> bool,
    ) -> Option<(usize, &ItemInstance)> {
        self.find_best_by(pred, ItemInstance::rank)
    }

    /// Best match under a caller-supplied comparer
    ///
    /// Only a strictly greater item replaces the running best, so equal-rank
    /// candidates resolve to the earliest slot.
    pub fn find_best_by(
        &self,
        pred: impl Fn(&ItemInstance) -> bool,
        cmp: impl Fn(&ItemInstance, &ItemInstance) -> Ordering,
    ) -> Option<(usize, &ItemInstance)> {
        let mut best: Option<(usize, &ItemInstance)> = None;
        for (index, item, _) in self.items() {
            if !pred(item) {
                continue;
            }
            match best {
                Some((_, current)) if cmp(item, current) != Ordering::Greater => {}
                _ => best = Some((index, item)),
            }
        }
        best
    }

    /// Total units stack-compatible with `item` across all slots
    pub fn count(&self, item: &ItemInstance) -> u32 {
        self.slots
            .iter()
            .filter(|slot| slot.item().map_or(false, |o| o.stack_compatible(item)))
            .fold(0u32, |acc, slot| acc.saturating_add(slot.count()))
    }

    /// Whether at least `amount` compatible units are present
    pub fn has(&self, item: &ItemInstance, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Space available for a candidate item across all slots
    ///
    /// Empty slots contribute the candidate's max stack, compatible stacks
    /// their remaining space, incompatible occupants nothing. An absent
    /// candidate reports unbounded space.
    pub fn free_space_for(&self, item: Option<&ItemInstance>) -> u32 {
        let Some(item) = item else {
            return u32::MAX;
        };
        self.slots
            .iter()
            .fold(0u32, |acc, slot| acc.saturating_add(slot.space_for(item)))
    }

    /// Whether `amount` units of `item` would fit
    pub fn can_store(&self, item: &ItemInstance, amount: u32) -> bool {
        self.free_space_for(Some(item)) >= amount
    }

    /// Add up to `amount` units, stacking onto compatible slots first
    ///
    /// Fills existing compatible, non-full stacks in slot order before
    /// claiming empty slots. The success payload is the unplaced remainder;
    /// 0 means everything fit.
    pub fn try_add(
        &mut self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
    ) -> OperationResult<u32> {
        if amount == 0 {
            return self.reject_add(item, amount, source, Reason::InvalidAmount);
        }
        if !self.is_created() {
            return self.reject_add(item, amount, source, Reason::InventoryNotCreated);
        }
        if !source.is_internal() {
            let verdict = self.permit_add(AddItemContext {
                inventory: self,
                item,
                amount,
            });
            if verdict.is_failure() {
                return self.reject_add(item, amount, source, verdict.reason());
            }
        }

        let mut remaining = amount;

        // Pass 1: top up existing compatible stacks
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            let compatible = slot
                .item()
                .map_or(false, |occupant| occupant.stack_compatible(item));
            if compatible {
                remaining -= slot.fill(remaining);
            }
        }

        // Pass 2: claim empty slots
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_empty() {
                let portion = remaining.min(item.max_stack());
                slot.put(item.clone(), portion);
                remaining -= portion;
            }
        }

        let placed = amount - remaining;
        let result = OperationResult::with_payload(Reason::ItemsAdded, remaining);
        if !source.is_internal() {
            let ctx = AddItemContext {
                inventory: self,
                item,
                amount: placed,
            };
            if placed > 0 {
                if let Some(hooks) = &self.hooks {
                    hooks.on_added(ctx, &result);
                }
                item.definition.behavior.on_added(ctx, &result);
            } else {
                let failed = OperationResult::failure(Reason::NotEnoughSpace);
                if let Some(hooks) = &self.hooks {
                    hooks.on_add_failed(ctx, &failed);
                }
                item.definition.behavior.on_add_failed(ctx, &failed);
            }
        }
        if placed > 0 {
            log::debug!("added {}x {} ({} left over)", placed, item.id(), remaining);
        }
        result
    }

    /// Add what fits and hand the unplaced remainder to the drop sink
    ///
    /// The success payload is the amount that went to the sink.
    pub fn try_add_or_drop(
        &mut self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult<u32> {
        let result = self.try_add(item, amount, source);
        if result.is_failure() {
            return result;
        }
        let leftover = result.payload().copied().unwrap_or(0);
        if leftover > 0 {
            sink.spawn(item, leftover);
            let dropped = OperationResult::success(Reason::ItemsDropped);
            if !source.is_internal() {
                let ctx = DropItemContext {
                    inventory: Some(self),
                    item,
                    amount: leftover,
                };
                if let Some(hooks) = &self.hooks {
                    hooks.on_dropped(ctx, &dropped);
                }
                item.definition.behavior.on_dropped(ctx, &dropped);
            }
            log::debug!("overflow of {}x {} handed to drop sink", leftover, item.id());
        }
        result
    }

    /// Remove exactly `amount` compatible units, or nothing at all
    ///
    /// Scans in slot order to collect candidate slots, fails with
    /// `NotEnoughItems` before touching anything if the container comes up
    /// short, then deducts across the candidates, clearing each slot that
    /// reaches zero.
    pub fn try_take(
        &mut self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
    ) -> OperationResult<u32> {
        if amount == 0 {
            return self.reject_take(item, amount, source, Reason::InvalidAmount);
        }
        if !self.is_created() {
            return self.reject_take(item, amount, source, Reason::InventoryNotCreated);
        }
        if !source.is_internal() {
            let verdict = self.permit_take(TakeItemContext {
                inventory: self,
                item,
                amount,
            });
            if verdict.is_failure() {
                return self.reject_take(item, amount, source, verdict.reason());
            }
        }

        // Collect candidate slots until the request is covered
        let mut candidates = Vec::new();
        let mut available = 0u64;
        for (index, slot) in self.slots.iter().enumerate() {
            let compatible = slot
                .item()
                .map_or(false, |occupant| occupant.stack_compatible(item));
            if compatible {
                candidates.push(index);
                available += u64::from(slot.count());
                if available >= u64::from(amount) {
                    break;
                }
            }
        }
        if available < u64::from(amount) {
            return self.reject_take(item, amount, source, Reason::NotEnoughItems);
        }

        // Commit: deduct across the collected slots
        let mut remaining = amount;
        for index in candidates {
            remaining -= self.slots[index].deduct(remaining);
            if remaining == 0 {
                break;
            }
        }
        debug_assert_eq!(remaining, 0);

        let result = OperationResult::with_payload(Reason::ItemsTaken, 0);
        if !source.is_internal() {
            let ctx = TakeItemContext {
                inventory: self,
                item,
                amount,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_taken(ctx, &result);
            }
            item.definition.behavior.on_taken(ctx, &result);
        }
        log::debug!("took {}x {}", amount, item.id());
        result
    }

    /// Remove `amount` units from one specific slot
    pub fn take_at(
        &mut self,
        slot_index: usize,
        amount: u32,
        source: ActionSource,
    ) -> OperationResult<u32> {
        if !self.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        let Some(slot) = self.slots.get(slot_index) else {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        };
        let Some(occupant) = slot.item().cloned() else {
            return OperationResult::failure(Reason::SlotIsEmpty);
        };
        if amount == 0 {
            return self.reject_take(&occupant, amount, source, Reason::InvalidAmount);
        }
        if slot.count() < amount {
            return self.reject_take(&occupant, amount, source, Reason::NotEnoughItems);
        }
        if !source.is_internal() {
            let verdict = self.permit_take(TakeItemContext {
                inventory: self,
                item: &occupant,
                amount,
            });
            if verdict.is_failure() {
                return self.reject_take(&occupant, amount, source, verdict.reason());
            }
        }

        self.slots[slot_index].deduct(amount);

        let result = OperationResult::with_payload(Reason::ItemsTaken, 0);
        if !source.is_internal() {
            let ctx = TakeItemContext {
                inventory: self,
                item: &occupant,
                amount,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_taken(ctx, &result);
            }
            occupant.definition.behavior.on_taken(ctx, &result);
        }
        result
    }

    /// Take `amount` units and hand them to the drop sink
    pub fn drop_item(
        &mut self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        let take = self.try_take(item, amount, source);
        if take.is_failure() {
            return OperationResult::failure(take.reason());
        }
        sink.spawn(item, amount);

        let result = OperationResult::success(Reason::ItemsDropped);
        if !source.is_internal() {
            let ctx = DropItemContext {
                inventory: Some(self),
                item,
                amount,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_dropped(ctx, &result);
            }
            item.definition.behavior.on_dropped(ctx, &result);
        }
        log::debug!("dropped {}x {}", amount, item.id());
        result
    }

    /// Move the contents of one slot into a slot of another container
    ///
    /// For moves within a single container use [`transfer_within`]; both
    /// entry points share the same planning and commit logic.
    ///
    /// [`transfer_within`]: Inventory::transfer_within
    pub fn transfer_to(
        &mut self,
        source_slot: usize,
        target: &mut Inventory,
        target_slot: usize,
        flags: TransferFlags,
        source: ActionSource,
    ) -> OperationResult {
        if !self.is_created() || !target.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        if source_slot >= self.slots.len() || target_slot >= target.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }

        let moving = self.slots[source_slot].item().cloned();
        let displaced = target.slots[target_slot].item().cloned();
        let moving_count = self.slots[source_slot].count();

        let ctx = TransferItemContext {
            source: self,
            target,
            source_slot: Some(source_slot),
            target_slot: Some(target_slot),
            source_item: moving.as_ref(),
            target_item: displaced.as_ref(),
            amount: moving_count,
            flags,
            within_inventory: false,
        };

        if moving.is_none() {
            let result = OperationResult::failure(Reason::SlotIsEmpty);
            if !source.is_internal() {
                fire_transfer_events(ctx, &result);
            }
            return result;
        }
        if !source.is_internal() {
            let verdict = permit_transfer(ctx);
            if verdict.is_failure() {
                let result = OperationResult::failure(verdict.reason());
                fire_transfer_events(ctx, &result);
                return result;
            }
        }
        let plan = match plan_transfer(&self.slots[source_slot], &target.slots[target_slot], flags)
        {
            Ok(plan) => plan,
            Err(reason) => {
                let result = OperationResult::failure(reason);
                if !source.is_internal() {
                    fire_transfer_events(ctx, &result);
                }
                return result;
            }
        };

        apply_transfer(
            &mut self.slots[source_slot],
            &mut target.slots[target_slot],
            plan,
        );

        let moved = match plan {
            TransferPlan::Combine { amount } => amount,
            TransferPlan::Move | TransferPlan::Swap => moving_count,
        };
        let result = OperationResult::success(Reason::ItemsTransferred);
        if !source.is_internal() {
            let ctx = TransferItemContext {
                source: self,
                target,
                source_slot: Some(source_slot),
                target_slot: Some(target_slot),
                source_item: moving.as_ref(),
                target_item: displaced.as_ref(),
                amount: moved,
                flags,
                within_inventory: false,
            };
            fire_transfer_events(ctx, &result);
        }
        log::debug!(
            "transferred {} units from slot {} to foreign slot {}",
            moved,
            source_slot,
            target_slot
        );
        result
    }

    /// Move the contents of one slot onto another slot of this container
    ///
    /// Reordering and intra-inventory stacking both route through here; a
    /// same-slot transfer is a successful no-op.
    pub fn transfer_within(
        &mut self,
        source_slot: usize,
        target_slot: usize,
        flags: TransferFlags,
        source: ActionSource,
    ) -> OperationResult {
        if !self.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        if source_slot >= self.slots.len() || target_slot >= self.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }
        if source_slot == target_slot {
            return OperationResult::success(Reason::ItemsTransferred);
        }

        let moving = self.slots[source_slot].item().cloned();
        let displaced = self.slots[target_slot].item().cloned();
        let moving_count = self.slots[source_slot].count();

        let ctx = TransferItemContext {
            source: self,
            target: self,
            source_slot: Some(source_slot),
            target_slot: Some(target_slot),
            source_item: moving.as_ref(),
            target_item: displaced.as_ref(),
            amount: moving_count,
            flags,
            within_inventory: true,
        };

        if moving.is_none() {
            let result = OperationResult::failure(Reason::SlotIsEmpty);
            if !source.is_internal() {
                fire_transfer_events(ctx, &result);
            }
            return result;
        }
        if !source.is_internal() {
            let verdict = permit_transfer(ctx);
            if verdict.is_failure() {
                let result = OperationResult::failure(verdict.reason());
                fire_transfer_events(ctx, &result);
                return result;
            }
        }
        let plan = match plan_transfer(&self.slots[source_slot], &self.slots[target_slot], flags) {
            Ok(plan) => plan,
            Err(reason) => {
                let result = OperationResult::failure(reason);
                if !source.is_internal() {
                    fire_transfer_events(ctx, &result);
                }
                return result;
            }
        };

        // Split the slice to mutate both slots at once
        let pivot = source_slot.max(target_slot);
        let (head, tail) = self.slots.split_at_mut(pivot);
        let (src, dst) = if source_slot < target_slot {
            (&mut head[source_slot], &mut tail[0])
        } else {
            (&mut tail[0], &mut head[target_slot])
        };
        apply_transfer(src, dst, plan);

        let moved = match plan {
            TransferPlan::Combine { amount } => amount,
            TransferPlan::Move | TransferPlan::Swap => moving_count,
        };
        let result = OperationResult::success(Reason::ItemsTransferred);
        if !source.is_internal() {
            let ctx = TransferItemContext {
                source: self,
                target: self,
                source_slot: Some(source_slot),
                target_slot: Some(target_slot),
                source_item: moving.as_ref(),
                target_item: displaced.as_ref(),
                amount: moved,
                flags,
                within_inventory: true,
            };
            fire_transfer_events(ctx, &result);
        }
        log::debug!(
            "transferred {} units from slot {} to slot {}",
            moved,
            source_slot,
            target_slot
        );
        result
    }

    /// Move `amount` compatible units into another container, all or nothing
    ///
    /// Both sides are validated before either mutates; the take and add run
    /// as internal sub-operations and a single transfer event pair fires.
    pub fn transfer_items(
        &mut self,
        item: &ItemInstance,
        target: &mut Inventory,
        amount: u32,
        source: ActionSource,
    ) -> OperationResult {
        if amount == 0 {
            return OperationResult::failure(Reason::InvalidAmount);
        }
        if !self.is_created() || !target.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        if !self.has(item, amount) {
            let result = OperationResult::failure(Reason::NotEnoughItems);
            if !source.is_internal() {
                fire_transfer_events(self.bulk_ctx(target, item, amount), &result);
            }
            return result;
        }
        if !target.can_store(item, amount) {
            let result = OperationResult::failure(Reason::NotEnoughSpace);
            if !source.is_internal() {
                fire_transfer_events(self.bulk_ctx(target, item, amount), &result);
            }
            return result;
        }
        if !source.is_internal() {
            let take_verdict = self.permit_take(TakeItemContext {
                inventory: self,
                item,
                amount,
            });
            let add_verdict = target.permit_add(AddItemContext {
                inventory: target,
                item,
                amount,
            });
            let transfer_verdict = permit_transfer(self.bulk_ctx(target, item, amount));
            for verdict in [take_verdict, add_verdict, transfer_verdict] {
                if verdict.is_failure() {
                    let result = OperationResult::failure(verdict.reason());
                    fire_transfer_events(self.bulk_ctx(target, item, amount), &result);
                    return result;
                }
            }
        }

        let take = self.try_take(item, amount, ActionSource::Internal);
        debug_assert!(take.is_success());
        let add = target.try_add(item, amount, ActionSource::Internal);
        debug_assert_eq!(add.payload().copied(), Some(0));

        let result = OperationResult::success(Reason::ItemsTransferred);
        if !source.is_internal() {
            fire_transfer_events(self.bulk_ctx(target, item, amount), &result);
        }
        log::debug!("transferred {}x {} between containers", amount, item.id());
        result
    }

    /// Exchange two slot contents unchecked, for UI reordering
    ///
    /// No policy consultation and no events; out-of-range indices return
    /// false and change nothing.
    pub fn swap_slots(&mut self, a: usize, b: usize) -> bool {
        if a >= self.slots.len() || b >= self.slots.len() {
            return false;
        }
        if a != b {
            self.slots.swap(a, b);
        }
        true
    }

    /// Merge compatible partial stacks into the earliest slots
    pub fn compact(&mut self) {
        for i in 0..self.slots.len() {
            if self.slots[i].is_empty() {
                continue;
            }
            for j in (i + 1)..self.slots.len() {
                if self.slots[i].is_full() {
                    break;
                }
                let compatible = match (self.slots[i].item(), self.slots[j].item()) {
                    (Some(a), Some(b)) => a.stack_compatible(b),
                    _ => false,
                };
                if compatible {
                    let space = self.slots[i].space_left();
                    let moved = self.slots[j].deduct(space);
                    self.slots[i].fill(moved);
                }
            }
        }
    }

    /// Compact, then order stacks by item id with larger stacks first
    pub fn sort(&mut self) {
        self.compact();
        self.slots.sort_by(|a, b| match (a.item(), b.item()) {
            (Some(x), Some(y)) => x
                .id()
                .cmp(y.id())
                .then_with(|| b.count().cmp(&a.count())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    /// Use the item in one slot
    ///
    /// Runs the item's behavior effect on success. The item is not consumed;
    /// hosts that want consumption pair this with [`try_take`].
    ///
    /// [`try_take`]: Inventory::try_take
    pub fn use_at(&mut self, slot_index: usize, source: ActionSource) -> OperationResult {
        if !self.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        if slot_index >= self.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }
        let Some(item) = self.slots[slot_index].item().cloned() else {
            return OperationResult::failure(Reason::SlotIsEmpty);
        };

        let ctx = UseItemContext {
            inventory: self,
            slot_index,
            item: &item,
        };
        if !item.definition.usable {
            let result = OperationResult::failure(Reason::ItemNotUsable);
            if !source.is_internal() {
                self.fire_use_failed(ctx, &result);
            }
            return result;
        }
        if !source.is_internal() {
            let verdict = self.permit_use(ctx);
            if verdict.is_failure() {
                let result = OperationResult::failure(verdict.reason());
                self.fire_use_failed(ctx, &result);
                return result;
            }
        }

        let result = OperationResult::success(Reason::ItemUsed);
        item.definition.behavior.on_use(ctx, &result);
        if !source.is_internal() {
            if let Some(hooks) = &self.hooks {
                hooks.on_used(ctx, &result);
            }
        }
        log::debug!("used {} from slot {}", item.id(), slot_index);
        result
    }

    /// Use the first usable item matching the predicate
    pub fn use_any(
        &mut self,
        pred: impl Fn(&ItemInstance) -> bool,
        source: ActionSource,
    ) -> OperationResult {
        let found = self
            .find_first(|item| item.definition.usable && pred(item))
            .map(|(index, _)| index);
        match found {
            Some(index) => self.use_at(index, source),
            None => OperationResult::failure(Reason::ItemNotFound),
        }
    }

    /// Use the best-ranked usable item matching the predicate
    pub fn use_best(
        &mut self,
        pred: impl Fn(&ItemInstance) -> bool,
        source: ActionSource,
    ) -> OperationResult {
        let found = self
            .find_best(|item| item.definition.usable && pred(item))
            .map(|(index, _)| index);
        match found {
            Some(index) => self.use_at(index, source),
            None => OperationResult::failure(Reason::ItemNotFound),
        }
    }

    /// Equip the item in one slot into an equipment set
    pub fn equip_at(
        &mut self,
        slot_index: usize,
        equipment: &mut Equipment,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        if !self.is_created() {
            return OperationResult::failure(Reason::InventoryNotCreated);
        }
        if slot_index >= self.slots.len() {
            return OperationResult::failure(Reason::InvalidSlotIndex);
        }
        let Some(item) = self.slots[slot_index].item().cloned() else {
            return OperationResult::failure(Reason::SlotIsEmpty);
        };
        equipment.equip(&item, Some((self, slot_index)), flags, source, sink)
    }

    /// Equip the first equippable item matching the predicate
    pub fn equip_any(
        &mut self,
        pred: impl Fn(&ItemInstance) -> bool,
        equipment: &mut Equipment,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        let found = self
            .find_first(|item| item.definition.equippable && pred(item))
            .map(|(index, _)| index);
        match found {
            Some(index) => self.equip_at(index, equipment, flags, source, sink),
            None => OperationResult::failure(Reason::ItemNotFound),
        }
    }

    /// Equip the best-ranked equippable item matching the predicate
    pub fn equip_best(
        &mut self,
        pred: impl Fn(&ItemInstance) -> bool,
        equipment: &mut Equipment,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        let found = self
            .find_best(|item| item.definition.equippable && pred(item))
            .map(|(index, _)| index);
        match found {
            Some(index) => self.equip_at(index, equipment, flags, source, sink),
            None => OperationResult::failure(Reason::ItemNotFound),
        }
    }

    /// Unequip an item from an equipment set back into this container
    pub fn unequip(
        &mut self,
        item: &ItemInstance,
        equipment: &mut Equipment,
        flags: EquipFlags,
        source: ActionSource,
        sink: &mut dyn DropSink,
    ) -> OperationResult {
        equipment.unequip(item, Some(self), flags, source, sink)
    }

    pub(crate) fn put_slot(&mut self, index: usize, item: ItemInstance, count: u32) {
        self.slots[index].put(item, count);
    }

    fn bulk_ctx<'a>(
        &'a self,
        target: &'a Inventory,
        item: &'a ItemInstance,
        amount: u32,
    ) -> TransferItemContext<'a> {
        TransferItemContext {
            source: self,
            target,
            source_slot: None,
            target_slot: None,
            source_item: Some(item),
            target_item: None,
            amount,
            flags: TransferFlags::NONE,
            within_inventory: false,
        }
    }

    fn permit_add(&self, ctx: AddItemContext<'_>) -> OperationResult {
        if let Some(hooks) = &self.hooks {
            let verdict = hooks.can_add(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
        ctx.item.definition.behavior.can_add(ctx)
    }

    fn permit_take(&self, ctx: TakeItemContext<'_>) -> OperationResult {
        if let Some(hooks) = &self.hooks {
            let verdict = hooks.can_take(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
        ctx.item.definition.behavior.can_take(ctx)
    }

    fn permit_use(&self, ctx: UseItemContext<'_>) -> OperationResult {
        if let Some(hooks) = &self.hooks {
            let verdict = hooks.can_use(ctx);
            if verdict.is_failure() {
                return verdict;
            }
        }
        ctx.item.definition.behavior.can_use(ctx)
    }

    fn reject_add(
        &self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
        reason: Reason,
    ) -> OperationResult<u32> {
        let result = OperationResult::failure(reason);
        if !source.is_internal() {
            let ctx = AddItemContext {
                inventory: self,
                item,
                amount,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_add_failed(ctx, &result);
            }
            item.definition.behavior.on_add_failed(ctx, &result);
        }
        result
    }

    fn reject_take(
        &self,
        item: &ItemInstance,
        amount: u32,
        source: ActionSource,
        reason: Reason,
    ) -> OperationResult<u32> {
        let result = OperationResult::failure(reason);
        if !source.is_internal() {
            let ctx = TakeItemContext {
                inventory: self,
                item,
                amount,
            };
            if let Some(hooks) = &self.hooks {
                hooks.on_take_failed(ctx, &result);
            }
            item.definition.behavior.on_take_failed(ctx, &result);
        }
        result
    }

    fn fire_use_failed(&self, ctx: UseItemContext<'_>, result: &OperationResult) {
        if let Some(hooks) = &self.hooks {
            hooks.on_use_failed(ctx, result);
        }
        ctx.item.definition.behavior.on_use_failed(ctx, result);
    }
}

impl fmt::Debug for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inventory")
            .field("size", &self.slots.len())
            .field("occupied", &self.items().count())
            .finish()
    }
}
