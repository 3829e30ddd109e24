//! Storage cells and their stacking arithmetic

use crate::item::ItemInstance;

/// One storage cell: an optional occupant and its count
///
/// Invariant: `count == 0` exactly when the slot is empty, and `count` never
/// exceeds the occupant's max stack size. All mutation goes through the
/// container algorithms; external code only reads.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    item: Option<ItemInstance>,
    count: u32,
}

impl Slot {
    /// An empty slot
    pub fn empty() -> Self {
        Self::default()
    }

    /// The occupant, if any
    #[inline]
    pub fn item(&self) -> Option<&ItemInstance> {
        self.item.as_ref()
    }

    /// Units stored in this slot
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the slot holds nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    /// Whether the occupant's stack is at capacity
    pub fn is_full(&self) -> bool {
        match &self.item {
            Some(item) => self.count >= item.max_stack(),
            None => false,
        }
    }

    /// Remaining capacity of the current stack (0 for an empty slot)
    pub fn space_left(&self) -> u32 {
        match &self.item {
            Some(item) => item.max_stack().saturating_sub(self.count),
            None => 0,
        }
    }

    /// Space this slot offers to a candidate item
    ///
    /// An empty slot offers the candidate's full stack size, a compatible
    /// occupant its remaining space, an incompatible occupant nothing.
    pub fn space_for(&self, candidate: &ItemInstance) -> u32 {
        match &self.item {
            None => candidate.max_stack(),
            Some(occupant) if occupant.stack_compatible(candidate) => self.space_left(),
            Some(_) => 0,
        }
    }

    /// Place an item into an empty slot
    pub(crate) fn put(&mut self, item: ItemInstance, count: u32) {
        debug_assert!(self.item.is_none());
        debug_assert!(count >= 1 && count <= item.max_stack());
        self.item = Some(item);
        self.count = count;
    }

    /// Absorb up to `amount` units into the current stack, returning the
    /// amount actually absorbed
    pub(crate) fn fill(&mut self, amount: u32) -> u32 {
        let absorbed = amount.min(self.space_left());
        self.count += absorbed;
        absorbed
    }

    /// Remove up to `amount` units, returning the amount actually removed
    ///
    /// Clears the slot the moment its count reaches zero.
    pub(crate) fn deduct(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.count);
        self.count -= removed;
        if self.count == 0 {
            self.item = None;
        }
        removed
    }

    /// Empty the slot, returning its previous contents
    pub(crate) fn clear(&mut self) -> Option<(ItemInstance, u32)> {
        let count = std::mem::take(&mut self.count);
        self.item.take().map(|item| (item, count))
    }

    /// Exchange the contents of two slots
    pub(crate) fn swap(a: &mut Slot, b: &mut Slot) {
        std::mem::swap(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemDefinition;
    use std::sync::Arc;

    fn arrows() -> ItemInstance {
        ItemInstance::new(Arc::new(ItemDefinition::new("arrow", "Arrow").with_max_stack(20)))
    }

    #[test]
    fn test_fill_caps_at_max_stack() {
        let mut slot = Slot::empty();
        slot.put(arrows(), 15);

        assert_eq!(slot.fill(10), 5);
        assert_eq!(slot.count(), 20);
        assert!(slot.is_full());
        assert_eq!(slot.space_left(), 0);
    }

    #[test]
    fn test_deduct_clears_at_zero() {
        let mut slot = Slot::empty();
        slot.put(arrows(), 3);

        assert_eq!(slot.deduct(2), 2);
        assert!(!slot.is_empty());
        assert_eq!(slot.deduct(5), 1);
        assert!(slot.is_empty());
        assert_eq!(slot.count(), 0);
    }

    #[test]
    fn test_space_for_candidate() {
        let mut slot = Slot::empty();
        let item = arrows();
        assert_eq!(slot.space_for(&item), 20);

        slot.put(item.clone(), 12);
        assert_eq!(slot.space_for(&item), 8);

        let other = ItemInstance::new(Arc::new(ItemDefinition::new("rock", "Rock")));
        assert_eq!(slot.space_for(&other), 0);
    }

    #[test]
    fn test_swap() {
        let mut a = Slot::empty();
        let mut b = Slot::empty();
        a.put(arrows(), 7);

        Slot::swap(&mut a, &mut b);
        assert!(a.is_empty());
        assert_eq!(b.count(), 7);
    }
}
