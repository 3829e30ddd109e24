//! Operation results with domain-scoped reason codes

use core::fmt;

/// Subsystem a reason code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Cross-cutting outcomes (policy verdicts)
    General,
    /// Container storage operations
    Inventory,
    /// Equipment slot operations
    Equipment,
    /// Item usage operations
    Usage,
}

/// Where an action originated from
///
/// External actions consult policy hooks and fire event hooks. Internal
/// actions are sub-operations of an already-permitted action (evicting an
/// equipment occupant, removing an item after an equip): they skip the hooks
/// but perform the identical mutation and return the identical result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActionSource {
    /// Caller-visible operation
    #[default]
    External,
    /// Hook-suppressed sub-operation
    Internal,
}

impl ActionSource {
    /// True for hook-suppressed sub-operations
    #[inline]
    pub fn is_internal(self) -> bool {
        matches!(self, ActionSource::Internal)
    }
}

/// Why an operation succeeded or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    // Successes
    /// A policy check permitted the action
    Permitted,
    /// Items were added to a container
    ItemsAdded,
    /// Items were taken from a container
    ItemsTaken,
    /// Items were transferred between slots
    ItemsTransferred,
    /// Items were handed to the drop collaborator
    ItemsDropped,
    /// Items were picked up from the world
    ItemsPickedUp,
    /// An item was used
    ItemUsed,
    /// An item was equipped
    Equipped,
    /// An item was unequipped
    Unequipped,

    // Failures
    /// Amount was zero or otherwise meaningless
    InvalidAmount,
    /// Slot index outside the container
    InvalidSlotIndex,
    /// Addressed slot holds nothing
    SlotIsEmpty,
    /// No matching item in the container
    ItemNotFound,
    /// Item definition lacks the equippable capability
    ItemNotEquippable,
    /// Item definition lacks the usable capability
    ItemNotUsable,
    /// Container cannot absorb the requested amount
    NotEnoughSpace,
    /// Container holds fewer items than requested
    NotEnoughItems,
    /// A policy hook vetoed the action
    NotAllowed,
    /// Item is already present in the equipment set
    AlreadyEquipped,
    /// Item is not present in the equipment set
    NotEquipped,
    /// No equipment slot accepts the item
    NoFreeSlots,
    /// The container has no slots to operate on
    InventoryNotCreated,
}

impl Reason {
    /// Whether this reason reports a successful outcome
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Reason::Permitted
                | Reason::ItemsAdded
                | Reason::ItemsTaken
                | Reason::ItemsTransferred
                | Reason::ItemsDropped
                | Reason::ItemsPickedUp
                | Reason::ItemUsed
                | Reason::Equipped
                | Reason::Unequipped
        )
    }

    /// The subsystem this reason belongs to
    pub const fn domain(self) -> Domain {
        match self {
            Reason::Permitted | Reason::NotAllowed => Domain::General,

            Reason::ItemsAdded
            | Reason::ItemsTaken
            | Reason::ItemsTransferred
            | Reason::ItemsDropped
            | Reason::ItemsPickedUp
            | Reason::InvalidAmount
            | Reason::InvalidSlotIndex
            | Reason::SlotIsEmpty
            | Reason::ItemNotFound
            | Reason::NotEnoughSpace
            | Reason::NotEnoughItems
            | Reason::InventoryNotCreated => Domain::Inventory,

            Reason::Equipped
            | Reason::Unequipped
            | Reason::ItemNotEquippable
            | Reason::AlreadyEquipped
            | Reason::NotEquipped
            | Reason::NoFreeSlots => Domain::Equipment,

            Reason::ItemUsed | Reason::ItemNotUsable => Domain::Usage,
        }
    }

    /// Stable numeric code within the reason's domain
    ///
    /// Successes occupy 0..10, failures 10 and up.
    pub const fn code(self) -> u16 {
        match self {
            Reason::Permitted => 0,
            Reason::NotAllowed => 10,

            Reason::ItemsAdded => 0,
            Reason::ItemsTaken => 1,
            Reason::ItemsTransferred => 2,
            Reason::ItemsDropped => 3,
            Reason::ItemsPickedUp => 4,
            Reason::InvalidAmount => 10,
            Reason::InvalidSlotIndex => 11,
            Reason::SlotIsEmpty => 12,
            Reason::ItemNotFound => 13,
            Reason::NotEnoughSpace => 14,
            Reason::NotEnoughItems => 15,
            Reason::InventoryNotCreated => 16,

            Reason::Equipped => 0,
            Reason::Unequipped => 1,
            Reason::ItemNotEquippable => 10,
            Reason::AlreadyEquipped => 11,
            Reason::NotEquipped => 12,
            Reason::NoFreeSlots => 13,

            Reason::ItemUsed => 0,
            Reason::ItemNotUsable => 10,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Permitted => "permitted",
            Reason::ItemsAdded => "items added",
            Reason::ItemsTaken => "items taken",
            Reason::ItemsTransferred => "items transferred",
            Reason::ItemsDropped => "items dropped",
            Reason::ItemsPickedUp => "items picked up",
            Reason::ItemUsed => "item used",
            Reason::Equipped => "equipped",
            Reason::Unequipped => "unequipped",
            Reason::InvalidAmount => "invalid amount",
            Reason::InvalidSlotIndex => "invalid slot index",
            Reason::SlotIsEmpty => "slot is empty",
            Reason::ItemNotFound => "item not found",
            Reason::ItemNotEquippable => "item is not equippable",
            Reason::ItemNotUsable => "item is not usable",
            Reason::NotEnoughSpace => "not enough space",
            Reason::NotEnoughItems => "not enough items",
            Reason::NotAllowed => "not allowed",
            Reason::AlreadyEquipped => "already equipped",
            Reason::NotEquipped => "not equipped",
            Reason::NoFreeSlots => "no free slots",
            Reason::InventoryNotCreated => "inventory not created",
        };
        f.write_str(text)
    }
}

/// Tagged success/failure value returned by every mutating operation
///
/// An optional payload carries operation-specific data such as the unplaced
/// remainder of an add. Failures never carry a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult<T = ()> {
    reason: Reason,
    payload: Option<T>,
}

impl<T> OperationResult<T> {
    /// Successful outcome without payload
    pub fn success(reason: Reason) -> Self {
        debug_assert!(reason.is_success());
        Self {
            reason,
            payload: None,
        }
    }

    /// Successful outcome carrying a payload
    pub fn with_payload(reason: Reason, payload: T) -> Self {
        debug_assert!(reason.is_success());
        Self {
            reason,
            payload: Some(payload),
        }
    }

    /// Failed outcome
    pub fn failure(reason: Reason) -> Self {
        debug_assert!(!reason.is_success());
        Self {
            reason,
            payload: None,
        }
    }

    /// Whether the operation succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        self.reason.is_success()
    }

    /// Whether the operation failed
    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.reason.is_success()
    }

    /// The reason behind the outcome
    #[inline]
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Borrow the payload, if any
    #[inline]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consume the result, yielding the payload
    #[inline]
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<T> fmt::Display for OperationResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            write!(f, "ok: {}", self.reason)
        } else {
            write!(f, "failed: {}", self.reason)
        }
    }
}
