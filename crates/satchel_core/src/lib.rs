//! # satchel_core - Satchel Engine Core
//!
//! Zero-dependency foundation for the satchel inventory engine:
//! - **Item identifiers**: interned names with precomputed hashes
//! - **Operation results**: domain-scoped reason codes for every mutating call
//! - **Action sources**: the internal/external marker that gates hook firing
//!
//! Everything here is value-like and allocation-light so the engine can be
//! embedded in hosts that forbid `std`.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod id;
pub mod operation;

pub use id::*;
pub use operation::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::ItemId;
    pub use crate::operation::{ActionSource, Domain, OperationResult, Reason};
}
