//! Stock ledger domain module (event-sourced).
//!
//! Owns the quantity on hand and weighted-average unit cost of each
//! (tenant, part) pair. Every stock change is an immutable
//! [`InventoryMovement`] appended to the item's stream; item state is only
//! ever derived from movements, never written directly. Pure domain logic
//! (no IO, no storage).

pub mod costing;
pub mod item;
pub mod movement;

pub use costing::CostingOutcome;
pub use item::{
    DeactivateItem, InventoryItem, InventoryItemId, ItemDeactivated, ItemReactivated, ItemStatus,
    LedgerCommand, LedgerEvent, ReactivateItem, RecordAdjustment, RecordConsumption, RecordReceipt,
};
pub use movement::{InventoryMovement, MovementReference, MovementType, ReferenceType};
