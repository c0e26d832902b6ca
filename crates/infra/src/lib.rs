//! Infrastructure composition for the stock ledger.
//!
//! Hosts the append-only event store, the command dispatch pipeline, the
//! read-model projections, and the application-facing [`StockLedgerService`]
//! that ties the catalog, ledger, and alert domains together. Everything here
//! is backend-agnostic: the in-memory implementations serve tests and dev,
//! and real backends slot in behind the same traits.

pub mod command_dispatcher;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod services;


pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use read_model::{InMemoryTenantStore, TenantStore};
pub use services::{
    AvailabilityCheck, MovementHistoryPage, ReceiptOutcome, ServiceError, StockLedgerService,
};
