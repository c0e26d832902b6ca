//! Domain event abstractions.
//!
//! Events are the persistence unit of the stock ledger: every stock change
//! and alert transition is an immutable, append-only fact. This crate holds
//! the transport-agnostic pieces (event trait, envelope, bus); storage lives
//! in `fleetstock-infra`.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
