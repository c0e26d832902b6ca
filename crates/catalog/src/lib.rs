//! Master-part catalog domain module (event-sourced).
//!
//! Catalog entries carry the reference price the price watchdog checks
//! incoming costs against. Pure domain logic only (no IO, no storage).

pub mod part;

pub use part::{
    CatalogCommand, CatalogEvent, CreateMasterPart, MasterPart, MasterPartCreated, MasterPartId,
    ReferencePriceSet, SetReferencePrice,
};
