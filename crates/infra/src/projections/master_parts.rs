//! Master parts projection.
//!
//! Catalog lookup for listings and for the price watchdog's preferred
//! baseline (`reference_price`).

use serde_json::Value as JsonValue;

use fleetstock_catalog::{CatalogEvent, MasterPartId};
use fleetstock_core::TenantId;
use fleetstock_events::EventEnvelope;
use rust_decimal::Decimal;

use crate::projections::{ProjectionError, StreamCursors};
use crate::read_model::TenantStore;

pub(crate) const CATALOG_PART_AGGREGATE: &str = "catalog.part";

/// Read model: one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPartRecord {
    pub part_id: MasterPartId,
    pub part_number: String,
    pub name: String,
    pub category: Option<String>,
    pub reference_price: Option<Decimal>,
}

/// Projection over `catalog.part` streams.
#[derive(Debug)]
pub struct MasterPartsProjection<S>
where
    S: TenantStore<MasterPartId, MasterPartRecord>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> MasterPartsProjection<S>
where
    S: TenantStore<MasterPartId, MasterPartRecord>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, tenant_id: TenantId, part_id: &MasterPartId) -> Option<MasterPartRecord> {
        self.store.get(tenant_id, part_id)
    }

    /// All parts for a tenant, sorted by part number.
    pub fn list(&self, tenant_id: TenantId) -> Vec<MasterPartRecord> {
        let mut parts = self.store.list(tenant_id);
        parts.sort_by(|a, b| a.part_number.cmp(&b.part_number));
        parts
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != CATALOG_PART_AGGREGATE {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        if !self.cursors.admit(tenant_id, aggregate_id, seq)? {
            return Ok(());
        }

        let ev: CatalogEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let (event_tenant, part_id) = match &ev {
            CatalogEvent::MasterPartCreated(e) => (e.tenant_id, e.part_id),
            CatalogEvent::ReferencePriceSet(e) => (e.tenant_id, e.part_id),
        };

        if event_tenant != tenant_id {
            return Err(ProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if part_id.0 != aggregate_id {
            return Err(ProjectionError::TenantIsolation(
                "event part_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            CatalogEvent::MasterPartCreated(e) => {
                self.store.upsert(
                    tenant_id,
                    part_id,
                    MasterPartRecord {
                        part_id,
                        part_number: e.part_number,
                        name: e.name,
                        category: e.category,
                        reference_price: e.reference_price,
                    },
                );
            }
            CatalogEvent::ReferencePriceSet(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &part_id) {
                    record.reference_price = e.reference_price;
                    self.store.upsert(tenant_id, part_id, record);
                }
            }
        }

        self.cursors.advance(tenant_id, aggregate_id, seq);
        Ok(())
    }
}
