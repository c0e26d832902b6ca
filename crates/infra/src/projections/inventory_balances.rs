//! Inventory balances projection.
//!
//! One row per inventory item: quantity on hand, weighted-average cost, and
//! the total value of the stock at that average. This is the read model
//! behind balance listings and valuation reporting; the authoritative figures
//! always live in the movement stream.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use fleetstock_catalog::MasterPartId;
use fleetstock_core::TenantId;
use fleetstock_core::money::round_minor;
use fleetstock_events::EventEnvelope;
use fleetstock_ledger::{InventoryItemId, ItemStatus, LedgerEvent};
use rust_decimal::Decimal;

use crate::projections::{ProjectionError, StreamCursors};
use crate::read_model::TenantStore;

pub(crate) const LEDGER_ITEM_AGGREGATE: &str = "ledger.item";

/// Read model: current stock position of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryBalance {
    pub item_id: InventoryItemId,
    pub master_part_id: MasterPartId,
    pub quantity_on_hand: Decimal,
    /// Full-precision running average.
    pub average_unit_cost: Decimal,
    /// `quantity_on_hand * average_unit_cost`, rounded to the minor unit.
    pub total_value: Decimal,
    pub status: ItemStatus,
    pub last_movement_at: DateTime<Utc>,
}

/// Projection over `ledger.item` streams.
#[derive(Debug)]
pub struct InventoryBalancesProjection<S>
where
    S: TenantStore<InventoryItemId, InventoryBalance>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> InventoryBalancesProjection<S>
where
    S: TenantStore<InventoryItemId, InventoryBalance>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, tenant_id: TenantId, item_id: &InventoryItemId) -> Option<InventoryBalance> {
        self.store.get(tenant_id, item_id)
    }

    /// All balances for a tenant, highest total value first.
    pub fn list(&self, tenant_id: TenantId) -> Vec<InventoryBalance> {
        let mut balances = self.store.list(tenant_id);
        balances.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        balances
    }

    /// Sum of `total_value` across all active items of a tenant.
    pub fn total_stock_value(&self, tenant_id: TenantId) -> Decimal {
        self.store
            .list(tenant_id)
            .iter()
            .filter(|b| b.status == ItemStatus::Active)
            .map(|b| b.total_value)
            .sum()
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != LEDGER_ITEM_AGGREGATE {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        if !self.cursors.admit(tenant_id, aggregate_id, seq)? {
            return Ok(());
        }

        let ev: LedgerEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let (event_tenant, item_id) = match &ev {
            LedgerEvent::MovementRecorded(m) => (m.tenant_id, m.inventory_item_id),
            LedgerEvent::ItemDeactivated(e) => (e.tenant_id, e.item_id),
            LedgerEvent::ItemReactivated(e) => (e.tenant_id, e.item_id),
        };

        if event_tenant != tenant_id {
            return Err(ProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if item_id.0 != aggregate_id {
            return Err(ProjectionError::TenantIsolation(
                "event item_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            LedgerEvent::MovementRecorded(m) => {
                let status = self
                    .store
                    .get(tenant_id, &item_id)
                    .map(|b| b.status)
                    .unwrap_or(ItemStatus::Active);
                self.store.upsert(
                    tenant_id,
                    item_id,
                    InventoryBalance {
                        item_id,
                        master_part_id: m.master_part_id,
                        quantity_on_hand: m.new_stock,
                        average_unit_cost: m.new_avg_cost,
                        total_value: round_minor(m.new_stock * m.new_avg_cost),
                        status,
                        last_movement_at: m.timestamp,
                    },
                );
            }
            LedgerEvent::ItemDeactivated(_) => {
                if let Some(mut balance) = self.store.get(tenant_id, &item_id) {
                    balance.status = ItemStatus::Inactive;
                    self.store.upsert(tenant_id, item_id, balance);
                }
            }
            LedgerEvent::ItemReactivated(_) => {
                if let Some(mut balance) = self.store.get(tenant_id, &item_id) {
                    balance.status = ItemStatus::Active;
                    self.store.upsert(tenant_id, item_id, balance);
                }
            }
        }

        self.cursors.advance(tenant_id, aggregate_id, seq);
        Ok(())
    }

    /// Drop and rebuild the model for every tenant present in `envelopes`.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        let mut tenants: Vec<_> = envs.iter().map(|e| e.tenant_id()).collect();
        tenants.sort_by_key(|t| *t.as_uuid().as_bytes());
        tenants.dedup();
        for t in tenants {
            self.store.clear_tenant(t);
            self.cursors.clear_tenant(t);
        }

        envs.sort_by_key(|e| {
            (
                *e.tenant_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetstock_core::{AggregateId, UserId};
    use fleetstock_ledger::{InventoryMovement, MovementReference, MovementType, ReferenceType};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use uuid::Uuid;

    fn movement_envelope(
        tenant_id: TenantId,
        item_id: InventoryItemId,
        seq: u64,
        new_stock: Decimal,
        new_avg_cost: Decimal,
    ) -> EventEnvelope<JsonValue> {
        let movement = InventoryMovement {
            id: Uuid::now_v7(),
            tenant_id,
            inventory_item_id: item_id,
            master_part_id: MasterPartId::new(AggregateId::new()),
            movement_type: MovementType::Receipt,
            quantity: new_stock,
            unit_cost: new_avg_cost,
            total_cost: round_minor(new_stock * new_avg_cost),
            previous_stock: dec!(0),
            new_stock,
            previous_avg_cost: dec!(0),
            new_avg_cost,
            reference: MovementReference::new(ReferenceType::PurchaseOrder, Uuid::now_v7()),
            reason: None,
            performed_by: UserId::new(),
            timestamp: Utc::now(),
        };
        EventEnvelope::new(
            Uuid::now_v7(),
            tenant_id,
            item_id.0,
            LEDGER_ITEM_AGGREGATE,
            seq,
            serde_json::to_value(LedgerEvent::MovementRecorded(movement)).unwrap(),
        )
    }

    #[test]
    fn tracks_stock_and_value_from_movements() {
        let store = Arc::new(InMemoryStore::new());
        let proj = InventoryBalancesProjection::new(store);

        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        proj.apply_envelope(&movement_envelope(tenant_id, item_id, 1, dec!(15), dec!(110)))
            .unwrap();

        let balance = proj.get(tenant_id, &item_id).unwrap();
        assert_eq!(balance.quantity_on_hand, dec!(15));
        assert_eq!(balance.average_unit_cost, dec!(110));
        assert_eq!(balance.total_value, dec!(1650.00));
    }

    #[test]
    fn duplicate_deliveries_are_dropped() {
        let store = Arc::new(InMemoryStore::new());
        let proj = InventoryBalancesProjection::new(store);

        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        let env = movement_envelope(tenant_id, item_id, 1, dec!(10), dec!(100));
        proj.apply_envelope(&env).unwrap();
        proj.apply_envelope(&env).unwrap();
        let stale = movement_envelope(tenant_id, item_id, 1, dec!(99), dec!(1));
        proj.apply_envelope(&stale).unwrap();

        let balance = proj.get(tenant_id, &item_id).unwrap();
        assert_eq!(balance.quantity_on_hand, dec!(10));
    }

    #[test]
    fn sequence_gaps_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let proj = InventoryBalancesProjection::new(store);

        let tenant_id = TenantId::new();
        let item_id = InventoryItemId::new(AggregateId::new());

        proj.apply_envelope(&movement_envelope(tenant_id, item_id, 1, dec!(10), dec!(100)))
            .unwrap();
        let err = proj
            .apply_envelope(&movement_envelope(tenant_id, item_id, 3, dec!(12), dec!(100)))
            .unwrap_err();
        assert!(matches!(err, ProjectionError::SequenceGap { last: 1, found: 3 }));
    }

    type InMemoryStore = crate::read_model::InMemoryTenantStore<InventoryItemId, InventoryBalance>;
}
