//! Read-model projections.
//!
//! Each projection consumes committed event envelopes and maintains a
//! tenant-isolated read model. Projections are idempotent: a per-stream
//! cursor drops duplicate deliveries (the bus is at-least-once), and every
//! model can be rebuilt from scratch by replaying the store.

mod alert_queue;
mod inventory_balances;
mod master_parts;

pub use alert_queue::{AlertQueueProjection, AlertRecord};
pub use inventory_balances::{InventoryBalance, InventoryBalancesProjection};
pub use master_parts::{MasterPartRecord, MasterPartsProjection};

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use fleetstock_core::{AggregateId, TenantId};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("sequence gap in stream (last={last}, found={found})")]
    SequenceGap { last: u64, found: u64 },
}

/// Per-stream cursor tracking for idempotent envelope application.
#[derive(Debug, Default)]
pub(crate) struct StreamCursors {
    inner: RwLock<HashMap<(TenantId, AggregateId), u64>>,
}

impl StreamCursors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decide whether an envelope at `seq` should be applied.
    ///
    /// Returns `Ok(false)` for duplicates (at or behind the cursor) and an
    /// error on a gap. The first observed sequence for a stream is accepted
    /// as-is so a projection can attach mid-stream.
    pub(crate) fn admit(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        seq: u64,
    ) -> Result<bool, ProjectionError> {
        let last = match self.inner.read() {
            Ok(map) => *map.get(&(tenant_id, aggregate_id)).unwrap_or(&0),
            Err(_) => 0,
        };

        if seq == 0 {
            return Err(ProjectionError::SequenceGap { last, found: seq });
        }
        if seq <= last {
            return Ok(false);
        }
        if last != 0 && seq != last + 1 {
            return Err(ProjectionError::SequenceGap { last, found: seq });
        }
        Ok(true)
    }

    pub(crate) fn advance(&self, tenant_id: TenantId, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((tenant_id, aggregate_id), seq);
        }
    }

    pub(crate) fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(t, _), _| *t != tenant_id);
        }
    }
}
