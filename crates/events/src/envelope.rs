use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetstock_core::{AggregateId, TenantId};

/// A committed event plus the stream metadata consumers need to route it.
///
/// This is what the store hands to the bus and the bus hands to projections.
/// `tenant_id` scopes the event, `(aggregate_id, sequence_number)` locates it
/// in its stream, and `aggregate_type` tells a projection whether the payload
/// is a ledger movement, a catalog change, or an alert transition. The
/// payload type is generic; in this workspace it is raw JSON, decoded by the
/// consumer that recognizes the event type.
///
/// Serialized with the same camelCase convention as the payloads, so an
/// envelope written to an external feed keeps one wire style throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: String,
    /// Gapless, 1-based position within the `(tenant_id, aggregate_id)`
    /// stream. Projections use it to skip duplicates and detect gaps.
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_camel_case() {
        let envelope = EventEnvelope::new(
            Uuid::nil(),
            TenantId::new(),
            AggregateId::new(),
            "ledger.item",
            3,
            serde_json::json!({"movementType": "RECEIPT"}),
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["aggregateType"], "ledger.item");
        assert_eq!(json["sequenceNumber"], 3);
        assert_eq!(json["payload"]["movementType"], "RECEIPT");
    }
}
