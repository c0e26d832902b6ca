//! Alert queue projection.
//!
//! The review queue: one row per financial alert, kept current as reviewers
//! acknowledge, resolve, or dismiss. Listing orders by severity (highest
//! first) then recency so the worst findings surface first.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use fleetstock_alerts::alert::{AlertEvent, AlertId, AlertStatus, SourceType};
use fleetstock_alerts::watchdog::Severity;
use fleetstock_catalog::MasterPartId;
use fleetstock_core::{TenantId, UserId};
use fleetstock_events::EventEnvelope;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::projections::{ProjectionError, StreamCursors};
use crate::read_model::TenantStore;

pub(crate) const ALERT_AGGREGATE: &str = "alerts.alert";

/// Read model: one financial alert with its current review state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRecord {
    pub alert_id: AlertId,
    pub master_part_id: MasterPartId,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub proposed_price: Decimal,
    pub baseline_price: Decimal,
    pub deviation_pct: Decimal,
    pub severity: Severity,
    pub description: String,
    pub status: AlertStatus,
    pub raised_at: DateTime<Utc>,
    pub reviewed_by: Option<UserId>,
    pub resolution_note: Option<String>,
}

/// Projection over `alerts.alert` streams.
#[derive(Debug)]
pub struct AlertQueueProjection<S>
where
    S: TenantStore<AlertId, AlertRecord>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> AlertQueueProjection<S>
where
    S: TenantStore<AlertId, AlertRecord>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, tenant_id: TenantId, alert_id: &AlertId) -> Option<AlertRecord> {
        self.store.get(tenant_id, alert_id)
    }

    /// List alerts, optionally filtered by status, worst-first.
    pub fn list(&self, tenant_id: TenantId, status: Option<AlertStatus>) -> Vec<AlertRecord> {
        let mut alerts: Vec<_> = self
            .store
            .list(tenant_id)
            .into_iter()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.raised_at.cmp(&a.raised_at))
        });
        alerts
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != ALERT_AGGREGATE {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        if !self.cursors.admit(tenant_id, aggregate_id, seq)? {
            return Ok(());
        }

        let ev: AlertEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let (event_tenant, alert_id) = match &ev {
            AlertEvent::AlertRaised(e) => (e.tenant_id, e.alert_id),
            AlertEvent::AlertAcknowledged(e) => (e.tenant_id, e.alert_id),
            AlertEvent::AlertResolved(e) => (e.tenant_id, e.alert_id),
            AlertEvent::AlertDismissed(e) => (e.tenant_id, e.alert_id),
        };

        if event_tenant != tenant_id {
            return Err(ProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if alert_id.0 != aggregate_id {
            return Err(ProjectionError::TenantIsolation(
                "event alert_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            AlertEvent::AlertRaised(e) => {
                self.store.upsert(
                    tenant_id,
                    alert_id,
                    AlertRecord {
                        alert_id,
                        master_part_id: e.master_part_id,
                        source_type: e.source_type,
                        source_id: e.source_id,
                        proposed_price: e.proposed_price,
                        baseline_price: e.baseline_price,
                        deviation_pct: e.deviation_pct,
                        severity: e.severity,
                        description: e.description,
                        status: AlertStatus::Pending,
                        raised_at: e.occurred_at,
                        reviewed_by: None,
                        resolution_note: None,
                    },
                );
            }
            AlertEvent::AlertAcknowledged(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &alert_id) {
                    record.status = AlertStatus::Acknowledged;
                    record.reviewed_by = Some(e.reviewed_by);
                    self.store.upsert(tenant_id, alert_id, record);
                }
            }
            AlertEvent::AlertResolved(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &alert_id) {
                    record.status = AlertStatus::Resolved;
                    record.reviewed_by = Some(e.reviewed_by);
                    record.resolution_note = e.resolution_note;
                    self.store.upsert(tenant_id, alert_id, record);
                }
            }
            AlertEvent::AlertDismissed(e) => {
                if let Some(mut record) = self.store.get(tenant_id, &alert_id) {
                    record.status = AlertStatus::Dismissed;
                    record.reviewed_by = Some(e.reviewed_by);
                    record.resolution_note = e.resolution_note;
                    self.store.upsert(tenant_id, alert_id, record);
                }
            }
        }

        self.cursors.advance(tenant_id, aggregate_id, seq);
        Ok(())
    }
}
