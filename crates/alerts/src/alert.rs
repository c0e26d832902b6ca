use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetstock_catalog::MasterPartId;
use fleetstock_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, UserId};
use fleetstock_events::Event;

use crate::watchdog::Severity;

/// Financial alert identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub AggregateId);

impl AlertId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AlertId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Review lifecycle of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Pending,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    /// Allowed transitions. Pending alerts can be picked up or thrown out;
    /// acknowledged alerts can be closed either way; Resolved and Dismissed
    /// are terminal.
    fn can_transition_to(self, next: AlertStatus) -> bool {
        use AlertStatus::*;
        matches!(
            (self, next),
            (Pending, Acknowledged) | (Pending, Dismissed) | (Acknowledged, Resolved)
                | (Acknowledged, Dismissed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Pending => "PENDING",
            AlertStatus::Acknowledged => "ACKNOWLEDGED",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::Dismissed => "DISMISSED",
        }
    }
}

/// Kind of document whose price triggered the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Expense,
    PurchaseOrder,
}

/// Aggregate root: FinancialAlert.
///
/// Raised by the price watchdog, reviewed by a person. The alert only records
/// and tracks the finding; acknowledging, resolving, or dismissing it never
/// re-prices or reverses the movement that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialAlert {
    id: AlertId,
    tenant_id: Option<TenantId>,
    master_part_id: Option<MasterPartId>,
    status: AlertStatus,
    severity: Severity,
    version: u64,
    created: bool,
}

impl FinancialAlert {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: AlertId) -> Self {
        Self {
            id,
            tenant_id: None,
            master_part_id: None,
            status: AlertStatus::Pending,
            severity: Severity::Low,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> AlertId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn master_part_id(&self) -> Option<MasterPartId> {
        self.master_part_id
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for FinancialAlert {
    type Id = AlertId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RaiseAlert. Issued by the watchdog, one alert per flagged price
/// occurrence (a re-flagged part raises a fresh alert rather than reopening
/// an old one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaiseAlert {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub master_part_id: MasterPartId,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub proposed_price: Decimal,
    pub baseline_price: Decimal,
    pub deviation_pct: Decimal,
    pub severity: Severity,
    /// Human-readable summary of the finding, shown in the review queue.
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Acknowledge. A reviewer takes ownership of the alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledge {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Resolve. The reviewer confirms the price was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolve {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    pub resolution_note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Dismiss. The reviewer judges the flag a false positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismiss {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    pub resolution_note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCommand {
    RaiseAlert(RaiseAlert),
    Acknowledge(Acknowledge),
    Resolve(Resolve),
    Dismiss(Dismiss),
}

/// Event: AlertRaised. Carries the full finding so the alert queue read model
/// never has to join back to the movement stream.
///
/// Serialized field names are the durable reporting contract: the baseline
/// persists as `referencePrice` and the raise time as `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRaised {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub master_part_id: MasterPartId,
    pub source_type: SourceType,
    pub source_id: Uuid,
    pub proposed_price: Decimal,
    #[serde(rename = "referencePrice")]
    pub baseline_price: Decimal,
    pub deviation_pct: Decimal,
    pub severity: Severity,
    pub description: String,
    #[serde(rename = "createdAt")]
    pub occurred_at: DateTime<Utc>,
}

/// Event: AlertAcknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertAcknowledged {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AlertResolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResolved {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolution_note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AlertDismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDismissed {
    pub tenant_id: TenantId,
    pub alert_id: AlertId,
    pub reviewed_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resolution_note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertEvent {
    AlertRaised(AlertRaised),
    AlertAcknowledged(AlertAcknowledged),
    AlertResolved(AlertResolved),
    AlertDismissed(AlertDismissed),
}

impl Event for AlertEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AlertEvent::AlertRaised(_) => "alerts.alert.raised",
            AlertEvent::AlertAcknowledged(_) => "alerts.alert.acknowledged",
            AlertEvent::AlertResolved(_) => "alerts.alert.resolved",
            AlertEvent::AlertDismissed(_) => "alerts.alert.dismissed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AlertEvent::AlertRaised(e) => e.occurred_at,
            AlertEvent::AlertAcknowledged(e) => e.occurred_at,
            AlertEvent::AlertResolved(e) => e.occurred_at,
            AlertEvent::AlertDismissed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for FinancialAlert {
    type Command = AlertCommand;
    type Event = AlertEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AlertEvent::AlertRaised(e) => {
                self.id = e.alert_id;
                self.tenant_id = Some(e.tenant_id);
                self.master_part_id = Some(e.master_part_id);
                self.status = AlertStatus::Pending;
                self.severity = e.severity;
                self.created = true;
            }
            AlertEvent::AlertAcknowledged(_) => {
                self.status = AlertStatus::Acknowledged;
            }
            AlertEvent::AlertResolved(_) => {
                self.status = AlertStatus::Resolved;
            }
            AlertEvent::AlertDismissed(_) => {
                self.status = AlertStatus::Dismissed;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AlertCommand::RaiseAlert(cmd) => self.handle_raise(cmd),
            AlertCommand::Acknowledge(cmd) => self.handle_acknowledge(cmd),
            AlertCommand::Resolve(cmd) => self.handle_resolve(cmd),
            AlertCommand::Dismiss(cmd) => self.handle_dismiss(cmd),
        }
    }
}

impl FinancialAlert {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_alert_id(&self, alert_id: AlertId) -> Result<(), DomainError> {
        if self.id != alert_id {
            return Err(DomainError::invariant("alert_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(&self, next: AlertStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                next.as_str(),
            ));
        }
        Ok(())
    }

    fn handle_raise(&self, cmd: &RaiseAlert) -> Result<Vec<AlertEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("alert already raised"));
        }
        if cmd.baseline_price <= Decimal::ZERO {
            return Err(DomainError::validation("baselinePrice must be positive"));
        }
        if cmd.proposed_price < Decimal::ZERO {
            return Err(DomainError::validation("proposedPrice must not be negative"));
        }

        Ok(vec![AlertEvent::AlertRaised(AlertRaised {
            tenant_id: cmd.tenant_id,
            alert_id: cmd.alert_id,
            master_part_id: cmd.master_part_id,
            source_type: cmd.source_type,
            source_id: cmd.source_id,
            proposed_price: cmd.proposed_price,
            baseline_price: cmd.baseline_price,
            deviation_pct: cmd.deviation_pct,
            severity: cmd.severity,
            description: cmd.description.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_acknowledge(&self, cmd: &Acknowledge) -> Result<Vec<AlertEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_alert_id(cmd.alert_id)?;
        self.ensure_transition(AlertStatus::Acknowledged)?;

        Ok(vec![AlertEvent::AlertAcknowledged(AlertAcknowledged {
            tenant_id: cmd.tenant_id,
            alert_id: cmd.alert_id,
            reviewed_by: cmd.reviewed_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_resolve(&self, cmd: &Resolve) -> Result<Vec<AlertEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_alert_id(cmd.alert_id)?;
        self.ensure_transition(AlertStatus::Resolved)?;

        Ok(vec![AlertEvent::AlertResolved(AlertResolved {
            tenant_id: cmd.tenant_id,
            alert_id: cmd.alert_id,
            reviewed_by: cmd.reviewed_by,
            resolution_note: cmd.resolution_note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_dismiss(&self, cmd: &Dismiss) -> Result<Vec<AlertEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_alert_id(cmd.alert_id)?;
        self.ensure_transition(AlertStatus::Dismissed)?;

        Ok(vec![AlertEvent::AlertDismissed(AlertDismissed {
            tenant_id: cmd.tenant_id,
            alert_id: cmd.alert_id,
            reviewed_by: cmd.reviewed_by,
            resolution_note: cmd.resolution_note.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn raise_cmd(tenant_id: TenantId, alert_id: AlertId) -> AlertCommand {
        AlertCommand::RaiseAlert(RaiseAlert {
            tenant_id,
            alert_id,
            master_part_id: MasterPartId::new(AggregateId::new()),
            source_type: SourceType::Expense,
            source_id: Uuid::now_v7(),
            proposed_price: dec!(150),
            baseline_price: dec!(100),
            deviation_pct: dec!(0.50),
            severity: Severity::High,
            description: "unit price 150 deviates 50% from reference price 100".to_string(),
            occurred_at: Utc::now(),
        })
    }

    fn raised_alert(tenant_id: TenantId) -> FinancialAlert {
        let alert_id = AlertId::new(AggregateId::new());
        let mut alert = FinancialAlert::empty(alert_id);
        let events = alert.handle(&raise_cmd(tenant_id, alert_id)).unwrap();
        alert.apply(&events[0]);
        alert
    }

    fn ack(alert: &mut FinancialAlert, tenant_id: TenantId) {
        let events = alert
            .handle(&AlertCommand::Acknowledge(Acknowledge {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        alert.apply(&events[0]);
    }

    #[test]
    fn alert_raised_serializes_with_durable_field_names() {
        let event = AlertRaised {
            tenant_id: test_tenant_id(),
            alert_id: AlertId::new(AggregateId::new()),
            master_part_id: MasterPartId::new(AggregateId::new()),
            source_type: SourceType::PurchaseOrder,
            source_id: Uuid::now_v7(),
            proposed_price: dec!(150),
            baseline_price: dec!(100),
            deviation_pct: dec!(0.50),
            severity: Severity::High,
            description: "unit price 150 deviates 50% from reference price 100".to_string(),
            occurred_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        for field in [
            "tenantId",
            "alertId",
            "masterPartId",
            "sourceType",
            "sourceId",
            "proposedPrice",
            "referencePrice",
            "deviationPct",
            "severity",
            "description",
            "createdAt",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert!(json.get("baselinePrice").is_none());
        assert!(json.get("occurredAt").is_none());
        assert_eq!(json["sourceType"], "PURCHASE_ORDER");
        assert_eq!(json["severity"], "HIGH");

        let back: AlertRaised = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn raised_alert_starts_pending() {
        let alert = raised_alert(test_tenant_id());
        assert!(alert.exists());
        assert_eq!(alert.status(), AlertStatus::Pending);
        assert_eq!(alert.severity(), Severity::High);
        assert_eq!(alert.version(), 1);
    }

    #[test]
    fn pending_alert_can_be_acknowledged_then_resolved() {
        let tenant_id = test_tenant_id();
        let mut alert = raised_alert(tenant_id);

        ack(&mut alert, tenant_id);
        assert_eq!(alert.status(), AlertStatus::Acknowledged);

        let events = alert
            .handle(&AlertCommand::Resolve(Resolve {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                resolution_note: Some("supplier invoice corrected".to_string()),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        alert.apply(&events[0]);
        assert_eq!(alert.status(), AlertStatus::Resolved);
    }

    #[test]
    fn pending_alert_cannot_skip_to_resolved() {
        let tenant_id = test_tenant_id();
        let alert = raised_alert(tenant_id);

        let err = alert
            .handle(&AlertCommand::Resolve(Resolve {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                resolution_note: None,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "PENDING".to_string(),
                to: "RESOLVED".to_string(),
            }
        );
    }

    #[test]
    fn alerts_can_be_dismissed_from_pending_or_acknowledged() {
        let tenant_id = test_tenant_id();

        let mut pending = raised_alert(tenant_id);
        let events = pending
            .handle(&AlertCommand::Dismiss(Dismiss {
                tenant_id,
                alert_id: pending.id_typed(),
                reviewed_by: UserId::new(),
                resolution_note: Some("expected price for OEM part".to_string()),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        pending.apply(&events[0]);
        assert_eq!(pending.status(), AlertStatus::Dismissed);

        let mut acked = raised_alert(tenant_id);
        ack(&mut acked, tenant_id);
        let events = acked
            .handle(&AlertCommand::Dismiss(Dismiss {
                tenant_id,
                alert_id: acked.id_typed(),
                reviewed_by: UserId::new(),
                resolution_note: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        acked.apply(&events[0]);
        assert_eq!(acked.status(), AlertStatus::Dismissed);
    }

    #[test]
    fn acknowledging_twice_is_an_invalid_transition() {
        let tenant_id = test_tenant_id();
        let mut alert = raised_alert(tenant_id);
        ack(&mut alert, tenant_id);

        let err = alert
            .handle(&AlertCommand::Acknowledge(Acknowledge {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "ACKNOWLEDGED".to_string(),
                to: "ACKNOWLEDGED".to_string(),
            }
        );
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let tenant_id = test_tenant_id();
        let mut alert = raised_alert(tenant_id);
        ack(&mut alert, tenant_id);

        let events = alert
            .handle(&AlertCommand::Resolve(Resolve {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                resolution_note: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        alert.apply(&events[0]);

        let err = alert
            .handle(&AlertCommand::Acknowledge(Acknowledge {
                tenant_id,
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "RESOLVED".to_string(),
                to: "ACKNOWLEDGED".to_string(),
            }
        );
    }

    #[test]
    fn review_commands_enforce_tenant_isolation() {
        let alert = raised_alert(test_tenant_id());
        let err = alert
            .handle(&AlertCommand::Acknowledge(Acknowledge {
                tenant_id: test_tenant_id(),
                alert_id: alert.id_typed(),
                reviewed_by: UserId::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn raising_requires_a_positive_baseline() {
        let alert_id = AlertId::new(AggregateId::new());
        let alert = FinancialAlert::empty(alert_id);
        let err = alert
            .handle(&AlertCommand::RaiseAlert(RaiseAlert {
                tenant_id: test_tenant_id(),
                alert_id,
                master_part_id: MasterPartId::new(AggregateId::new()),
                source_type: SourceType::PurchaseOrder,
                source_id: Uuid::now_v7(),
                proposed_price: dec!(10),
                baseline_price: dec!(0),
                deviation_pct: dec!(0),
                severity: Severity::Low,
                description: "unit price 10 with no usable reference price".to_string(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
