//! Application service for the stock ledger and price watchdog.
//!
//! [`StockLedgerService`] is the composition root: it owns the command
//! dispatcher, keeps the read-model projections current, and exposes the
//! operations the rest of the product calls (receiving stock, consuming for
//! work orders, adjustments, availability checks, the alert queue).
//!
//! Concurrency conflicts are retried here, and only conflicts: a concurrent
//! append just means another writer won the optimistic check, so the command
//! is re-decided against the fresh state. Domain failures are never retried.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use fleetstock_alerts::alert::{
    Acknowledge, AlertCommand, AlertId, AlertStatus, Dismiss, FinancialAlert, RaiseAlert, Resolve,
    SourceType,
};
use fleetstock_alerts::watchdog::{self, DeviationCheck, DeviationThresholds};
use fleetstock_catalog::{
    CatalogCommand, CreateMasterPart, MasterPart, MasterPartId, SetReferencePrice,
};
use fleetstock_core::{
    Aggregate, AggregateId, DomainError, TenantContext, UserId, money::positive,
};
use fleetstock_events::{EventBus, EventEnvelope};
use fleetstock_ledger::{
    DeactivateItem, InventoryItem, InventoryItemId, InventoryMovement, LedgerCommand, LedgerEvent,
    MovementReference, ReactivateItem, RecordAdjustment, RecordConsumption, RecordReceipt,
    ReferenceType,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError, apply_history};
use crate::event_store::{EventStore, StoredEvent};
use crate::projections::{
    AlertQueueProjection, AlertRecord, InventoryBalance, InventoryBalancesProjection,
    MasterPartRecord, MasterPartsProjection,
};
use crate::read_model::InMemoryTenantStore;

const CATALOG_PART_AGGREGATE: &str = "catalog.part";
const LEDGER_ITEM_AGGREGATE: &str = "ledger.item";
const ALERT_AGGREGATE: &str = "alerts.alert";

/// Upper bound on optimistic-concurrency retries per command. Every conflict
/// implies some other append succeeded, so hitting the bound means the stream
/// is under sustained contention, not stuck.
const MAX_CONFLICT_RETRIES: usize = 16;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("command abandoned after {attempts} concurrency conflicts")]
    Contention { attempts: usize },

    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl From<DispatchError> for ServiceError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Domain(e) => ServiceError::Domain(e),
            DispatchError::Concurrency(msg) => ServiceError::Infrastructure(msg),
            other => ServiceError::Infrastructure(other.to_string()),
        }
    }
}

/// Result of receiving stock, including the watchdog's advisory finding.
///
/// The receipt is already durable by the time the watchdog runs; a flagged
/// price raises an alert but never blocks or undoes the movement.
#[derive(Debug, Clone)]
pub struct ReceiptOutcome {
    pub movement: InventoryMovement,
    pub deviation: Option<DeviationCheck>,
    pub alert_id: Option<AlertId>,
}

/// Result of a stock availability check. Advisory only: the authoritative
/// check happens inside the consumption command, under the stream's
/// concurrency guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityCheck {
    pub requested: Decimal,
    pub quantity_on_hand: Decimal,
    pub available: bool,
}

/// One page of movement history, newest first.
#[derive(Debug, Clone)]
pub struct MovementHistoryPage {
    pub movements: Vec<InventoryMovement>,
    /// Pass back as `before` to fetch the next (older) page.
    pub next_cursor: Option<u64>,
}

type BalanceStore = Arc<InMemoryTenantStore<InventoryItemId, InventoryBalance>>;
type PartStore = Arc<InMemoryTenantStore<MasterPartId, MasterPartRecord>>;
type AlertStore = Arc<InMemoryTenantStore<AlertId, AlertRecord>>;

/// Application facade over the catalog, ledger, and alert domains.
pub struct StockLedgerService<S, B> {
    dispatcher: CommandDispatcher<S, B>,
    thresholds: DeviationThresholds,
    balances: InventoryBalancesProjection<BalanceStore>,
    parts: MasterPartsProjection<PartStore>,
    alert_queue: AlertQueueProjection<AlertStore>,
}

impl<S, B> StockLedgerService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B, thresholds: DeviationThresholds) -> Result<Self, DomainError> {
        thresholds.validate()?;
        Ok(Self {
            dispatcher: CommandDispatcher::new(store, bus),
            thresholds,
            balances: InventoryBalancesProjection::new(Arc::new(InMemoryTenantStore::new())),
            parts: MasterPartsProjection::new(Arc::new(InMemoryTenantStore::new())),
            alert_queue: AlertQueueProjection::new(Arc::new(InMemoryTenantStore::new())),
        })
    }

    pub fn with_default_thresholds(store: S, bus: B) -> Self {
        // Default thresholds are ascending by construction.
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
            thresholds: DeviationThresholds::default(),
            balances: InventoryBalancesProjection::new(Arc::new(InMemoryTenantStore::new())),
            parts: MasterPartsProjection::new(Arc::new(InMemoryTenantStore::new())),
            alert_queue: AlertQueueProjection::new(Arc::new(InMemoryTenantStore::new())),
        }
    }

    // ---- catalog ----------------------------------------------------------

    pub fn register_master_part(
        &self,
        ctx: &TenantContext,
        part_number: impl Into<String>,
        name: impl Into<String>,
        category: Option<String>,
        reference_price: Option<Decimal>,
    ) -> Result<MasterPartId, ServiceError> {
        let part_id = MasterPartId::new(AggregateId::new());
        let command = CatalogCommand::CreateMasterPart(CreateMasterPart {
            tenant_id: ctx.tenant_id(),
            part_id,
            part_number: part_number.into(),
            name: name.into(),
            category,
            reference_price,
            occurred_at: Utc::now(),
        });

        self.dispatch_with_retry(ctx, part_id.0, CATALOG_PART_AGGREGATE, &command, |id| {
            MasterPart::empty(MasterPartId::new(id))
        })?;

        info!(tenant_id = %ctx.tenant_id(), part_id = %part_id, "master part registered");
        Ok(part_id)
    }

    pub fn set_reference_price(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        reference_price: Option<Decimal>,
    ) -> Result<(), ServiceError> {
        let command = CatalogCommand::SetReferencePrice(SetReferencePrice {
            tenant_id: ctx.tenant_id(),
            part_id,
            reference_price,
            occurred_at: Utc::now(),
        });

        self.dispatch_with_retry(ctx, part_id.0, CATALOG_PART_AGGREGATE, &command, |id| {
            MasterPart::empty(MasterPartId::new(id))
        })?;
        Ok(())
    }

    pub fn get_part(&self, ctx: &TenantContext, part_id: &MasterPartId) -> Option<MasterPartRecord> {
        self.parts.get(ctx.tenant_id(), part_id)
    }

    pub fn list_parts(&self, ctx: &TenantContext) -> Vec<MasterPartRecord> {
        self.parts.list(ctx.tenant_id())
    }

    // ---- stock ledger -----------------------------------------------------

    /// Record a receipt against a purchasing document (a purchase order or
    /// an expense line), then run the price watchdog over the paid unit cost.
    #[allow(clippy::too_many_arguments)]
    pub fn receive_from_purchase(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        quantity: Decimal,
        unit_cost: Decimal,
        source_type: SourceType,
        source_id: Uuid,
        performed_by: UserId,
    ) -> Result<ReceiptOutcome, ServiceError> {
        let part = self.load_part(ctx, part_id)?;
        let item_id = InventoryItemId::for_part(part_id);

        let command = LedgerCommand::RecordReceipt(RecordReceipt {
            tenant_id: ctx.tenant_id(),
            item_id,
            master_part_id: part_id,
            movement_id: Uuid::now_v7(),
            quantity,
            unit_cost,
            reference: MovementReference::new(reference_type_for(source_type), source_id),
            performed_by,
            occurred_at: Utc::now(),
        });

        let committed =
            self.dispatch_with_retry(ctx, item_id.0, LEDGER_ITEM_AGGREGATE, &command, |id| {
                InventoryItem::empty(InventoryItemId::new(id))
            })?;
        let movement = movement_from_committed(&committed)?;

        info!(
            tenant_id = %ctx.tenant_id(),
            part_id = %part_id,
            quantity = %quantity,
            unit_cost = %unit_cost,
            new_stock = %movement.new_stock,
            new_avg_cost = %movement.new_avg_cost,
            "receipt recorded"
        );

        // Watchdog runs after the receipt is durable. Prefer the catalog
        // reference price; fall back to the pre-receipt average so
        // unreferenced parts still get drift detection.
        let baseline = part
            .reference_price()
            .filter(|p| *p > Decimal::ZERO)
            .or_else(|| {
                (movement.previous_avg_cost > Decimal::ZERO).then_some(movement.previous_avg_cost)
            });

        let deviation =
            baseline.and_then(|base| watchdog::evaluate(unit_cost, base, &self.thresholds));

        let alert_id = match (deviation, baseline) {
            (Some(check), Some(base)) => self
                .raise_price_alert(ctx, part_id, source_type, source_id, unit_cost, base, check)
                .map_err(|e| {
                    // Advisory path: the receipt stands even if the alert
                    // cannot be raised.
                    warn!(
                        tenant_id = %ctx.tenant_id(),
                        part_id = %part_id,
                        error = %e,
                        "price watchdog failed to raise alert"
                    );
                    e
                })
                .ok(),
            _ => None,
        };

        Ok(ReceiptOutcome {
            movement,
            deviation,
            alert_id,
        })
    }

    /// Consume stock for a maintenance work order, valued at the current
    /// weighted average.
    pub fn consume_for_work_order(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        quantity: Decimal,
        work_order_id: Uuid,
        work_order_item_id: Option<Uuid>,
        performed_by: UserId,
    ) -> Result<InventoryMovement, ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let mut reference = MovementReference::new(ReferenceType::InternalTicket, work_order_id);
        if let Some(detail_id) = work_order_item_id {
            reference = reference.with_detail(detail_id);
        }

        let command = LedgerCommand::RecordConsumption(RecordConsumption {
            tenant_id: ctx.tenant_id(),
            item_id,
            master_part_id: part_id,
            movement_id: Uuid::now_v7(),
            quantity,
            reference,
            performed_by,
            occurred_at: Utc::now(),
        });

        let committed =
            self.dispatch_with_retry(ctx, item_id.0, LEDGER_ITEM_AGGREGATE, &command, |id| {
                InventoryItem::empty(InventoryItemId::new(id))
            })?;
        let movement = movement_from_committed(&committed)?;

        info!(
            tenant_id = %ctx.tenant_id(),
            part_id = %part_id,
            quantity = %quantity,
            total_cost = %movement.total_cost,
            remaining = %movement.new_stock,
            "consumption recorded"
        );
        Ok(movement)
    }

    /// Record a signed stock correction (cycle count, damage, loss).
    pub fn record_adjustment(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        delta: Decimal,
        reason: impl Into<String>,
        performed_by: UserId,
    ) -> Result<InventoryMovement, ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let movement_id = Uuid::now_v7();

        let command = LedgerCommand::RecordAdjustment(RecordAdjustment {
            tenant_id: ctx.tenant_id(),
            item_id,
            master_part_id: part_id,
            movement_id,
            delta,
            reason: reason.into(),
            reference: MovementReference::new(ReferenceType::Manual, movement_id),
            performed_by,
            occurred_at: Utc::now(),
        });

        let committed =
            self.dispatch_with_retry(ctx, item_id.0, LEDGER_ITEM_AGGREGATE, &command, |id| {
                InventoryItem::empty(InventoryItemId::new(id))
            })?;
        let movement = movement_from_committed(&committed)?;

        info!(
            tenant_id = %ctx.tenant_id(),
            part_id = %part_id,
            delta = %delta,
            new_stock = %movement.new_stock,
            "adjustment recorded"
        );
        Ok(movement)
    }

    /// Advisory availability check. A part that has never been stocked
    /// reports zero on hand rather than an error.
    pub fn check_availability(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        quantity: Decimal,
    ) -> Result<AvailabilityCheck, ServiceError> {
        positive("quantity", quantity).map_err(ServiceError::Domain)?;

        let item = self.load_item(ctx, part_id)?;
        let on_hand = item.quantity_on_hand();
        Ok(AvailabilityCheck {
            requested: quantity,
            quantity_on_hand: on_hand,
            available: quantity <= on_hand,
        })
    }

    /// Current item state, rehydrated from its stream.
    pub fn get_item(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<InventoryItem, ServiceError> {
        let item = self.load_item(ctx, part_id)?;
        if !item.exists() {
            return Err(ServiceError::Domain(DomainError::not_found()));
        }
        Ok(item)
    }

    /// Movement audit trail for one item, newest first.
    ///
    /// `before` is the `next_cursor` from a previous page (movements with a
    /// stream position below it are returned).
    pub fn movement_history(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        before: Option<u64>,
        limit: usize,
    ) -> Result<MovementHistoryPage, ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let stream = self
            .dispatcher
            .store()
            .load_stream(ctx.tenant_id(), item_id.0)
            .map_err(|e| ServiceError::Infrastructure(e.to_string()))?;

        let mut page: Vec<(u64, InventoryMovement)> = Vec::new();
        let mut has_more = false;
        for stored in stream.iter().rev() {
            if !is_movement(stored) {
                continue;
            }
            if before.is_some_and(|b| stored.sequence_number >= b) {
                continue;
            }
            if page.len() == limit {
                has_more = true;
                break;
            }
            let ev: LedgerEvent = serde_json::from_value(stored.payload.clone())
                .map_err(|e| ServiceError::Infrastructure(e.to_string()))?;
            if let LedgerEvent::MovementRecorded(movement) = ev {
                page.push((stored.sequence_number, movement));
            }
        }

        let next_cursor = has_more
            .then(|| page.last().map(|(seq, _)| *seq))
            .flatten();

        Ok(MovementHistoryPage {
            movements: page.into_iter().map(|(_, m)| m).collect(),
            next_cursor,
        })
    }

    pub fn deactivate_item(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<(), ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let command = LedgerCommand::DeactivateItem(DeactivateItem {
            tenant_id: ctx.tenant_id(),
            item_id,
            occurred_at: Utc::now(),
        });
        self.dispatch_with_retry(ctx, item_id.0, LEDGER_ITEM_AGGREGATE, &command, |id| {
            InventoryItem::empty(InventoryItemId::new(id))
        })?;
        Ok(())
    }

    pub fn reactivate_item(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<(), ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let command = LedgerCommand::ReactivateItem(ReactivateItem {
            tenant_id: ctx.tenant_id(),
            item_id,
            occurred_at: Utc::now(),
        });
        self.dispatch_with_retry(ctx, item_id.0, LEDGER_ITEM_AGGREGATE, &command, |id| {
            InventoryItem::empty(InventoryItemId::new(id))
        })?;
        Ok(())
    }

    pub fn list_balances(&self, ctx: &TenantContext) -> Vec<InventoryBalance> {
        self.balances.list(ctx.tenant_id())
    }

    pub fn total_stock_value(&self, ctx: &TenantContext) -> Decimal {
        self.balances.total_stock_value(ctx.tenant_id())
    }

    // ---- price watchdog ---------------------------------------------------

    /// Grade a proposed price without recording anything. Baseline is the
    /// catalog reference price, falling back to the item's current average.
    pub fn check_price_deviation(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        proposed_price: Decimal,
    ) -> Result<Option<DeviationCheck>, ServiceError> {
        let baseline = self.baseline_for(ctx, part_id)?;
        Ok(baseline.and_then(|base| watchdog::evaluate(proposed_price, base, &self.thresholds)))
    }

    /// Run the watchdog over an expense line price and raise an alert if it
    /// deviates. Returns the raised alert's id, if any.
    pub fn review_expense_price(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        expense_id: Uuid,
        proposed_price: Decimal,
    ) -> Result<Option<AlertId>, ServiceError> {
        let Some(baseline) = self.baseline_for(ctx, part_id)? else {
            return Ok(None);
        };
        let Some(check) = watchdog::evaluate(proposed_price, baseline, &self.thresholds) else {
            return Ok(None);
        };

        let alert_id = self.raise_price_alert(
            ctx,
            part_id,
            SourceType::Expense,
            expense_id,
            proposed_price,
            baseline,
            check,
        )?;
        Ok(Some(alert_id))
    }

    // ---- alert review -----------------------------------------------------

    pub fn list_alerts(
        &self,
        ctx: &TenantContext,
        status: Option<AlertStatus>,
    ) -> Vec<AlertRecord> {
        self.alert_queue.list(ctx.tenant_id(), status)
    }

    pub fn acknowledge_alert(
        &self,
        ctx: &TenantContext,
        alert_id: AlertId,
        reviewed_by: UserId,
    ) -> Result<(), ServiceError> {
        let command = AlertCommand::Acknowledge(Acknowledge {
            tenant_id: ctx.tenant_id(),
            alert_id,
            reviewed_by,
            occurred_at: Utc::now(),
        });
        self.dispatch_with_retry(ctx, alert_id.0, ALERT_AGGREGATE, &command, |id| {
            FinancialAlert::empty(AlertId::new(id))
        })?;
        Ok(())
    }

    pub fn resolve_alert(
        &self,
        ctx: &TenantContext,
        alert_id: AlertId,
        reviewed_by: UserId,
        resolution_note: Option<String>,
    ) -> Result<(), ServiceError> {
        let command = AlertCommand::Resolve(Resolve {
            tenant_id: ctx.tenant_id(),
            alert_id,
            reviewed_by,
            resolution_note,
            occurred_at: Utc::now(),
        });
        self.dispatch_with_retry(ctx, alert_id.0, ALERT_AGGREGATE, &command, |id| {
            FinancialAlert::empty(AlertId::new(id))
        })?;
        Ok(())
    }

    pub fn dismiss_alert(
        &self,
        ctx: &TenantContext,
        alert_id: AlertId,
        reviewed_by: UserId,
        resolution_note: Option<String>,
    ) -> Result<(), ServiceError> {
        let command = AlertCommand::Dismiss(Dismiss {
            tenant_id: ctx.tenant_id(),
            alert_id,
            reviewed_by,
            resolution_note,
            occurred_at: Utc::now(),
        });
        self.dispatch_with_retry(ctx, alert_id.0, ALERT_AGGREGATE, &command, |id| {
            FinancialAlert::empty(AlertId::new(id))
        })?;
        Ok(())
    }

    // ---- internals --------------------------------------------------------

    fn dispatch_with_retry<A>(
        &self,
        ctx: &TenantContext,
        aggregate_id: AggregateId,
        aggregate_type: &'static str,
        command: &A::Command,
        make_aggregate: impl Fn(AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, ServiceError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: fleetstock_events::Event + serde::Serialize + serde::de::DeserializeOwned,
    {
        for attempt in 1..=MAX_CONFLICT_RETRIES {
            match self.dispatcher.dispatch(
                ctx.tenant_id(),
                aggregate_id,
                aggregate_type,
                command,
                &make_aggregate,
            ) {
                Ok(committed) => {
                    self.apply_committed(&committed);
                    return Ok(committed);
                }
                Err(DispatchError::Concurrency(msg)) => {
                    warn!(
                        tenant_id = %ctx.tenant_id(),
                        aggregate_id = %aggregate_id,
                        attempt,
                        conflict = %msg,
                        "concurrency conflict, re-dispatching"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ServiceError::Contention {
            attempts: MAX_CONFLICT_RETRIES,
        })
    }

    /// Feed committed events into the service's own projections so reads
    /// issued right after a write observe it. The same envelopes also flow
    /// through the bus to external subscribers; cursors keep both paths
    /// idempotent.
    fn apply_committed(&self, committed: &[StoredEvent]) {
        for stored in committed {
            let envelope = stored.to_envelope();
            for result in [
                self.balances.apply_envelope(&envelope),
                self.parts.apply_envelope(&envelope),
                self.alert_queue.apply_envelope(&envelope),
            ] {
                if let Err(e) = result {
                    warn!(
                        aggregate_type = %stored.aggregate_type,
                        sequence_number = stored.sequence_number,
                        error = %e,
                        "projection rejected committed event"
                    );
                }
            }
        }
    }

    fn load_part(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<MasterPart, ServiceError> {
        let stream = self
            .dispatcher
            .store()
            .load_stream(ctx.tenant_id(), part_id.0)
            .map_err(|e| ServiceError::Infrastructure(e.to_string()))?;

        let mut part = MasterPart::empty(part_id);
        apply_history::<MasterPart>(&mut part, stream).map_err(ServiceError::from)?;
        if !part.exists() {
            return Err(ServiceError::Domain(DomainError::not_found()));
        }
        Ok(part)
    }

    fn load_item(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<InventoryItem, ServiceError> {
        let item_id = InventoryItemId::for_part(part_id);
        let stream = self
            .dispatcher
            .store()
            .load_stream(ctx.tenant_id(), item_id.0)
            .map_err(|e| ServiceError::Infrastructure(e.to_string()))?;

        let mut item = InventoryItem::empty(item_id);
        apply_history::<InventoryItem>(&mut item, stream).map_err(ServiceError::from)?;
        Ok(item)
    }

    fn baseline_for(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
    ) -> Result<Option<Decimal>, ServiceError> {
        let part = self.load_part(ctx, part_id)?;
        if let Some(price) = part.reference_price().filter(|p| *p > Decimal::ZERO) {
            return Ok(Some(price));
        }

        let item = self.load_item(ctx, part_id)?;
        Ok((item.exists() && item.average_unit_cost() > Decimal::ZERO)
            .then(|| item.average_unit_cost()))
    }

    #[allow(clippy::too_many_arguments)]
    fn raise_price_alert(
        &self,
        ctx: &TenantContext,
        part_id: MasterPartId,
        source_type: SourceType,
        source_id: Uuid,
        proposed_price: Decimal,
        baseline_price: Decimal,
        check: DeviationCheck,
    ) -> Result<AlertId, ServiceError> {
        let alert_id = AlertId::new(AggregateId::new());
        let description = format!(
            "unit price {} deviates {}% from reference price {}",
            proposed_price,
            (check.deviation_pct * Decimal::ONE_HUNDRED).round_dp(2).normalize(),
            baseline_price
        );
        let command = AlertCommand::RaiseAlert(RaiseAlert {
            tenant_id: ctx.tenant_id(),
            alert_id,
            master_part_id: part_id,
            source_type,
            source_id,
            proposed_price,
            baseline_price,
            deviation_pct: check.deviation_pct,
            severity: check.severity,
            description,
            occurred_at: Utc::now(),
        });

        self.dispatch_with_retry(ctx, alert_id.0, ALERT_AGGREGATE, &command, |id| {
            FinancialAlert::empty(AlertId::new(id))
        })?;

        info!(
            tenant_id = %ctx.tenant_id(),
            part_id = %part_id,
            alert_id = %alert_id,
            deviation_pct = %check.deviation_pct,
            severity = ?check.severity,
            "price deviation alert raised"
        );
        Ok(alert_id)
    }
}

fn reference_type_for(source_type: SourceType) -> ReferenceType {
    match source_type {
        SourceType::PurchaseOrder => ReferenceType::PurchaseOrder,
        SourceType::Expense => ReferenceType::Expense,
    }
}

fn is_movement(stored: &StoredEvent) -> bool {
    matches!(
        stored.event_type.as_str(),
        "ledger.item.receipt_recorded"
            | "ledger.item.consumption_recorded"
            | "ledger.item.adjustment_recorded"
    )
}

fn movement_from_committed(committed: &[StoredEvent]) -> Result<InventoryMovement, ServiceError> {
    let stored = committed
        .first()
        .ok_or_else(|| ServiceError::Infrastructure("no events committed".to_string()))?;
    let ev: LedgerEvent = serde_json::from_value(stored.payload.clone())
        .map_err(|e| ServiceError::Infrastructure(e.to_string()))?;
    match ev {
        LedgerEvent::MovementRecorded(movement) => Ok(movement),
        other => Err(ServiceError::Infrastructure(format!(
            "expected a movement event, got {}",
            fleetstock_events::Event::event_type(&other)
        ))),
    }
}
