use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetstock_catalog::MasterPartId;
use fleetstock_core::money::round_minor;
use fleetstock_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, UserId};
use fleetstock_events::Event;

use crate::costing;
use crate::movement::{InventoryMovement, MovementReference, MovementType};

/// Namespace for deriving item stream identifiers from master part IDs.
const ITEM_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_4c2a_9e8d_41f3_b5a7_0c3e_2d91_88f4);

/// Inventory item identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(pub AggregateId);

impl InventoryItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    /// Derive the item identifier for a master part (UUIDv5).
    ///
    /// One inventory item exists per (tenant, part); deriving the stream ID
    /// from the part ID means every mutation of that pair lands on the same
    /// stream and is serialized by the store's concurrency check, with no
    /// lookup table. Tenant scoping comes from the stream key, so the same
    /// part maps to independent items under different tenants.
    pub fn for_part(part_id: MasterPartId) -> Self {
        Self(AggregateId::derived(
            &ITEM_ID_NAMESPACE,
            part_id.0.as_uuid(),
        ))
    }
}

impl core::fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Whether an item accepts movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Active,
    Inactive,
}

/// Aggregate root: InventoryItem.
///
/// State is derived exclusively from movements; `quantity_on_hand` can never
/// go negative because every decreasing command checks against the rehydrated
/// balance before emitting, and the store's optimistic concurrency check
/// serializes concurrent writers on the same stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    id: InventoryItemId,
    tenant_id: Option<TenantId>,
    master_part_id: Option<MasterPartId>,
    quantity_on_hand: Decimal,
    average_unit_cost: Decimal,
    status: ItemStatus,
    version: u64,
    created: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InventoryItemId) -> Self {
        Self {
            id,
            tenant_id: None,
            master_part_id: None,
            quantity_on_hand: Decimal::ZERO,
            average_unit_cost: Decimal::ZERO,
            status: ItemStatus::Active,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InventoryItemId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn master_part_id(&self) -> Option<MasterPartId> {
        self.master_part_id
    }

    pub fn quantity_on_hand(&self) -> Decimal {
        self.quantity_on_hand
    }

    /// Full-precision running average (used for the next costing step).
    pub fn average_unit_cost(&self) -> Decimal {
        self.average_unit_cost
    }

    /// Average rounded to the currency minor unit (reporting/display).
    pub fn average_unit_cost_rounded(&self) -> Decimal {
        round_minor(self.average_unit_cost)
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Whether any receipt has ever created this item.
    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordReceipt. Creates the item on first receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub master_part_id: MasterPartId,
    pub movement_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub reference: MovementReference,
    pub performed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordConsumption. Valued at the item's current average cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConsumption {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub master_part_id: MasterPartId,
    pub movement_id: Uuid,
    pub quantity: Decimal,
    pub reference: MovementReference,
    pub performed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordAdjustment. Signed correction with a mandatory reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAdjustment {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub master_part_id: MasterPartId,
    pub movement_id: Uuid,
    pub delta: Decimal,
    pub reason: String,
    pub reference: MovementReference,
    pub performed_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateItem. An inactive item rejects movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateItem {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReactivateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateItem {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordReceipt(RecordReceipt),
    RecordConsumption(RecordConsumption),
    RecordAdjustment(RecordAdjustment),
    DeactivateItem(DeactivateItem),
    ReactivateItem(ReactivateItem),
}

/// Event: ItemDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeactivated {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReactivated {
    pub tenant_id: TenantId,
    pub item_id: InventoryItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Ledger events. The movement record *is* the event payload, so the audit
/// trail and the persistence unit are one and the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    MovementRecorded(InventoryMovement),
    ItemDeactivated(ItemDeactivated),
    ItemReactivated(ItemReactivated),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::MovementRecorded(m) => match m.movement_type {
                MovementType::Receipt => "ledger.item.receipt_recorded",
                MovementType::Consumption => "ledger.item.consumption_recorded",
                MovementType::Adjustment => "ledger.item.adjustment_recorded",
            },
            LedgerEvent::ItemDeactivated(_) => "ledger.item.deactivated",
            LedgerEvent::ItemReactivated(_) => "ledger.item.reactivated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::MovementRecorded(m) => m.timestamp,
            LedgerEvent::ItemDeactivated(e) => e.occurred_at,
            LedgerEvent::ItemReactivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::MovementRecorded(m) => {
                if !self.created {
                    self.id = m.inventory_item_id;
                    self.tenant_id = Some(m.tenant_id);
                    self.master_part_id = Some(m.master_part_id);
                    self.status = ItemStatus::Active;
                    self.created = true;
                }
                self.quantity_on_hand = m.new_stock;
                self.average_unit_cost = m.new_avg_cost;
            }
            LedgerEvent::ItemDeactivated(_) => {
                self.status = ItemStatus::Inactive;
            }
            LedgerEvent::ItemReactivated(_) => {
                self.status = ItemStatus::Active;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordReceipt(cmd) => self.handle_receipt(cmd),
            LedgerCommand::RecordConsumption(cmd) => self.handle_consumption(cmd),
            LedgerCommand::RecordAdjustment(cmd) => self.handle_adjustment(cmd),
            LedgerCommand::DeactivateItem(cmd) => self.handle_deactivate(cmd),
            LedgerCommand::ReactivateItem(cmd) => self.handle_reactivate(cmd),
        }
    }
}

impl InventoryItem {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: InventoryItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn ensure_part(&self, master_part_id: MasterPartId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.master_part_id != Some(master_part_id) {
            return Err(DomainError::invariant("master_part_id mismatch"));
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status != ItemStatus::Active {
            return Err(DomainError::validation("inventory item is inactive"));
        }
        Ok(())
    }

    fn handle_receipt(&self, cmd: &RecordReceipt) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;
        self.ensure_part(cmd.master_part_id)?;
        if self.created {
            self.ensure_active()?;
        }

        let out = costing::compute(
            self.quantity_on_hand,
            self.average_unit_cost,
            MovementType::Receipt,
            cmd.quantity,
            cmd.unit_cost,
        )?;

        Ok(vec![LedgerEvent::MovementRecorded(InventoryMovement {
            id: cmd.movement_id,
            tenant_id: cmd.tenant_id,
            inventory_item_id: cmd.item_id,
            master_part_id: cmd.master_part_id,
            movement_type: MovementType::Receipt,
            quantity: cmd.quantity,
            unit_cost: out.unit_cost,
            total_cost: out.total_cost,
            previous_stock: self.quantity_on_hand,
            new_stock: out.new_stock,
            previous_avg_cost: self.average_unit_cost,
            new_avg_cost: out.new_avg_cost,
            reference: cmd.reference,
            reason: None,
            performed_by: cmd.performed_by,
            timestamp: cmd.occurred_at,
        })])
    }

    fn handle_consumption(&self, cmd: &RecordConsumption) -> Result<Vec<LedgerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;
        self.ensure_part(cmd.master_part_id)?;
        self.ensure_active()?;

        let out = costing::compute(
            self.quantity_on_hand,
            self.average_unit_cost,
            MovementType::Consumption,
            cmd.quantity,
            Decimal::ZERO,
        )?;

        Ok(vec![LedgerEvent::MovementRecorded(InventoryMovement {
            id: cmd.movement_id,
            tenant_id: cmd.tenant_id,
            inventory_item_id: cmd.item_id,
            master_part_id: cmd.master_part_id,
            movement_type: MovementType::Consumption,
            quantity: cmd.quantity,
            unit_cost: out.unit_cost,
            total_cost: out.total_cost,
            previous_stock: self.quantity_on_hand,
            new_stock: out.new_stock,
            previous_avg_cost: self.average_unit_cost,
            new_avg_cost: out.new_avg_cost,
            reference: cmd.reference,
            reason: None,
            performed_by: cmd.performed_by,
            timestamp: cmd.occurred_at,
        })])
    }

    fn handle_adjustment(&self, cmd: &RecordAdjustment) -> Result<Vec<LedgerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;
        self.ensure_part(cmd.master_part_id)?;
        self.ensure_active()?;

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("adjustment reason cannot be empty"));
        }

        let out = costing::compute(
            self.quantity_on_hand,
            self.average_unit_cost,
            MovementType::Adjustment,
            cmd.delta,
            Decimal::ZERO,
        )?;

        Ok(vec![LedgerEvent::MovementRecorded(InventoryMovement {
            id: cmd.movement_id,
            tenant_id: cmd.tenant_id,
            inventory_item_id: cmd.item_id,
            master_part_id: cmd.master_part_id,
            movement_type: MovementType::Adjustment,
            quantity: cmd.delta,
            unit_cost: out.unit_cost,
            total_cost: out.total_cost,
            previous_stock: self.quantity_on_hand,
            new_stock: out.new_stock,
            previous_avg_cost: self.average_unit_cost,
            new_avg_cost: out.new_avg_cost,
            reference: cmd.reference,
            reason: Some(cmd.reason.clone()),
            performed_by: cmd.performed_by,
            timestamp: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateItem) -> Result<Vec<LedgerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;
        if self.status == ItemStatus::Inactive {
            return Err(DomainError::validation("item is already inactive"));
        }

        Ok(vec![LedgerEvent::ItemDeactivated(ItemDeactivated {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reactivate(&self, cmd: &ReactivateItem) -> Result<Vec<LedgerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_item_id(cmd.item_id)?;
        if self.status == ItemStatus::Active {
            return Err(DomainError::validation("item is already active"));
        }

        Ok(vec![LedgerEvent::ItemReactivated(ItemReactivated {
            tenant_id: cmd.tenant_id,
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
