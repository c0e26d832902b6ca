use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fleetstock_core::{TenantId, UserId};
use fleetstock_catalog::MasterPartId;

use crate::item::InventoryItemId;

/// Kind of stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,
    Consumption,
    Adjustment,
}

/// What external record a movement traces back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    WorkOrder,
    PurchaseOrder,
    /// Internal maintenance ticket (work-order execution path).
    InternalTicket,
    Expense,
    Manual,
}

/// Reference linking a movement to its originating document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementReference {
    pub reference_type: ReferenceType,
    pub reference_id: Uuid,
    /// Line within the referenced document (e.g. work-order item), if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail_id: Option<Uuid>,
}

impl MovementReference {
    pub fn new(reference_type: ReferenceType, reference_id: Uuid) -> Self {
        Self {
            reference_type,
            reference_id,
            detail_id: None,
        }
    }

    pub fn with_detail(mut self, detail_id: Uuid) -> Self {
        self.detail_id = Some(detail_id);
        self
    }
}

/// Immutable record of a single stock change (the audit trail row).
///
/// Serialized field names are the durable reporting contract; they must stay
/// stable across storage backends. Once appended a movement is never edited;
/// corrections are new ADJUSTMENT movements.
///
/// `quantity` is the positive magnitude for receipts and consumptions (the
/// movement type carries the sign) and the signed delta for adjustments.
/// `previousAvgCost`/`newAvgCost` keep full decimal precision so replaying a
/// movement chain never accumulates rounding drift; `totalCost` is rounded to
/// the currency minor unit for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub inventory_item_id: InventoryItemId,
    pub master_part_id: MasterPartId,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub previous_avg_cost: Decimal,
    pub new_avg_cost: Decimal,
    #[serde(flatten)]
    pub reference: MovementReference,
    /// Free-text reason, present on adjustments.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    pub performed_by: UserId,
    pub timestamp: DateTime<Utc>,
}
