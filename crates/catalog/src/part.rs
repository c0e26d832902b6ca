use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fleetstock_core::money::non_negative;
use fleetstock_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use fleetstock_events::Event;

/// Master part identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasterPartId(pub AggregateId);

impl MasterPartId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MasterPartId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: MasterPart.
///
/// A catalog entry for a part the fleet consumes. `reference_price` is the
/// baseline the price watchdog prefers when checking incoming costs; it is
/// nullable because not every part has an agreed catalog price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPart {
    id: MasterPartId,
    tenant_id: Option<TenantId>,
    part_number: String,
    name: String,
    category: Option<String>,
    reference_price: Option<Decimal>,
    version: u64,
    created: bool,
}

impl MasterPart {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: MasterPartId) -> Self {
        Self {
            id,
            tenant_id: None,
            part_number: String::new(),
            name: String::new(),
            category: None,
            reference_price: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> MasterPartId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn reference_price(&self) -> Option<Decimal> {
        self.reference_price
    }

    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for MasterPart {
    type Id = MasterPartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateMasterPart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMasterPart {
    pub tenant_id: TenantId,
    pub part_id: MasterPartId,
    pub part_number: String,
    pub name: String,
    pub category: Option<String>,
    pub reference_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetReferencePrice (also clears the baseline when `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReferencePrice {
    pub tenant_id: TenantId,
    pub part_id: MasterPartId,
    pub reference_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogCommand {
    CreateMasterPart(CreateMasterPart),
    SetReferencePrice(SetReferencePrice),
}

/// Event: MasterPartCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterPartCreated {
    pub tenant_id: TenantId,
    pub part_id: MasterPartId,
    pub part_number: String,
    pub name: String,
    pub category: Option<String>,
    pub reference_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReferencePriceSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePriceSet {
    pub tenant_id: TenantId,
    pub part_id: MasterPartId,
    pub reference_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    MasterPartCreated(MasterPartCreated),
    ReferencePriceSet(ReferencePriceSet),
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::MasterPartCreated(_) => "catalog.part.created",
            CatalogEvent::ReferencePriceSet(_) => "catalog.part.reference_price_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::MasterPartCreated(e) => e.occurred_at,
            CatalogEvent::ReferencePriceSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for MasterPart {
    type Command = CatalogCommand;
    type Event = CatalogEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CatalogEvent::MasterPartCreated(e) => {
                self.id = e.part_id;
                self.tenant_id = Some(e.tenant_id);
                self.part_number = e.part_number.clone();
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.reference_price = e.reference_price;
                self.created = true;
            }
            CatalogEvent::ReferencePriceSet(e) => {
                self.reference_price = e.reference_price;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CatalogCommand::CreateMasterPart(cmd) => self.handle_create(cmd),
            CatalogCommand::SetReferencePrice(cmd) => self.handle_set_price(cmd),
        }
    }
}

impl MasterPart {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_part_id(&self, part_id: MasterPartId) -> Result<(), DomainError> {
        if self.id != part_id {
            return Err(DomainError::invariant("part_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateMasterPart) -> Result<Vec<CatalogEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("master part already exists"));
        }
        if cmd.part_number.trim().is_empty() {
            return Err(DomainError::validation("part_number cannot be empty"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(price) = cmd.reference_price {
            non_negative("referencePrice", price)?;
        }

        Ok(vec![CatalogEvent::MasterPartCreated(MasterPartCreated {
            tenant_id: cmd.tenant_id,
            part_id: cmd.part_id,
            part_number: cmd.part_number.clone(),
            name: cmd.name.clone(),
            category: cmd.category.clone(),
            reference_price: cmd.reference_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_price(&self, cmd: &SetReferencePrice) -> Result<Vec<CatalogEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_part_id(cmd.part_id)?;

        if let Some(price) = cmd.reference_price {
            non_negative("referencePrice", price)?;
        }

        Ok(vec![CatalogEvent::ReferencePriceSet(ReferencePriceSet {
            tenant_id: cmd.tenant_id,
            part_id: cmd.part_id,
            reference_price: cmd.reference_price,
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

    fn test_part_id() -> MasterPartId {
        MasterPartId::new(AggregateId::new())
    }

    fn created_part(tenant_id: TenantId, part_id: MasterPartId) -> MasterPart {
        let mut part = MasterPart::empty(part_id);
        let events = part
            .handle(&CatalogCommand::CreateMasterPart(CreateMasterPart {
                tenant_id,
                part_id,
                part_number: "BRK-PAD-17".to_string(),
                name: "Brake pad set".to_string(),
                category: Some("brakes".to_string()),
                reference_price: Some(dec!(100)),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        part.apply(&events[0]);
        part
    }

    #[test]
    fn create_emits_master_part_created() {
        let tenant_id = test_tenant_id();
        let part_id = test_part_id();
        let part = created_part(tenant_id, part_id);

        assert!(part.exists());
        assert_eq!(part.tenant_id(), Some(tenant_id));
        assert_eq!(part.reference_price(), Some(dec!(100)));
        assert_eq!(part.version(), 1);
    }

    #[test]
    fn create_rejects_blank_part_number() {
        let part = MasterPart::empty(test_part_id());
        let err = part
            .handle(&CatalogCommand::CreateMasterPart(CreateMasterPart {
                tenant_id: test_tenant_id(),
                part_id: part.id_typed(),
                part_number: "  ".to_string(),
                name: "Brake pad set".to_string(),
                category: None,
                reference_price: None,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_negative_reference_price() {
        let part = MasterPart::empty(test_part_id());
        let err = part
            .handle(&CatalogCommand::CreateMasterPart(CreateMasterPart {
                tenant_id: test_tenant_id(),
                part_id: part.id_typed(),
                part_number: "BRK-PAD-17".to_string(),
                name: "Brake pad set".to_string(),
                category: None,
                reference_price: Some(dec!(-1)),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn set_reference_price_updates_and_clears_baseline() {
        let tenant_id = test_tenant_id();
        let part_id = test_part_id();
        let mut part = created_part(tenant_id, part_id);

        let events = part
            .handle(&CatalogCommand::SetReferencePrice(SetReferencePrice {
                tenant_id,
                part_id,
                reference_price: Some(dec!(120.50)),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        part.apply(&events[0]);
        assert_eq!(part.reference_price(), Some(dec!(120.50)));

        let events = part
            .handle(&CatalogCommand::SetReferencePrice(SetReferencePrice {
                tenant_id,
                part_id,
                reference_price: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        part.apply(&events[0]);
        assert_eq!(part.reference_price(), None);
    }

    #[test]
    fn set_reference_price_enforces_tenant_isolation() {
        let tenant_id = test_tenant_id();
        let part_id = test_part_id();
        let part = created_part(tenant_id, part_id);

        let err = part
            .handle(&CatalogCommand::SetReferencePrice(SetReferencePrice {
                tenant_id: test_tenant_id(),
                part_id,
                reference_price: Some(dec!(1)),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn set_reference_price_on_unknown_part_is_not_found() {
        let part = MasterPart::empty(test_part_id());
        let err = part
            .handle(&CatalogCommand::SetReferencePrice(SetReferencePrice {
                tenant_id: test_tenant_id(),
                part_id: part.id_typed(),
                reference_price: Some(dec!(1)),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
