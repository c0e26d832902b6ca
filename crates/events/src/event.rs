use chrono::{DateTime, Utc};

/// Behavior every persisted domain event carries.
///
/// Ledger movements, catalog changes, and alert transitions all implement
/// this. An event is a fact: once appended it is never edited, and a
/// correction is a new event (an adjustment movement, a dismissal).
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable dotted type name, namespaced by aggregate
    /// (e.g. "ledger.item.receipt_recorded", "alerts.alert.raised").
    /// Projections route on this string, so it must never change for an
    /// existing schema.
    fn event_type(&self) -> &'static str;

    /// Business time: when the movement or transition happened, not when it
    /// was stored.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Schema version of the payload, for upcasting on read. All current
    /// event schemas are at version 1.
    fn version(&self) -> u32 {
        1
    }
}
