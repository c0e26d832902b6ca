//! Price-deviation watchdog and financial alert lifecycle.
//!
//! [`watchdog`] is the pure classifier: given a proposed unit price and a
//! baseline, it grades the deviation into a severity (or decides the price is
//! unremarkable). [`alert`] is the event-sourced lifecycle of the alerts the
//! watchdog raises; review outcomes never touch the stock ledger.

pub mod alert;
pub mod watchdog;

pub use alert::{
    Acknowledge, AlertCommand, AlertEvent, AlertId, AlertStatus, Dismiss, FinancialAlert,
    RaiseAlert, Resolve, SourceType,
};
pub use watchdog::{DeviationCheck, DeviationThresholds, Severity, evaluate};
