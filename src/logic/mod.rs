//! Core logic: classification, version ordering, and concurrent reconciliation.

pub mod classify;
pub mod reconcile;
pub mod vercmp;
