//! Sync pipeline: choose tracked accounts from a payload and persist them.

pub mod filter;
mod reconciler;
mod service;

pub use filter::{filter_tracked, is_tracked, unmatched_tracked};
pub use reconciler::Reconciler;
pub use service::{AccountSyncFailure, AccountSyncOutcome, SyncReport, SyncService};
