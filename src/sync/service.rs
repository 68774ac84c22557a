use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::TrackedAccounts;
use crate::error::Result;
use crate::models::{Id, TransactionConflictPolicy, TransactionWriteSummary};
use crate::simplefin::{load_or_fetch, AccountSet, AccountSource, LoadMode, SnapshotCache};
use crate::storage::Storage;

use super::filter::{filter_tracked, unmatched_tracked};
use super::Reconciler;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSyncOutcome {
    pub account_id: Id,
    pub name: String,
    pub transactions: TransactionWriteSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSyncFailure {
    pub account_id: Id,
    pub name: String,
    pub error: String,
}

/// Summary of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Errors reported by the provider alongside the payload
    pub upstream_errors: Vec<String>,
    pub fetched_accounts: usize,
    /// Accounts dropped by the tracked filter
    pub skipped: usize,
    pub synced: Vec<AccountSyncOutcome>,
    pub failures: Vec<AccountSyncFailure>,
}

impl SyncReport {
    pub fn transactions(&self) -> TransactionWriteSummary {
        let mut total = TransactionWriteSummary::default();
        for outcome in &self.synced {
            total.merge(outcome.transactions);
        }
        total
    }

    /// No account failed to persist.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives one pass of load, filter and reconcile.
pub struct SyncService {
    source: Arc<dyn AccountSource>,
    cache: SnapshotCache,
    tracked: TrackedAccounts,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    pub fn new(
        source: Arc<dyn AccountSource>,
        cache: SnapshotCache,
        storage: Arc<dyn Storage>,
        tracked: TrackedAccounts,
    ) -> Self {
        Self {
            source,
            cache,
            tracked,
            reconciler: Reconciler::new(storage),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_conflict_policy(mut self, policy: TransactionConflictPolicy) -> Self {
        self.reconciler = self.reconciler.with_conflict_policy(policy);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tracked(&self) -> &TrackedAccounts {
        &self.tracked
    }

    /// Load a payload (cache or live per `mode`) and persist its tracked
    /// accounts.
    ///
    /// Failing to obtain a payload is an error. Failing to persist one
    /// account is recorded in the report and the rest continue.
    pub async fn sync(&self, mode: LoadMode) -> Result<SyncReport> {
        let started_at = self.clock.now();
        let set = load_or_fetch(self.source.as_ref(), &self.cache, mode).await?;
        let mut report = self.sync_payload(&set).await;
        report.started_at = started_at;
        Ok(report)
    }

    /// Persist the tracked accounts of an already loaded payload.
    pub async fn sync_payload(&self, set: &AccountSet) -> SyncReport {
        let started_at = self.clock.now();

        for error in &set.errors {
            warn!(error = %error, "Provider reported an error");
        }
        if self.tracked.is_empty() {
            warn!("No tracked accounts configured; nothing will be stored");
        }

        let tracked = filter_tracked(&set.accounts, &self.tracked);
        for missing in unmatched_tracked(&set.accounts, &self.tracked) {
            warn!(tracked = %missing, "Tracked account not present in payload");
        }

        let mut synced = Vec::with_capacity(tracked.len());
        let mut failures = Vec::new();
        for record in &tracked {
            match self.reconciler.reconcile(record).await {
                Ok(transactions) => synced.push(AccountSyncOutcome {
                    account_id: record.id().clone(),
                    name: record.name().to_string(),
                    transactions,
                }),
                Err(err) => {
                    warn!(
                        account_id = %record.id(),
                        name = record.name(),
                        error = %err,
                        "Failed to store account"
                    );
                    failures.push(AccountSyncFailure {
                        account_id: record.id().clone(),
                        name: record.name().to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let report = SyncReport {
            started_at,
            finished_at: self.clock.now(),
            upstream_errors: set.errors.clone(),
            fetched_accounts: set.accounts.len(),
            skipped: set.accounts.len() - tracked.len(),
            synced,
            failures,
        };

        let totals = report.transactions();
        info!(
            fetched = report.fetched_accounts,
            synced = report.synced.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            inserted = totals.inserted,
            updated = totals.updated,
            "Sync finished"
        );
        report
    }
}
