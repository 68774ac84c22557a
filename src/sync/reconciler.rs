use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::models::{
    AccountDetails, Id, Transaction, TransactionConflictPolicy, TransactionWriteSummary,
};
use crate::simplefin::{AccountRecord, TransactionRecord};
use crate::storage::Storage;

/// Writes provider accounts and their transactions into storage.
pub struct Reconciler {
    storage: Arc<dyn Storage>,
    policy: TransactionConflictPolicy,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            policy: TransactionConflictPolicy::default(),
        }
    }

    pub fn with_conflict_policy(mut self, policy: TransactionConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn conflict_policy(&self) -> TransactionConflictPolicy {
        self.policy
    }

    /// Insert the account or overwrite the stored row with the same ID.
    pub async fn upsert_account(&self, account: &AccountDetails) -> Result<()> {
        self.storage.upsert_account(account).await?;
        debug!(account_id = %account.id, name = %account.name, "Upserted account");
        Ok(())
    }

    /// Link transactions to their owning account and persist them.
    ///
    /// Transaction IDs are unique: a record seen in an earlier sync never
    /// produces a second row.
    pub async fn associate_transactions(
        &self,
        account_id: &Id,
        records: &[TransactionRecord],
    ) -> Result<TransactionWriteSummary> {
        let txns: Vec<Transaction> = records
            .iter()
            .map(|record| record.to_transaction(account_id))
            .collect();

        let summary = self.storage.save_transactions(&txns, self.policy).await?;
        debug!(
            account_id = %account_id,
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "Associated transactions"
        );
        Ok(summary)
    }

    /// Upsert one account, then associate its embedded transactions.
    pub async fn reconcile(&self, record: &AccountRecord) -> Result<TransactionWriteSummary> {
        self.upsert_account(&record.details).await?;
        self.associate_transactions(record.id(), &record.transactions)
            .await
    }
}
