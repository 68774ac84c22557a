// src/storage/memory.rs
//! In-memory storage implementation for testing.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{
    AccountDetails, Id, Transaction, TransactionConflictPolicy, TransactionWriteSummary,
};

use super::Storage;

/// In-memory storage for testing purposes.
///
/// Mirrors the SQLite semantics: unique provider IDs and transactions that
/// must reference a stored account.
pub struct MemoryStorage {
    accounts: Mutex<HashMap<Id, AccountDetails>>,
    transactions: Mutex<HashMap<Id, Transaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            transactions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn upsert_account(&self, account: &AccountDetails) -> Result<()> {
        let mut accounts = self.accounts.lock().await;
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, id: &Id) -> Result<Option<AccountDetails>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(id).cloned())
    }

    async fn find_accounts_by_name(&self, name: &str) -> Result<Vec<AccountDetails>> {
        let accounts = self.accounts.lock().await;
        let mut found: Vec<AccountDetails> = accounts
            .values()
            .filter(|a| a.name == name)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>> {
        let accounts = self.accounts.lock().await;
        let mut all: Vec<AccountDetails> = accounts.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_transactions(&self, account_id: &Id) -> Result<Vec<Transaction>> {
        let txns = self.transactions.lock().await;
        let mut owned: Vec<Transaction> = txns
            .values()
            .filter(|t| &t.account_id == account_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.posted.cmp(&b.posted).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn save_transactions(
        &self,
        new_txns: &[Transaction],
        policy: TransactionConflictPolicy,
    ) -> Result<TransactionWriteSummary> {
        let accounts = self.accounts.lock().await;
        if let Some(orphan) = new_txns
            .iter()
            .find(|t| !accounts.contains_key(&t.account_id))
        {
            return Err(Error::NotFound(orphan.account_id.to_string()));
        }

        let mut txns = self.transactions.lock().await;
        let mut summary = TransactionWriteSummary::default();
        for txn in new_txns {
            let changed = txns.get(&txn.id).map(|stored| stored != txn);
            match (changed, policy) {
                (None, _) => {
                    txns.insert(txn.id.clone(), txn.clone());
                    summary.inserted += 1;
                }
                (Some(true), TransactionConflictPolicy::Overwrite) => {
                    txns.insert(txn.id.clone(), txn.clone());
                    summary.updated += 1;
                }
                (Some(_), _) => summary.unchanged += 1,
            }
        }

        Ok(summary)
    }

    async fn count_transactions(&self) -> Result<usize> {
        let txns = self.transactions.lock().await;
        Ok(txns.len())
    }
}
