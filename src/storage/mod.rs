mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::Result;
use crate::models::{
    AccountDetails, Id, Transaction, TransactionConflictPolicy, TransactionWriteSummary,
};

/// Persistence for synced accounts and transactions.
///
/// Accounts and transactions are both keyed by their provider ID.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // Accounts
    /// Insert the account, or overwrite every field of the existing row.
    async fn upsert_account(&self, account: &AccountDetails) -> Result<()>;
    async fn get_account(&self, id: &Id) -> Result<Option<AccountDetails>>;
    async fn find_accounts_by_name(&self, name: &str) -> Result<Vec<AccountDetails>>;
    /// All accounts, ordered by name then ID.
    async fn list_accounts(&self) -> Result<Vec<AccountDetails>>;

    // Transactions
    /// Transactions owned by an account, ordered by posted time then ID.
    async fn get_transactions(&self, account_id: &Id) -> Result<Vec<Transaction>>;
    /// Write a batch atomically. Known IDs are handled per `policy`.
    async fn save_transactions(
        &self,
        txns: &[Transaction],
        policy: TransactionConflictPolicy,
    ) -> Result<TransactionWriteSummary>;
    async fn count_transactions(&self) -> Result<usize>;
}
