#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use budget_tool::models::{
    AccountDetails, Id, Transaction, TransactionConflictPolicy, TransactionWriteSummary,
};
use budget_tool::simplefin::{AccountRecord, AccountSet, AccountSource, TransactionRecord};
use budget_tool::storage::{MemoryStorage, Storage};
use budget_tool::{Error, Result};

pub fn account(id: &str, name: &str, balance: &str) -> AccountRecord {
    AccountRecord {
        details: AccountDetails {
            id: Id::from(id),
            name: name.to_string(),
            currency: "USD".to_string(),
            balance: balance.to_string(),
            available_balance: None,
            balance_date: 1_700_000_000,
        },
        transactions: Vec::new(),
    }
}

pub fn txn(id: &str, posted: i64, amount: &str, description: &str) -> TransactionRecord {
    TransactionRecord {
        id: Id::from(id),
        posted,
        amount: amount.to_string(),
        description: description.to_string(),
        transacted_at: None,
        pending: false,
    }
}

/// Three accounts, two of them named in [`tracked_names`].
pub fn sample_set() -> AccountSet {
    let mut checking = account("ACT-1", "Checking", "100.00");
    checking.transactions = vec![
        txn("TRN-1", 1_700_000_000, "-12.50", "Coffee Shop"),
        txn("TRN-2", 1_700_086_400, "2500.00", "Payroll"),
    ];
    let mut savings = account("ACT-2", "Savings", "5000.00");
    savings.transactions = vec![txn("TRN-3", 1_700_000_100, "10.00", "Interest")];
    let mut brokerage = account("ACT-3", "Brokerage", "75000.00");
    brokerage.transactions = vec![txn("TRN-4", 1_700_000_200, "-1.00", "Fee")];

    AccountSet {
        errors: Vec::new(),
        accounts: vec![checking, savings, brokerage],
    }
}

pub fn tracked_names() -> [&'static str; 2] {
    ["Checking", "Savings"]
}

/// Serves a fixed payload and counts how often it was asked.
pub struct StaticSource {
    set: AccountSet,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(set: AccountSet) -> Self {
        Self {
            set,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_accounts(&self) -> Result<AccountSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.set.clone())
    }
}

/// Always fails like an unreachable bridge.
pub struct FailingSource;

#[async_trait]
impl AccountSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_accounts(&self) -> Result<AccountSet> {
        Err(Error::Http {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

/// Memory storage that refuses writes for one account.
pub struct FlakyStorage {
    inner: MemoryStorage,
    broken: Id,
}

impl FlakyStorage {
    pub fn new(broken: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::new(),
            broken: Id::from(broken),
        })
    }

    fn refuse(&self) -> Error {
        Error::Storage(rusqlite::Error::InvalidQuery)
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn upsert_account(&self, account: &AccountDetails) -> Result<()> {
        if account.id == self.broken {
            return Err(self.refuse());
        }
        self.inner.upsert_account(account).await
    }

    async fn get_account(&self, id: &Id) -> Result<Option<AccountDetails>> {
        self.inner.get_account(id).await
    }

    async fn find_accounts_by_name(&self, name: &str) -> Result<Vec<AccountDetails>> {
        self.inner.find_accounts_by_name(name).await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>> {
        self.inner.list_accounts().await
    }

    async fn get_transactions(&self, account_id: &Id) -> Result<Vec<Transaction>> {
        self.inner.get_transactions(account_id).await
    }

    async fn save_transactions(
        &self,
        txns: &[Transaction],
        policy: TransactionConflictPolicy,
    ) -> Result<TransactionWriteSummary> {
        self.inner.save_transactions(txns, policy).await
    }

    async fn count_transactions(&self) -> Result<usize> {
        self.inner.count_transactions().await
    }
}
