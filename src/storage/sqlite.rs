//! SQLite-backed storage.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    AccountDetails, Id, Transaction, TransactionConflictPolicy, TransactionWriteSummary,
};

use super::Storage;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    currency TEXT NOT NULL,
    balance TEXT NOT NULL,
    available_balance TEXT,
    balance_date INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_accounts_name ON accounts(name);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    posted INTEGER NOT NULL,
    amount TEXT NOT NULL,
    description TEXT NOT NULL,
    transacted_at INTEGER,
    pending INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id, posted);
";

const ACCOUNT_COLUMNS: &str = "id, name, currency, balance, available_balance, balance_date";
const TRANSACTION_COLUMNS: &str =
    "id, account_id, posted, amount, description, transacted_at, pending";

const UPSERT_ACCOUNT: &str = "
INSERT INTO accounts (id, name, currency, balance, available_balance, balance_date)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    currency = excluded.currency,
    balance = excluded.balance,
    available_balance = excluded.available_balance,
    balance_date = excluded.balance_date";

const INSERT_TRANSACTION: &str = "
INSERT INTO transactions (id, account_id, posted, amount, description, transacted_at, pending)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const UPDATE_TRANSACTION: &str = "
UPDATE transactions SET
    account_id = ?2,
    posted = ?3,
    amount = ?4,
    description = ?5,
    transacted_at = ?6,
    pending = ?7
WHERE id = ?1";

/// Storage on a single SQLite connection (one writer per process).
///
/// rusqlite is blocking, so every call runs on tokio's blocking pool.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %path.display(), "Opened SQLite database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::StorageTask("connection lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| Error::StorageTask(e.to_string()))?
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountDetails> {
    Ok(AccountDetails {
        id: row.get(0)?,
        name: row.get(1)?,
        currency: row.get(2)?,
        balance: row.get(3)?,
        available_balance: row.get(4)?,
        balance_date: row.get(5)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        posted: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        transacted_at: row.get(5)?,
        pending: row.get(6)?,
    })
}

fn write_transactions(
    conn: &mut Connection,
    txns: &[Transaction],
    policy: TransactionConflictPolicy,
) -> Result<TransactionWriteSummary> {
    let mut summary = TransactionWriteSummary::default();
    let tx = conn.transaction()?;
    {
        let select = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        let mut existing = tx.prepare_cached(&select)?;
        let mut insert = tx.prepare_cached(INSERT_TRANSACTION)?;
        let mut update = tx.prepare_cached(UPDATE_TRANSACTION)?;

        for txn in txns {
            let values = params![
                txn.id,
                txn.account_id,
                txn.posted,
                txn.amount,
                txn.description,
                txn.transacted_at,
                txn.pending,
            ];
            let stored = existing
                .query_row([&txn.id], transaction_from_row)
                .optional()?;
            match (stored, policy) {
                (None, _) => {
                    insert.execute(values)?;
                    summary.inserted += 1;
                }
                (Some(stored), TransactionConflictPolicy::Overwrite) if stored != *txn => {
                    update.execute(values)?;
                    summary.updated += 1;
                }
                (Some(_), _) => summary.unchanged += 1,
            }
        }
    }
    tx.commit()?;
    Ok(summary)
}

#[async_trait::async_trait]
impl Storage for SqliteStorage {
    async fn upsert_account(&self, account: &AccountDetails) -> Result<()> {
        let account = account.clone();
        self.with_conn(move |conn| {
            conn.execute(
                UPSERT_ACCOUNT,
                params![
                    account.id,
                    account.name,
                    account.currency,
                    account.balance,
                    account.available_balance,
                    account.balance_date,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_account(&self, id: &Id) -> Result<Option<AccountDetails>> {
        let id = id.clone();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
            Ok(conn.query_row(&sql, [&id], account_from_row).optional()?)
        })
        .await
    }

    async fn find_accounts_by_name(&self, name: &str) -> Result<Vec<AccountDetails>> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let sql =
                format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE name = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([&name], account_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountDetails>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY name, id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], account_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn get_transactions(&self, account_id: &Id) -> Result<Vec<Transaction>> {
        let account_id = account_id.clone();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE account_id = ?1 ORDER BY posted, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([&account_id], transaction_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn save_transactions(
        &self,
        txns: &[Transaction],
        policy: TransactionConflictPolicy,
    ) -> Result<TransactionWriteSummary> {
        if txns.is_empty() {
            return Ok(TransactionWriteSummary::default());
        }
        let txns = txns.to_vec();
        self.with_conn(move |conn| write_transactions(conn, &txns, policy))
            .await
    }

    async fn count_transactions(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT count(*) FROM transactions", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}
