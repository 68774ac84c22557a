//! SimpleFIN `/accounts` response shapes.
//!
//! The same structs are used for the on-disk snapshot, so a cached file
//! decodes exactly like a live response.

use serde::{Deserialize, Serialize};

use crate::models::{AccountDetails, Id, Transaction};

/// Body of `GET /accounts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSet {
    /// Provider-side problems (e.g. an institution needing re-auth).
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl AccountSet {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn transaction_count(&self) -> usize {
        self.accounts.iter().map(|a| a.transactions.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(flatten)]
    pub details: AccountDetails,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

impl AccountRecord {
    pub fn id(&self) -> &Id {
        &self.details.id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Id,
    pub posted: i64,
    pub amount: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transacted_at: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl TransactionRecord {
    /// Attach the record to its owning account.
    pub fn to_transaction(&self, account_id: &Id) -> Transaction {
        Transaction {
            id: self.id.clone(),
            account_id: account_id.clone(),
            posted: self.posted,
            amount: self.amount.clone(),
            description: self.description.clone(),
            transacted_at: self.transacted_at,
            pending: self.pending,
        }
    }
}
