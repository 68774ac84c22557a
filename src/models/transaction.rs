use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Id;

/// A posted transaction linked to its owning account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    /// External ID of the owning account
    pub account_id: Id,
    /// Epoch seconds
    pub posted: i64,
    /// Signed amount as string - negative for debits, positive for credits
    pub amount: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transacted_at: Option<i64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl Transaction {
    pub fn amount_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(self.amount.trim()).ok()
    }
}

/// Outcome of writing a batch of transactions for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionWriteSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Already stored and left untouched
    pub unchanged: usize,
}

impl TransactionWriteSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    pub fn merge(&mut self, other: TransactionWriteSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

/// What to do when a transaction with a known external ID is synced again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionConflictPolicy {
    /// Keep the stored row as first seen.
    #[default]
    Ignore,
    /// Refresh the stored row with the incoming values.
    Overwrite,
}
