use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Id, Transaction};

/// Fields of a provider account as they are persisted.
///
/// Field names on the wire follow the SimpleFIN account object, so the same
/// struct is flattened into the cached API payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub id: Id,
    pub name: String,
    pub currency: String,
    /// Decimal as string to avoid floating point drift
    pub balance: String,
    #[serde(
        rename = "available-balance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub available_balance: Option<String>,
    /// Epoch seconds
    #[serde(rename = "balance-date")]
    pub balance_date: i64,
}

/// A tracked account together with the transactions attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    #[serde(flatten)]
    details: AccountDetails,
    transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(details: AccountDetails) -> Self {
        Self {
            details,
            transactions: Vec::new(),
        }
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn details(&self) -> &AccountDetails {
        &self.details
    }

    pub fn into_details(self) -> AccountDetails {
        self.details
    }

    pub fn id(&self) -> &Id {
        &self.details.id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn currency(&self) -> &str {
        &self.details.currency
    }

    pub fn balance(&self) -> &str {
        &self.details.balance
    }

    pub fn available_balance(&self) -> Option<&str> {
        self.details.available_balance.as_deref()
    }

    pub fn balance_date(&self) -> i64 {
        self.details.balance_date
    }

    /// Balance timestamp, if the epoch value is representable.
    pub fn balance_as_of(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.details.balance_date, 0)
    }

    /// Parsed balance; `None` if the provider sent something non-numeric.
    pub fn balance_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(self.details.balance.trim()).ok()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

impl From<AccountDetails> for Account {
    fn from(details: AccountDetails) -> Self {
        Self::new(details)
    }
}
