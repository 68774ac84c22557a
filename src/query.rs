//! Read-side lookups over stored accounts.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Account, Id};
use crate::storage::Storage;

pub struct AccountService {
    storage: Arc<dyn Storage>,
}

impl AccountService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Look up the single stored account with this exact display name.
    ///
    /// The result carries no transactions; see
    /// [`AccountService::get_account_transactions`].
    pub async fn get_account_by_name(&self, name: &str) -> Result<Account> {
        let mut matches = self.storage.find_accounts_by_name(name).await?;

        match matches.len() {
            0 => Err(Error::NotFound(name.to_string())),
            1 => Ok(Account::from(matches.remove(0))),
            _ => Err(Error::AmbiguousName {
                name: name.to_string(),
                ids: matches.iter().map(|a| a.id.to_string()).collect(),
            }),
        }
    }

    pub async fn get_account(&self, id: &Id) -> Result<Account> {
        self.storage
            .get_account(id)
            .await?
            .map(Account::from)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Attach every stored transaction belonging to `account`.
    ///
    /// Transactions already on the value are replaced, so the result never
    /// holds duplicates.
    pub async fn get_account_transactions(&self, account: Account) -> Result<Account> {
        let transactions = self.storage.get_transactions(account.id()).await?;
        Ok(account.with_transactions(transactions))
    }

    /// Every stored account with its transactions, ordered by name.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let details = self.storage.list_accounts().await?;
        let mut accounts = Vec::with_capacity(details.len());
        for detail in details {
            let transactions = self.storage.get_transactions(&detail.id).await?;
            accounts.push(Account::new(detail).with_transactions(transactions));
        }
        Ok(accounts)
    }
}
