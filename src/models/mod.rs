mod account;
mod id;
mod transaction;

pub use account::{Account, AccountDetails};
pub use id::Id;
pub use transaction::{Transaction, TransactionConflictPolicy, TransactionWriteSummary};
