//! SimpleFIN data source: live bridge client plus an on-disk snapshot.

mod cache;
mod client;
mod setup;
mod wire;

pub use cache::SnapshotCache;
pub use client::{split_access_url, SimpleFinClient, SimpleFinCredentials};
pub use setup::{claim_access_url, claim_client, decode_setup_token};
pub use wire::{AccountRecord, AccountSet, TransactionRecord};

use tracing::info;

use crate::error::Result;

/// Anything that can produce a full accounts payload.
#[async_trait::async_trait]
pub trait AccountSource: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    async fn fetch_accounts(&self) -> Result<AccountSet>;
}

/// How [`load_or_fetch`] treats an existing snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Replay the snapshot if one exists; fetch only when it is missing.
    #[default]
    PreferCache,
    /// Always fetch and overwrite the snapshot.
    Refresh,
}

/// Return the cached payload, or fetch a fresh one and cache it.
///
/// With [`LoadMode::PreferCache`] and a snapshot on disk no request is made.
/// A failed fetch leaves the snapshot untouched.
pub async fn load_or_fetch(
    source: &dyn AccountSource,
    cache: &SnapshotCache,
    mode: LoadMode,
) -> Result<AccountSet> {
    if mode == LoadMode::PreferCache {
        if let Some(set) = cache.load().await? {
            return Ok(set);
        }
    }

    info!(source = source.name(), "Fetching accounts from source");
    let set = source.fetch_accounts().await?;
    cache.save(&set).await?;
    Ok(set)
}
