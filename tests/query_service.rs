mod support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use budget_tool::config::{DisplayConfig, TrackedAccounts};
use budget_tool::format::{account_summary, to_pretty_json};
use budget_tool::query::AccountService;
use budget_tool::simplefin::{AccountSet, SnapshotCache};
use budget_tool::storage::SqliteStorage;
use budget_tool::sync::SyncService;
use budget_tool::Error;
use support::{account, sample_set, tracked_names, FailingSource};
use tempfile::TempDir;

async fn synced_db(
    dir: &TempDir,
    set: &AccountSet,
    tracked: TrackedAccounts,
) -> Result<Arc<SqliteStorage>> {
    let storage = Arc::new(SqliteStorage::open(
        &dir.path().join("budget.db"),
        Duration::from_secs(1),
    )?);
    let service = SyncService::new(
        Arc::new(FailingSource),
        SnapshotCache::new(dir.path().join("simplefin.json")),
        storage.clone(),
        tracked,
    );
    let report = service.sync_payload(set).await;
    assert!(report.is_clean());
    Ok(storage)
}

#[tokio::test]
async fn account_by_name_with_transactions() -> Result<()> {
    let dir = TempDir::new()?;
    let tracked = TrackedAccounts::from_names(tracked_names());
    let storage = synced_db(&dir, &sample_set(), tracked).await?;
    let service = AccountService::new(storage);

    let checking = service.get_account_by_name("Checking").await?;
    assert_eq!(checking.id().as_str(), "ACT-1");
    assert!(checking.transactions().is_empty());

    let checking = service.get_account_transactions(checking).await?;
    let descriptions: Vec<&str> = checking
        .transactions()
        .iter()
        .map(|t| t.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Coffee Shop", "Payroll"]);
    assert!(checking
        .transactions()
        .iter()
        .all(|t| t.account_id == *checking.id()));
    Ok(())
}

#[tokio::test]
async fn untracked_and_unknown_names_are_not_found() -> Result<()> {
    let dir = TempDir::new()?;
    let tracked = TrackedAccounts::from_names(tracked_names());
    let storage = synced_db(&dir, &sample_set(), tracked).await?;
    let service = AccountService::new(storage);

    for name in ["Nonexistent", "Brokerage", "checking"] {
        let err = service.get_account_by_name(name).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{name}: {err}");
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_display_names_are_ambiguous() -> Result<()> {
    let dir = TempDir::new()?;
    let set = AccountSet {
        errors: Vec::new(),
        accounts: vec![
            account("ACT-B", "Credit Card", "-10.00"),
            account("ACT-A", "Credit Card", "-20.00"),
        ],
    };
    let storage = synced_db(&dir, &set, TrackedAccounts::from_names(["Credit Card"])).await?;
    let service = AccountService::new(storage);

    let err = service.get_account_by_name("Credit Card").await.unwrap_err();
    match err {
        Error::AmbiguousName { name, ids } => {
            assert_eq!(name, "Credit Card");
            assert_eq!(ids, vec!["ACT-A", "ACT-B"]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn rendered_account_matches_stored_data() -> Result<()> {
    let dir = TempDir::new()?;
    let tracked = TrackedAccounts::from_names(["Savings"]);
    let storage = synced_db(&dir, &sample_set(), tracked).await?;
    let service = AccountService::new(storage);

    let savings = service.get_account_by_name("Savings").await?;
    let savings = service.get_account_transactions(savings).await?;

    let text = account_summary(&savings, &DisplayConfig::default());
    assert!(text.starts_with("Account Savings (ACT-2): Balance: 5,000.00 USD\n"));
    assert!(text.contains("  - Interest: 10.00 on 2023-11-14"));

    let json: serde_json::Value = serde_json::from_str(&to_pretty_json(&savings)?)?;
    assert_eq!(json["id"], "ACT-2");
    assert_eq!(json["balance-date"], 1_700_000_000);
    assert_eq!(json["transactions"][0]["id"], "TRN-3");
    Ok(())
}
