mod support;

use std::time::Duration;

use anyhow::Result;
use budget_tool::config::SimpleFinConfig;
use budget_tool::simplefin::{load_or_fetch, LoadMode, SimpleFinClient, SnapshotCache};
use secrecy::SecretString;
use support::{sample_set, StaticSource};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, max_retries: u32) -> Result<SimpleFinClient> {
    let config = SimpleFinConfig {
        max_retries,
        retry_backoff: Duration::from_millis(5),
        ..SimpleFinConfig::default()
    };
    let url = SecretString::from(format!("{}/simplefin", server.uri()));
    Ok(SimpleFinClient::new(&url, config)?)
}

#[tokio::test]
async fn existing_snapshot_is_replayed_without_network() -> Result<()> {
    let server = MockServer::start().await;
    let dir = TempDir::new()?;
    let cache = SnapshotCache::new(dir.path().join("simplefin.json"));
    cache.save(&sample_set()).await?;

    let client = client_for(&server, 0)?;
    let set = load_or_fetch(&client, &cache, LoadMode::PreferCache).await?;

    assert_eq!(set, sample_set());
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "expected no HTTP requests");
    Ok(())
}

#[tokio::test]
async fn missing_snapshot_is_fetched_and_written() -> Result<()> {
    let server = MockServer::start().await;
    let body = r#"{"errors": [], "accounts": [
        {"id": "ACT-9", "name": "Travel Card", "currency": "USD",
         "balance": "-42.00", "balance-date": 1700000000, "transactions": []}
    ]}"#;
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let cache = SnapshotCache::new(dir.path().join("nested").join("simplefin.json"));
    let client = client_for(&server, 0)?;

    let fetched = load_or_fetch(&client, &cache, LoadMode::PreferCache).await?;
    assert_eq!(fetched.accounts[0].name(), "Travel Card");
    assert!(cache.exists().await?);

    // Second call replays the file; the mock's expect(1) guards the count.
    let replayed = load_or_fetch(&client, &cache, LoadMode::PreferCache).await?;
    assert_eq!(replayed, fetched);
    Ok(())
}

#[tokio::test]
async fn refresh_mode_overwrites_the_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let cache = SnapshotCache::new(dir.path().join("simplefin.json"));
    cache.save(&Default::default()).await?;

    let source = StaticSource::new(sample_set());
    let set = load_or_fetch(&source, &cache, LoadMode::Refresh).await?;

    assert_eq!(source.calls(), 1);
    assert_eq!(set.accounts.len(), 3);
    assert_eq!(cache.load().await?, Some(sample_set()));
    Ok(())
}

#[tokio::test]
async fn failed_fetch_leaves_no_snapshot() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let cache = SnapshotCache::new(dir.path().join("simplefin.json"));
    let client = client_for(&server, 1)?;

    assert!(load_or_fetch(&client, &cache, LoadMode::PreferCache)
        .await
        .is_err());
    assert!(!cache.exists().await?);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let cache = SnapshotCache::new(dir.path().join("simplefin.json"));
    cache.save(&sample_set()).await?;
    let client = client_for(&server, 0)?;

    assert!(load_or_fetch(&client, &cache, LoadMode::Refresh).await.is_err());
    assert_eq!(cache.load().await?, Some(sample_set()));
    Ok(())
}

#[tokio::test]
async fn corrupt_snapshot_is_reported_not_refetched() -> Result<()> {
    let dir = TempDir::new()?;
    let snapshot = dir.path().join("simplefin.json");
    std::fs::write(&snapshot, "{ not json")?;
    let cache = SnapshotCache::new(&snapshot);
    let source = StaticSource::new(sample_set());

    let err = load_or_fetch(&source, &cache, LoadMode::PreferCache)
        .await
        .unwrap_err();

    assert!(matches!(err, budget_tool::Error::Decode { .. }));
    assert_eq!(source.calls(), 0);
    Ok(())
}
