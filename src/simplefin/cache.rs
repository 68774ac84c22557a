use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

use super::AccountSet;

/// Local snapshot of the last `/accounts` payload.
///
/// Lets a process replay a previous fetch without touching the network.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> Result<bool> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| Error::io(&self.path, e))
    }

    /// Read the snapshot. Returns `None` if no snapshot has been written yet.
    pub async fn load(&self) -> Result<Option<AccountSet>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No SimpleFIN snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        let set: AccountSet = serde_json::from_str(&content)
            .map_err(|e| Error::decode(format!("snapshot {}", self.path.display()), e))?;
        info!(
            path = %self.path.display(),
            accounts = set.accounts.len(),
            "Loaded SimpleFIN snapshot"
        );
        Ok(Some(set))
    }

    /// Write the snapshot as pretty-printed JSON.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers never observe a partial snapshot.
    pub async fn save(&self, set: &AccountSet) -> Result<()> {
        let content = serde_json::to_vec_pretty(set)
            .map_err(|e| Error::decode("snapshot payload", e))?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| Error::io(&self.path, std::io::Error::other(e)))??;

        info!(path = %self.path.display(), "Saved SimpleFIN snapshot");
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
    tmp.write_all(content).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}
