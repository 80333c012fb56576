use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::SnapshotRecord;

/// Append-only snapshot history kept as one JSON array on disk
pub struct SnapshotHistory {
    path: PathBuf,
}

impl SnapshotHistory {
    /// Open (or prepare) the history file inside `dir`, creating the directory if needed
    pub async fn open(dir: &Path, file_name: &str) -> Result<Self> {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).await?;
        }

        Ok(Self {
            path: dir.join(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all stored snapshots.
    ///
    /// Earlier records are returned as raw JSON so older format versions
    /// round-trip untouched. A legacy file holding a single record object is
    /// read as a one-element history. A file that is not valid JSON is moved
    /// aside and history restarts empty.
    pub async fn load(&self) -> Result<Vec<Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(snapshots)) => Ok(snapshots),
            Ok(single) => {
                info!("Converting legacy single-snapshot history to a list");
                Ok(vec![single])
            }
            Err(e) => {
                let quarantine = self.quarantine_path();
                warn!(
                    "History file {} is not valid JSON ({}), moving it to {}",
                    self.path.display(),
                    e,
                    quarantine.display()
                );
                fs::rename(&self.path, &quarantine).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Append one snapshot and return the new snapshot count.
    ///
    /// The full history is written to a sibling temp file, synced, then
    /// renamed over the original so an interrupted write never truncates it.
    pub async fn append(&self, record: &SnapshotRecord) -> Result<usize> {
        let mut snapshots = self.load().await?;
        snapshots.push(serde_json::to_value(record)?);

        let serialized = serde_json::to_vec_pretty(&snapshots)?;
        let tmp_path = self.tmp_path();

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&serialized).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;

        info!(
            "Updated: {} (now contains {} snapshots)",
            self.path.display(),
            snapshots.len()
        );
        Ok(snapshots.len())
    }

    fn tmp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    fn quarantine_path(&self) -> PathBuf {
        sibling(&self.path, &format!("corrupt-{}", Utc::now().timestamp()))
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
