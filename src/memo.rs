//! Persisted outputs keyed by the input configuration.

use sha2::{Digest, Sha256};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::output::Output;
use crate::TARGET_MEMO;

/// The part of the input that decides what a run produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub region_codes: Vec<String>,
    pub include_rare: bool,
}

impl MemoKey {
    pub fn new(region_codes: &[String], include_rare: bool) -> Self {
        Self {
            region_codes: region_codes.to_vec(),
            include_rare,
        }
    }

    /// Stable hex SHA-256 of the key. Region codes are length-prefixed so
    /// `["AB", "C"]` and `["A", "BC"]` hash differently.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.region_codes.len() as u64).to_le_bytes());
        for code in &self.region_codes {
            hasher.update((code.len() as u64).to_le_bytes());
            hasher.update(code.as_bytes());
        }
        hasher.update([u8::from(self.include_rare)]);
        format!("{:x}", hasher.finalize())
    }
}

/// Keyed storage for whole outputs. `read` reports a missing entry as
/// `Ok(None)`, distinct from a failure to read.
pub trait MemoStore: Send + Sync {
    fn read(
        &self,
        key: &MemoKey,
    ) -> impl Future<Output = Result<Option<Output>, StoreError>> + Send;

    fn write(
        &self,
        key: &MemoKey,
        output: &Output,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// One pretty-printed JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileMemoStore {
    dir: PathBuf,
}

impl FileMemoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &MemoKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl MemoStore for FileMemoStore {
    async fn read(&self, key: &MemoKey) -> Result<Option<Output>, StoreError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(target: TARGET_MEMO, "No memoized output at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(io_error(&path, err)),
        };

        let output = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Serde { path: path.clone(), source })?;
        debug!(target: TARGET_MEMO, "Read memoized output from {}", path.display());
        Ok(Some(output))
    }

    /// Written to a sibling temporary file first and renamed into place, so a
    /// reader never sees a partial entry.
    async fn write(&self, key: &MemoKey, output: &Output) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec_pretty(output)
            .map_err(|source| StoreError::Serde { path: path.clone(), source })?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| io_error(&self.dir, err))?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, &bytes)
            .await
            .map_err(|err| io_error(&staging, err))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|err| io_error(&path, err))?;

        info!(target: TARGET_MEMO, "Memoized output to {}", path.display());
        Ok(())
    }
}
