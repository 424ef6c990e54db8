use crate::error::{ReleaseError, Result};
use crate::record::ReleaseRecord;
use crate::{lookup_key, validate_key, ReleaseStore, LATEST_KEY};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = ".json";

/// Directory-backed store: one pretty-printed `{version}.json` per release plus
/// `latest.json`, all safe to inspect and edit by hand.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the directory if needed and return a store rooted there.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        tokio::fs::create_dir_all(&store.dir)
            .await
            .map_err(|e| ReleaseError::io(&store.dir, e))?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, RECORD_EXTENSION))
    }

    async fn read_record(&self, key: &str) -> Result<Option<ReleaseRecord>> {
        let path = self.record_path(key);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ReleaseError::io(path, e)),
        };
        let mut record: ReleaseRecord = serde_json::from_slice(&content)
            .map_err(|source| ReleaseError::Malformed { path, source })?;
        let hint = if key == LATEST_KEY { None } else { Some(key) };
        record.recover_version(hint);
        Ok(Some(record))
    }

    /// Serialize `record` to a uniquely named hidden sibling file, then rename
    /// it over the target so readers never observe a half-written record and
    /// concurrent writers of one key never share a temporary file.
    async fn write_record(&self, key: &str, record: &ReleaseRecord) -> Result<()> {
        let mut json = serde_json::to_string_pretty(record)?;
        json.push('\n');

        let dir = self.dir.clone();
        let path = self.record_path(key);
        let target = path.clone();
        let prefix = format!(".{}{}.", key, RECORD_EXTENSION);
        tokio::task::spawn_blocking(move || {
            let mut tmp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&dir)
                .map_err(|e| ReleaseError::io(&dir, e))?;
            tmp.write_all(json.as_bytes())
                .map_err(|e| ReleaseError::io(tmp.path(), e))?;
            tmp.persist(&target)
                .map_err(|e| ReleaseError::io(&target, e.error))?;
            Ok::<(), ReleaseError>(())
        })
        .await
        .map_err(|e| ReleaseError::io(&path, io::Error::other(e)))??;

        tracing::debug!(path = %path.display(), "wrote release record");
        Ok(())
    }
}

#[async_trait]
impl ReleaseStore for FileStore {
    async fn put(&self, version: &str, record: &ReleaseRecord) -> Result<()> {
        validate_key(version)?;
        self.write_record(version, record).await
    }

    async fn get(&self, version: &str) -> Result<ReleaseRecord> {
        lookup_key(version)?;
        self.read_record(version)
            .await?
            .ok_or_else(|| ReleaseError::not_found(version))
    }

    async fn list(&self) -> Result<Vec<(String, ReleaseRecord)>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReleaseError::io(&self.dir, e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ReleaseError::io(&self.dir, e))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(key) = file_name.strip_suffix(RECORD_EXTENSION) else {
                continue;
            };
            if key == LATEST_KEY || validate_key(key).is_err() {
                continue;
            }
            // A file removed between read_dir and read is simply skipped.
            if let Some(record) = self.read_record(key).await? {
                records.push((key.to_string(), record));
            }
        }
        Ok(records)
    }

    async fn delete(&self, version: &str) -> Result<()> {
        lookup_key(version)?;
        let path = self.record_path(version);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed release record");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ReleaseError::not_found(version)),
            Err(e) => Err(ReleaseError::io(path, e)),
        }
    }

    async fn get_latest(&self) -> Result<ReleaseRecord> {
        self.read_record(LATEST_KEY)
            .await?
            .ok_or_else(|| ReleaseError::not_found(LATEST_KEY))
    }

    async fn set_latest(&self, record: &ReleaseRecord) -> Result<()> {
        self.write_record(LATEST_KEY, record).await
    }
}
