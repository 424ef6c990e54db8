pub mod error;
pub mod file;
pub mod memory;
pub mod record;

use async_trait::async_trait;

pub use error::{ErrorKind, ReleaseError, Result};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{asset_filename, platform_extension, Asset, ReleaseRecord, DEFAULT_PRODUCT_NAME};

/// Reserved key of the latest pointer record.
pub const LATEST_KEY: &str = "latest";

/// Durable key-value namespace of release records keyed by version.
///
/// The `latest` slot is separate from the per-version records: it holds a copy
/// of whatever record was last written to it and is never derived from them.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Write or fully replace the record under `version`.
    async fn put(&self, version: &str, record: &ReleaseRecord) -> Result<()>;

    async fn get(&self, version: &str) -> Result<ReleaseRecord>;

    /// Every per-version record with its key, in no particular order.
    async fn list(&self) -> Result<Vec<(String, ReleaseRecord)>>;

    /// Remove the record under `version`. The latest slot is left untouched.
    async fn delete(&self, version: &str) -> Result<()>;

    async fn get_latest(&self) -> Result<ReleaseRecord>;

    async fn set_latest(&self, record: &ReleaseRecord) -> Result<()>;

    /// Copy the record stored under `version` into the latest slot.
    async fn promote(&self, version: &str) -> Result<ReleaseRecord> {
        let record = self.get(version).await?;
        self.set_latest(&record).await?;
        Ok(record)
    }
}

/// Check that `version` can be used as a store key.
pub fn validate_key(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(ReleaseError::Validation("Version must not be empty".into()));
    }
    if version == LATEST_KEY {
        return Err(ReleaseError::Validation(format!(
            "Version `{}` is reserved",
            LATEST_KEY
        )));
    }
    if version.starts_with('.') || version.contains(['/', '\\', '\0']) {
        return Err(ReleaseError::Validation(format!(
            "Invalid version key: {}",
            version
        )));
    }
    Ok(())
}

/// Key check for reads and deletes: an unusable key can hold no record.
pub(crate) fn lookup_key(version: &str) -> Result<()> {
    validate_key(version).map_err(|_| ReleaseError::not_found(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("1.0.3").is_ok());
        assert!(validate_key("2.0.0-beta.1").is_ok());
        for bad in ["", "latest", "../etc/passwd", "a/b", "a\\b", ".hidden"] {
            let err = validate_key(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "key {:?}", bad);
        }
    }

    #[test]
    fn test_lookup_key_reports_not_found() {
        assert!(lookup_key("latest").unwrap_err().is_not_found());
        assert!(lookup_key("1.0.0").is_ok());
    }
}
