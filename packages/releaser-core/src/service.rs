use crate::request::{PublishRequest, MISSING_FIELDS_MESSAGE};
use releaser_config::Settings;
use releaser_store::{
    asset_filename, validate_key, ReleaseError, ReleaseRecord, ReleaseStore, Result,
    DEFAULT_PRODUCT_NAME,
};
use releaser_utils::{compare_versions_desc, now_iso};
use std::sync::Arc;

/// Platforms the admin tool prompts for, in asset order.
pub const ADMIN_PLATFORMS: [&str; 3] = ["win", "mac", "linux"];

/// Result of deleting a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub version: String,
    /// The latest pointer still holds the deleted version and should be
    /// repointed by the operator.
    pub latest_is_stale: bool,
}

/// Publish and query operations over an injected [`ReleaseStore`].
#[derive(Clone)]
pub struct ReleaseService {
    store: Arc<dyn ReleaseStore>,
    product_name: String,
    download_base_url: String,
}

impl ReleaseService {
    pub fn new(store: Arc<dyn ReleaseStore>) -> Self {
        let defaults = Settings::default();
        Self {
            store,
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            download_base_url: defaults.download_base_url,
        }
    }

    pub fn from_settings(store: Arc<dyn ReleaseStore>, settings: &Settings) -> Self {
        Self {
            store,
            product_name: settings.product_name.clone(),
            download_base_url: settings.download_base_url.clone(),
        }
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn ReleaseStore> {
        &self.store
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Validate `request` and turn it into the record that would be stored.
    pub fn build_record(&self, request: &PublishRequest) -> Result<ReleaseRecord> {
        let (version, urls) = match (&request.version, &request.download_urls) {
            (Some(version), Some(urls)) if !version.is_empty() => (version, urls),
            _ => return Err(ReleaseError::Validation(MISSING_FIELDS_MESSAGE.to_string())),
        };
        validate_key(version)?;

        let published_at = request
            .published_at
            .clone()
            .filter(|time| !time.is_empty())
            .unwrap_or_else(now_iso);
        Ok(ReleaseRecord::build(
            &self.product_name,
            version,
            request.notes.as_deref().unwrap_or_default(),
            &published_at,
            urls,
            request.mandatory.unwrap_or(false),
        ))
    }

    /// Store the release under its version and repoint latest at it.
    ///
    /// The two writes are not transactional: if the second fails the version
    /// record exists while latest still names the previous release.
    pub async fn publish(&self, request: PublishRequest) -> Result<String> {
        let record = self.build_record(&request)?;
        self.store.put(&record.version, &record).await?;
        self.store.set_latest(&record).await?;
        tracing::info!(
            version = %record.version,
            assets = record.assets.len(),
            mandatory = record.mandatory,
            "published release"
        );
        Ok(record.version)
    }

    pub async fn latest(&self) -> Result<ReleaseRecord> {
        self.store.get_latest().await
    }

    pub async fn version(&self, version: &str) -> Result<ReleaseRecord> {
        self.store.get(version).await
    }

    /// All per-version records, newest first.
    pub async fn list(&self) -> Result<Vec<(String, ReleaseRecord)>> {
        let mut releases = self.store.list().await?;
        releases.sort_by(|(a, _), (b, _)| compare_versions_desc(a, b));
        Ok(releases)
    }

    pub async fn promote(&self, version: &str) -> Result<ReleaseRecord> {
        let record = self.store.promote(version).await?;
        tracing::info!(version = %version, "promoted release to latest");
        Ok(record)
    }

    /// Delete a release without touching latest, flagging a stale pointer.
    ///
    /// An unreadable latest record fails the call before anything is removed.
    pub async fn delete(&self, version: &str) -> Result<DeleteOutcome> {
        let latest_is_stale = match self.store.get_latest().await {
            Ok(latest) => latest.is_tagged(version),
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                tracing::error!(
                    version = %version,
                    error = %e,
                    "could not read latest release; delete aborted"
                );
                return Err(e);
            }
        };

        self.store.delete(version).await?;
        tracing::info!(version = %version, "deleted release");
        if latest_is_stale {
            tracing::warn!(
                version = %version,
                "deleted the latest release; latest now points at a removed version"
            );
        }
        Ok(DeleteOutcome {
            version: version.to_string(),
            latest_is_stale,
        })
    }

    /// Publish a release from per-platform URLs, as the admin tool does.
    pub async fn create<I>(
        &self,
        version: &str,
        notes: &str,
        urls: I,
        mandatory: bool,
    ) -> Result<String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = PublishRequest::new(version).notes(notes).mandatory(mandatory);
        for (platform, url) in urls {
            request = request.url(platform, url);
        }
        self.publish(request).await
    }

    /// URL suggested for `platform` when the operator leaves it blank.
    pub fn default_download_url(&self, version: &str, platform: &str) -> String {
        format!(
            "{}/{}",
            self.download_base_url.trim_end_matches('/'),
            asset_filename(&self.product_name, version, platform)
        )
    }
}
