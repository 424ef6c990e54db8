use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const MISSING_FIELDS_MESSAGE: &str = "Version and downloadUrls are required";

/// Inbound publish payload, as posted to `/api/admin/publish`.
///
/// `download_urls` maps platform name to URL and keeps document order, which
/// becomes the order of the published assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub download_urls: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub mandatory: Option<bool>,
}

impl PublishRequest {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            download_urls: Some(IndexMap::new()),
            ..Default::default()
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    pub fn url(mut self, platform: impl Into<String>, url: impl Into<String>) -> Self {
        self.download_urls
            .get_or_insert_with(IndexMap::new)
            .insert(platform.into(), url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_body() {
        let body = r#"{
            "version": "1.0.3",
            "publishedAt": "2024-01-01T00:00:00.000Z",
            "downloadUrls": {"mac": "m", "win": "w", "linux": "l"},
            "mandatory": true
        }"#;
        let request: PublishRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.version.as_deref(), Some("1.0.3"));
        assert_eq!(request.notes, None);
        assert_eq!(
            request.published_at.as_deref(),
            Some("2024-01-01T00:00:00.000Z")
        );
        let platforms: Vec<&str> = request
            .download_urls
            .as_ref()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(platforms, vec!["mac", "win", "linux"]);
        assert_eq!(request.mandatory, Some(true));
    }

    #[test]
    fn test_nulls_read_as_absent() {
        let request: PublishRequest =
            serde_json::from_str(r#"{"version": "1.0.0", "notes": null, "downloadUrls": null}"#)
                .unwrap();
        assert_eq!(request.notes, None);
        assert_eq!(request.download_urls, None);
    }

    #[test]
    fn test_builder() {
        let request = PublishRequest::new("2.0.0")
            .notes("hello")
            .url("win", "https://a")
            .mandatory(true);
        assert_eq!(request.download_urls.unwrap().len(), 1);
        assert_eq!(request.notes.as_deref(), Some("hello"));
    }
}
