use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Product name used for titles and asset filenames when none is configured.
pub const DEFAULT_PRODUCT_NAME: &str = "NepalBooks";

/// One downloadable artifact of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub platform: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
    #[serde(rename = "name")]
    pub filename: String,
    /// Fields added by hand to the asset entry, kept as they are.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    pub fn new(product: &str, version: &str, platform: &str, url: &str) -> Self {
        Self {
            platform: platform.to_string(),
            url: url.to_string(),
            filename: asset_filename(product, version, platform),
            extra: Map::new(),
        }
    }
}

/// Stored descriptor of one published version.
///
/// Field names on the wire follow the GitHub release layout the desktop
/// client already understands (`tag_name`, `name`, `body`, ...). Any other
/// field found in a stored file is carried through reads, promotion and
/// responses unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "body", default)]
    pub notes: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReleaseRecord {
    /// Build a record, deriving tag, title and asset filenames from `version`.
    ///
    /// Assets keep the iteration order of `urls`.
    pub fn build<I, P, U>(
        product: &str,
        version: &str,
        notes: &str,
        published_at: &str,
        urls: I,
        mandatory: bool,
    ) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: AsRef<str>,
        U: AsRef<str>,
    {
        let assets = urls
            .into_iter()
            .map(|(platform, url)| Asset::new(product, version, platform.as_ref(), url.as_ref()))
            .collect();
        Self {
            version: version.to_string(),
            tag: release_tag(version),
            title: format!("{} {}", product, release_tag(version)),
            notes: notes.to_string(),
            published_at: published_at.to_string(),
            assets,
            mandatory,
            extra: Map::new(),
        }
    }

    /// Fill in `version` for records written without it.
    ///
    /// Uses `key` when given, otherwise strips the leading `v` from the tag.
    pub fn recover_version(&mut self, key: Option<&str>) {
        if !self.version.is_empty() {
            return;
        }
        self.version = match key {
            Some(key) => key.to_string(),
            None => self.tag.strip_prefix('v').unwrap_or(&self.tag).to_string(),
        };
    }

    /// Whether this record describes `version`, judged by its tag.
    pub fn is_tagged(&self, version: &str) -> bool {
        self.tag == release_tag(version)
    }
}

pub fn release_tag(version: &str) -> String {
    format!("v{}", version)
}

/// Conventional installer extension for a platform name.
pub fn platform_extension(platform: &str) -> &'static str {
    match platform {
        "win" => "exe",
        "mac" => "dmg",
        _ => "AppImage",
    }
}

pub fn asset_filename(product: &str, version: &str, platform: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        product,
        version,
        platform,
        platform_extension(platform)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReleaseRecord {
        ReleaseRecord::build(
            DEFAULT_PRODUCT_NAME,
            "1.0.3",
            "Bug fixes",
            "2024-01-01T00:00:00.000Z",
            [
                ("win", "https://dl.example.com/a.exe"),
                ("mac", "https://dl.example.com/a.dmg"),
                ("linux", "https://dl.example.com/a.AppImage"),
            ],
            true,
        )
    }

    #[test]
    fn test_build_derives_display_fields() {
        let record = sample();
        assert_eq!(record.version, "1.0.3");
        assert_eq!(record.tag, "v1.0.3");
        assert_eq!(record.title, "NepalBooks v1.0.3");
        assert_eq!(record.assets.len(), 3);
        assert_eq!(record.assets[0].filename, "NepalBooks-1.0.3-win.exe");
        assert_eq!(record.assets[1].filename, "NepalBooks-1.0.3-mac.dmg");
        assert_eq!(record.assets[2].filename, "NepalBooks-1.0.3-linux.AppImage");
        assert!(record.mandatory);
    }

    #[test]
    fn test_unknown_platform_uses_appimage() {
        assert_eq!(platform_extension("freebsd"), "AppImage");
        assert_eq!(
            asset_filename("NepalBooks", "2.0.0", "freebsd"),
            "NepalBooks-2.0.0-freebsd.AppImage"
        );
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["tag_name"], "v1.0.3");
        assert_eq!(value["name"], "NepalBooks v1.0.3");
        assert_eq!(value["body"], "Bug fixes");
        assert_eq!(value["published_at"], "2024-01-01T00:00:00.000Z");
        assert_eq!(
            value["assets"][0]["browser_download_url"],
            "https://dl.example.com/a.exe"
        );
        assert_eq!(value["assets"][0]["name"], "NepalBooks-1.0.3-win.exe");
        assert_eq!(value["mandatory"], true);
    }

    #[test]
    fn test_recover_version_from_legacy_file() {
        let legacy = r#"{
            "tag_name": "v1.0.1",
            "name": "NepalBooks v1.0.1",
            "body": "",
            "published_at": "2023-05-01T10:00:00.000Z",
            "assets": [],
            "mandatory": false
        }"#;
        let mut record: ReleaseRecord = serde_json::from_str(legacy).unwrap();
        assert!(record.version.is_empty());
        record.recover_version(None);
        assert_eq!(record.version, "1.0.1");

        let mut keyed: ReleaseRecord = serde_json::from_str(legacy).unwrap();
        keyed.recover_version(Some("1.0.1-hotfix"));
        assert_eq!(keyed.version, "1.0.1-hotfix");
        assert!(keyed.is_tagged("1.0.1"));
    }

    #[test]
    fn test_hand_added_fields_survive_roundtrip() {
        let edited = r#"{
            "version": "1.0.0",
            "tag_name": "v1.0.0",
            "name": "NepalBooks v1.0.0",
            "minimumVersion": "0.9.0",
            "assets": [
                {"platform": "win", "browser_download_url": "https://dl/a.exe", "name": "a.exe", "size": 1024}
            ]
        }"#;
        let record: ReleaseRecord = serde_json::from_str(edited).unwrap();
        assert_eq!(record.published_at, "");
        assert_eq!(record.extra["minimumVersion"], "0.9.0");
        assert_eq!(record.assets[0].extra["size"], 1024);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["minimumVersion"], "0.9.0");
        assert_eq!(value["assets"][0]["size"], 1024);
        assert!(value.get("extra").is_none());
    }
}
