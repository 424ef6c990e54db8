use releaser_store::DEFAULT_PRODUCT_NAME;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::lookup_host;

pub const CONFIG_FILE_NAME: &str = "releaser.json";
pub const DEFAULT_PORT: u16 = 3005;

/// Runtime settings shared by the server and the admin tool.
///
/// Resolution order: built-in defaults, then an optional JSON file, then
/// environment variables, then command-line flags (applied by the binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Directory holding `{version}.json` and `latest.json`.
    pub releases_dir: PathBuf,
    /// Directory served as static files (installers live under `downloads/`).
    pub public_dir: PathBuf,
    pub product_name: String,
    /// Prefix for the download URLs the admin tool suggests.
    pub download_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            releases_dir: PathBuf::from("releases"),
            public_dir: PathBuf::from("public"),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            download_base_url: format!("http://localhost:{}/downloads", DEFAULT_PORT),
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when it is absent.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn apply_env(&mut self) -> Result<&mut Self, Box<dyn Error + Send + Sync>> {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Override fields from `PORT`, `HOST`, `RELEASES_DIR`, `PUBLIC_DIR`,
    /// `PRODUCT_NAME` and `DOWNLOAD_BASE_URL` as reported by `lookup`.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<&mut Self, Box<dyn Error + Send + Sync>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| format!("Invalid PORT value: {}", port))?;
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(dir) = lookup("RELEASES_DIR") {
            self.releases_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PUBLIC_DIR") {
            self.public_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("PRODUCT_NAME") {
            self.product_name = name;
        }
        if let Some(url) = lookup("DOWNLOAD_BASE_URL") {
            self.download_base_url = url;
        }
        Ok(self)
    }

    /// Resolve `host:port` to the first address it names. `host` may be an IP
    /// literal or a name such as `localhost`.
    pub async fn socket_addr(&self) -> Result<SocketAddr, Box<dyn Error + Send + Sync>> {
        let addr = format!("{}:{}", self.host, self.port);
        let mut resolved = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| format!("Invalid listen address {}: {}", addr, e))?;
        resolved
            .next()
            .ok_or_else(|| format!("Listen address {} resolved to nothing", addr).into())
    }
}
