use serde::Deserialize;

/// Default upload limit for category images, in KiB.
pub const DEFAULT_MAX_IMAGE_KB: u64 = 2048;

fn default_max_image_kb() -> u64 {
    DEFAULT_MAX_IMAGE_KB
}

/// Configuration options of the catalog service.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Interface the HTTP server binds to.
    pub address: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Path of the SQLite database file.
    pub database_url: String,
    /// Directory holding uploaded originals and thumbnails.
    pub upload_dir: String,
    /// Largest accepted category image, in KiB.
    #[serde(default = "default_max_image_kb")]
    pub max_image_kb: u64,
    /// Bearer token required on write routes. Unset disables the check.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl ServerConfig {
    /// Upload limit in bytes.
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_kb * 1024
    }
}
