//! # Store Configuration
//!
//! Where the cart is stored and which fallbacks new line items get.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TUNDRA_STORAGE_KEY=shop_cart                                       │
//! │     TUNDRA_DATA_DIR=/var/lib/tundra                                    │
//! │     TUNDRA_PLACEHOLDER_IMAGE=/img/none.png                             │
//! │     TUNDRA_FALLBACK_TITLE="Mystery Item"                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tundra-cart/cart.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tundra.cart/cart.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     key "tundra_cart", platform data dir, built-in fallbacks           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! storage_key = "tundra_cart"
//! data_dir = "/home/me/.local/share/tundra-cart"
//!
//! [item_defaults]
//! title = "Untitled Product"
//! image = "/images/placeholder.jpg"
//! description = ""
//! ```

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tundra_core::{ItemDefaults, DEFAULT_STORAGE_KEY};

use crate::error::{StoreError, StoreResult};

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key the whole cart is written under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory for file-backed storage. `None` means the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Fallbacks for products that arrive without title/image/description.
    #[serde(default)]
    pub item_defaults: ItemDefaults,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            storage_key: default_storage_key(),
            data_dir: None,
            item_defaults: ItemDefaults::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> StoreResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.storage_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "storage_key must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory file-backed storage should use.
    pub fn resolved_data_dir(&self) -> StoreResult<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .ok_or_else(|| StoreError::InvalidConfig("Could not determine data directory".into()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TUNDRA_STORAGE_KEY") {
            debug!(storage_key = %key, "Overriding storage key from environment");
            self.storage_key = key;
        }

        if let Ok(dir) = std::env::var("TUNDRA_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(image) = std::env::var("TUNDRA_PLACEHOLDER_IMAGE") {
            self.item_defaults.image = image;
        }

        if let Ok(title) = std::env::var("TUNDRA_FALLBACK_TITLE") {
            self.item_defaults.title = title;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "tundra", "cart")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("cart.toml"))
    }
}
