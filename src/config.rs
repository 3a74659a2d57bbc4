//! Target configuration.
//!
//! Loaded from TOML, looked up in this order: an explicit path,
//! `./redcat.toml`, then `<config dir>/redcat/config.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CatalogError, CatalogResult};

/// Placeholder user name when none can be determined.
pub const UNKNOWN_USER: &str = "<unknown>";

/// File name searched for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "redcat.toml";

/// Top-level config file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub target: TargetConfig,
}

/// The database target a catalog is built for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    /// Database connection URL
    pub url: Option<String>,

    /// User named in diagnostics (defaults to the URL's user)
    pub user: Option<String>,

    /// Database the connection points at (defaults to the URL's database)
    pub database: Option<String>,

    /// Databases requested for the catalog; exactly one is supported
    #[serde(default)]
    pub databases: Vec<String>,
}

impl CatalogConfig {
    /// Create a new configuration builder
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Parse a config document.
    pub fn from_toml(content: &str) -> CatalogResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a config file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load from an explicit path, or the first default location that exists.
    ///
    /// Returns the empty config when nothing is found and no path was given.
    pub fn load(explicit: Option<&Path>) -> CatalogResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        match default_locations().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// The single database to build the catalog for.
    ///
    /// Falls back to the connection's database when none were requested
    /// explicitly.
    pub fn catalog_database(&self) -> CatalogResult<String> {
        let requested: Vec<String> = if self.target.databases.is_empty() {
            self.connected_database().into_iter().collect()
        } else {
            self.target.databases.clone()
        };

        match requested.as_slice() {
            [one] => Ok(one.clone()),
            _ => Err(CatalogError::config(format!(
                "redshift get_catalog requires exactly one database, got {} ({})",
                requested.len(),
                requested.join(", ")
            ))),
        }
    }

    /// Database the connection points at.
    pub fn connected_database(&self) -> Option<String> {
        self.target.database.clone().or_else(|| {
            self.parsed_url()
                .map(|u| u.path().trim_start_matches('/').to_string())
                .filter(|db| !db.is_empty())
        })
    }

    /// User named in diagnostics.
    pub fn user(&self) -> String {
        self.configured_user()
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    /// The explicit user, else the URL's user name.
    pub fn configured_user(&self) -> Option<String> {
        self.target.user.clone().or_else(|| {
            self.parsed_url()
                .map(|u| u.username().to_string())
                .filter(|u| !u.is_empty())
        })
    }

    fn parsed_url(&self) -> Option<url::Url> {
        self.target
            .url
            .as_deref()
            .and_then(|raw| url::Url::parse(raw).ok())
    }
}

/// Default config file locations, most specific first.
pub fn default_locations() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("redcat").join("config.toml"));
    }
    paths
}

/// Builder for CatalogConfig
#[derive(Debug, Default)]
pub struct CatalogConfigBuilder {
    config: CatalogConfig,
}

impl CatalogConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Set the database URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.target.url = Some(url.into());
        self
    }

    /// Set the user named in diagnostics
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.target.user = Some(user.into());
        self
    }

    /// Set the connected database
    pub fn connected_to(mut self, database: impl Into<String>) -> Self {
        self.config.target.database = Some(database.into());
        self
    }

    /// Request a database for the catalog
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.target.databases.push(database.into());
        self
    }

    /// Replace the requested databases
    pub fn databases<I, S>(mut self, databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.target.databases = databases.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CatalogConfig {
        self.config
    }
}
