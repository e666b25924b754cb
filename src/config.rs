// Configuration: reads the dotenv-style `purview.env` file holding the
// tenant/app registration and the Purview account to query.

use crate::error::ConfigError;
use reqwest::Url;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_FILE: &str = "purview.env";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_CLASSIFICATION_KEYWORD: &str = "sales_transactions";
pub const DEFAULT_CLASSIFICATION_ENTITY_TYPE: &str = "databricks_table";

/// Everything the tool needs to authenticate and reach the catalog.
#[derive(Clone)]
pub struct Settings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub account_name: String,
    /// Catalog base URL without a trailing slash.
    pub endpoint: String,
    pub authority_host: String,
    pub classification_keyword: String,
    pub classification_entity_type: String,
    pub log_level: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .field("account_name", &self.account_name)
            .field("endpoint", &self.endpoint)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Load settings from `explicit` or from the default env file location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_env_file(explicit);
        tracing::debug!(path = %path.display(), "loading settings");
        Self::from_file(&path)
    }

    /// Read `path`; variables already set in the process environment take
    /// precedence over the file, as with a regular dotenv load.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file_with_env(path, |key| std::env::var(key).ok())
    }

    pub fn from_file_with_env<E>(path: &Path, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let entries = dotenvy::from_path_iter(path)
            .map_err(|_| ConfigError::MissingFile(path.to_path_buf()))?;

        let mut file = HashMap::new();
        for entry in entries {
            let (key, value) =
                entry.map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
            file.insert(key, value);
        }

        Self::from_lookup(|key| env(key).or_else(|| file.get(key).cloned()))
    }

    /// Build settings from any key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::MissingKey(key));

        let account_name = require("PURVIEW_ACCOUNT_NAME")?;
        let endpoint = match get("PURVIEW_ENDPOINT") {
            Some(url) => url,
            None => format!("https://{}.purview.azure.com", account_name),
        };
        let authority_host =
            get("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());

        Ok(Settings {
            tenant_id: require("TENANT_ID")?,
            client_id: require("CLIENT_ID")?,
            client_secret: require("CLIENT_SECRET")?,
            subscription_id: require("SUBSCRIPTION_ID")?,
            endpoint: normalize_url("PURVIEW_ENDPOINT", &endpoint)?,
            authority_host: normalize_url("AZURE_AUTHORITY_HOST", &authority_host)?,
            account_name,
            classification_keyword: get("CLASSIFICATION_KEYWORD")
                .unwrap_or_else(|| DEFAULT_CLASSIFICATION_KEYWORD.to_string()),
            classification_entity_type: get("CLASSIFICATION_ENTITY_TYPE")
                .unwrap_or_else(|| DEFAULT_CLASSIFICATION_ENTITY_TYPE.to_string()),
            log_level: get("LOG_LEVEL"),
        })
    }
}

/// Pick the env file: an explicit path wins, then `./purview.env`, then the
/// per-user config directory. Falls back to `./purview.env` so the
/// missing-file message names the expected file.
pub fn resolve_env_file(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_ENV_FILE);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        let user = dir.join("purview-inventory").join(DEFAULT_ENV_FILE);
        if user.exists() {
            return user;
        }
    }
    local
}

fn normalize_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl(key, e.to_string()))?;
    Ok(trimmed.to_string())
}
