//! Application configuration management.
//!
//! Two sources feed the application:
//! - Account credentials come from the process environment (optionally
//!   populated from a `.env` file by the binary). For each account class `C`
//!   the variables `{prefix}C_USERNAME` and `{prefix}C_PASSWORD` are read once
//!   when the registry is built.
//! - App settings (last username, storage directory override) are stored at
//!   `~/.config/tenantgate/config.json`.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::registry::{Account, AccountClass, AccountRegistry, DEFAULT_CLASSES};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tenantgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Prefix for account variables when none is given
pub const DEFAULT_ENV_PREFIX: &str = "TENANTGATE_";

/// Prefix used by Vite-built web front ends for build-time variables
pub const VITE_ENV_PREFIX: &str = "VITE_";

/// Comma-separated override of the declared account classes
pub const ACCOUNT_CLASSES_VAR: &str = "TENANTGATE_ACCOUNT_CLASSES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid account class identifier: {0:?}")]
    InvalidClass(String),

    #[error("Account class declared more than once: {0}")]
    DuplicateClass(String),
}

/// Where account credentials are read from and which classes exist.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    prefix: String,
    classes: Vec<AccountClass>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl AuthConfig {
    /// Config with the default class list (`ADMIN`, `USER1`..`USER4`)
    pub fn new(prefix: impl Into<String>) -> Self {
        let classes = DEFAULT_CLASSES
            .iter()
            .map(|id| AccountClass(id.to_string()))
            .collect();
        Self {
            prefix: prefix.into(),
            classes,
        }
    }

    /// Config whose class list honours `TENANTGATE_ACCOUNT_CLASSES` if set
    pub fn from_env(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self::new(prefix);
        match std::env::var(ACCOUNT_CLASSES_VAR) {
            Ok(list) if !list.trim().is_empty() => {
                let classes = parse_classes(&list)?;
                debug!(count = classes.len(), "Account classes overridden from environment");
                Ok(config.with_classes(classes))
            }
            _ => Ok(config),
        }
    }

    pub fn with_classes(mut self, classes: Vec<AccountClass>) -> Self {
        self.classes = classes;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn classes(&self) -> &[AccountClass] {
        &self.classes
    }

    pub fn username_var(&self, class: &AccountClass) -> String {
        format!("{}{}_USERNAME", self.prefix, class)
    }

    pub fn password_var(&self, class: &AccountClass) -> String {
        format!("{}{}_PASSWORD", self.prefix, class)
    }

    /// Build the registry from the process environment
    pub fn registry_from_env(&self) -> Result<AccountRegistry, ConfigError> {
        self.build_registry(|name| std::env::var(name).ok())
    }

    /// Build the registry from an explicit variable map
    pub fn registry_from_pairs<I, K, V>(&self, pairs: I) -> Result<AccountRegistry, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.build_registry(|name| vars.get(name).cloned())
    }

    /// Classes with a missing or empty username or password are skipped
    fn build_registry<F>(&self, lookup: F) -> Result<AccountRegistry, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut accounts = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let username = lookup(&self.username_var(class)).filter(|v| !v.is_empty());
            let password = lookup(&self.password_var(class)).filter(|v| !v.is_empty());
            match (username, password) {
                (Some(username), Some(password)) => {
                    accounts.push(Account::new(class.clone(), username, password));
                }
                _ => {
                    warn!(class = %class, "Account class has no complete credentials, skipping");
                }
            }
        }

        let registry = AccountRegistry::new(accounts)?;
        if registry.is_empty() {
            warn!(prefix = %self.prefix, "No accounts configured; every login will be rejected");
        } else {
            debug!(accounts = registry.len(), "Account registry built");
        }
        Ok(registry)
    }
}

/// Parse a comma-separated class list, preserving order
pub fn parse_classes(list: &str) -> Result<Vec<AccountClass>, ConfigError> {
    let mut classes: Vec<AccountClass> = Vec::new();
    for id in list.split(',').filter(|s| !s.trim().is_empty()) {
        let class = AccountClass::new(id)?;
        if classes.contains(&class) {
            return Err(ConfigError::DuplicateClass(class.to_string()));
        }
        classes.push(class);
    }
    Ok(classes)
}

/// Persisted application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub last_username: Option<String>,
    pub storage_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory the durable session storage lives in
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

// ============================================================================
// Tests
// ============================================================================
