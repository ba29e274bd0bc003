//! Configuration Management
//!
//! Handles persistent configuration storage for apigw-restapi and the
//! resolution of effective settings (CLI > config file > AWS provider
//! chain).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aws::auth::{self, SdkConfigOptions};
use crate::aws::client::ClientSettings;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// AWS region, e.g. `us-east-1`
    #[serde(default)]
    pub region: Option<String>,
    /// Partition override; derived from the region when unset
    #[serde(default)]
    pub partition: Option<String>,
    /// Account used to build execution ARNs
    #[serde(default)]
    pub account_id: Option<String>,
    /// Service endpoint override (LocalStack and similar)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Shared credentials/config profile
    #[serde(default)]
    pub profile: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("apigw-restapi").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Layer `overrides` on top of this configuration (set fields win)
    pub fn merged(&self, overrides: &Config) -> Config {
        Config {
            region: overrides.region.clone().or_else(|| self.region.clone()),
            partition: overrides.partition.clone().or_else(|| self.partition.clone()),
            account_id: overrides.account_id.clone().or_else(|| self.account_id.clone()),
            endpoint: overrides.endpoint.clone().or_else(|| self.endpoint.clone()),
            profile: overrides.profile.clone().or_else(|| self.profile.clone()),
        }
    }

    /// Resolve everything the AWS client needs
    ///
    /// Unset values fall back to the AWS provider chain: `AWS_PROFILE`,
    /// `AWS_REGION` and the shared config files for the profile and region,
    /// and STS `GetCallerIdentity` for the account.
    pub async fn client_settings(&self) -> Result<ClientSettings> {
        if let Some(account_id) = &self.account_id {
            if !auth::validate_account_id(account_id) {
                anyhow::bail!("Invalid account ID format: {}", account_id);
            }
        }

        let sdk_config = auth::load_sdk_config(&SdkConfigOptions {
            profile: self.profile.as_deref(),
            region: self.region.as_deref(),
            endpoint: self.endpoint.as_deref(),
        })
        .await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .context("No AWS region configured. Set AWS_REGION or use --region")?;
        if !auth::validate_region(&region) {
            anyhow::bail!("Invalid region: {}", region);
        }

        let credentials =
            auth::credentials_provider(&sdk_config).context("Failed to load AWS credentials")?;

        let account_id = match &self.account_id {
            Some(account_id) => account_id.clone(),
            None => auth::caller_account_id(&sdk_config)
                .await
                .context("Failed to determine the AWS account ID. Use --account-id")?,
        };

        Ok(ClientSettings {
            credentials,
            region,
            partition: self.partition.clone(),
            account_id,
            endpoint: self.endpoint.clone(),
        })
    }
}
