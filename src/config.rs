use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::resilience::ReplayConfig;
use crate::tree::TreeShape;

/// A platform deployment reachable at one GraphQL endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub endpoint: String,
}

/// Credentials for one tenant, bound to a configured environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub environment: String,
    pub tenant_id: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub environments: HashMap<String, Environment>,
    #[serde(default)]
    pub tenants: HashMap<String, Tenant>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Attempts per replayed mutation before a copy aborts.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    /// Delay between successive replayed mutations, in milliseconds.
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,
    /// Which node-creation shape destination tenants support.
    #[serde(default)]
    pub tree_shape: TreeShape,
}

fn default_retry_budget() -> u32 {
    10
}

fn default_call_delay_ms() -> u64 {
    400
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
            call_delay_ms: default_call_delay_ms(),
            tree_shape: TreeShape::default(),
        }
    }
}

impl Settings {
    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            retry_budget: self.retry_budget,
            call_delay: Duration::from_millis(self.call_delay_ms),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("tenant-cli")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".tenant-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!(
            "Loaded config with {} environment(s) and {} tenant(s)",
            config.environments.len(),
            config.tenants.len()
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn add_environment(&mut self, alias: String, environment: Environment) -> Result<()> {
        info!("Adding environment: {}", alias);
        self.environments.insert(alias, environment);
        self.save()
    }

    pub fn remove_environment(&mut self, alias: &str) -> Result<()> {
        if self.environments.remove(alias).is_none() {
            anyhow::bail!("Environment '{}' not found", alias);
        }

        info!("Removing environment: {}", alias);
        let orphaned: Vec<&str> = self
            .tenants
            .iter()
            .filter(|(_, t)| t.environment == alias)
            .map(|(name, _)| name.as_str())
            .collect();
        if !orphaned.is_empty() {
            warn!(
                "Tenant(s) {} still reference removed environment {}",
                orphaned.join(", "),
                alias
            );
        }

        self.save()
    }

    pub fn get_environment(&self, alias: &str) -> Result<&Environment> {
        self.environments
            .get(alias)
            .ok_or_else(|| anyhow::anyhow!("Environment '{}' not found", alias))
    }

    pub fn add_tenant(&mut self, alias: String, tenant: Tenant) -> Result<()> {
        if !self.environments.contains_key(&tenant.environment) {
            anyhow::bail!(
                "Environment '{}' not found. Create it first with 'tenant-cli config env add'",
                tenant.environment
            );
        }

        info!("Adding tenant: {}", alias);
        self.tenants.insert(alias, tenant);
        self.save()
    }

    pub fn remove_tenant(&mut self, alias: &str) -> Result<()> {
        if self.tenants.remove(alias).is_none() {
            anyhow::bail!("Tenant '{}' not found", alias);
        }

        info!("Removing tenant: {}", alias);
        self.save()
    }

    pub fn get_tenant(&self, alias: &str) -> Result<&Tenant> {
        self.tenants
            .get(alias)
            .ok_or_else(|| anyhow::anyhow!("Tenant '{}' not found", alias))
    }

    /// Resolve a tenant alias together with the environment it lives in.
    pub fn tenant_with_environment(&self, alias: &str) -> Result<(Tenant, Environment)> {
        let tenant = self.get_tenant(alias)?;
        let environment = self.environments.get(&tenant.environment).ok_or_else(|| {
            anyhow::anyhow!(
                "Tenant '{}' references unknown environment '{}'",
                alias,
                tenant.environment
            )
        })?;
        Ok((tenant.clone(), environment.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_the_documented_replay_tunables() {
        let settings = Settings::default();
        assert_eq!(settings.retry_budget, 10);
        assert_eq!(settings.call_delay_ms, 400);
        assert_eq!(settings.tree_shape, TreeShape::Nested);

        let replay = settings.replay_config();
        assert_eq!(replay.retry_budget, 10);
        assert_eq!(replay.call_delay, Duration::from_millis(400));
    }

    #[test]
    fn config_parses_with_partial_settings() {
        let config: Config = toml::from_str(
            r#"
            [environments.dev]
            endpoint = "https://api.dev.example.com"

            [tenants.alpha]
            environment = "dev"
            tenant_id = "t-1"
            client_id = "platform_crm"
            username = "ops"
            password = "secret"

            [settings]
            call_delay_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.call_delay_ms, 100);
        assert_eq!(config.settings.retry_budget, 10);
        let (tenant, environment) = config.tenant_with_environment("alpha").unwrap();
        assert_eq!(tenant.tenant_id, "t-1");
        assert_eq!(environment.endpoint, "https://api.dev.example.com");
    }

    #[test]
    fn unknown_tenant_alias_is_an_error() {
        let config = Config::default();
        assert!(config.tenant_with_environment("missing").is_err());
    }

    #[test]
    fn tree_shape_round_trips_through_toml() {
        let toml_str = "[settings]\ntree_shape = \"per-node\"\n";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.settings.tree_shape, TreeShape::PerNode);
    }
}
