//! Engine configuration.
//!
//! Loaded from YAML; every field has a default so an empty document is a
//! valid configuration. A handful of operational knobs can be overridden from
//! `ROSTER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use roster_connector::RetryConfig;
use roster_core::GroupName;

use crate::error::ConfigError;
use crate::keys::{FirstDotLast, FirstInitialLastName, KeyTransform};
use crate::taxonomy::GroupTaxonomy;

pub const ENV_CONCURRENCY: &str = "ROSTER_CONCURRENCY";
pub const ENV_CALL_TIMEOUT_MS: &str = "ROSTER_CALL_TIMEOUT_MS";
pub const ENV_MAX_ATTEMPTS: &str = "ROSTER_MAX_ATTEMPTS";
pub const ENV_CONSOLE_ACCESS: &str = "ROSTER_CONSOLE_ACCESS";

/// Built-in key derivation schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// `mscott`
    #[default]
    FirstInitialLastName,
    /// `michael.scott`
    FirstDotLast,
}

impl KeyScheme {
    #[must_use]
    pub fn transform(self) -> Arc<dyn KeyTransform> {
        match self {
            KeyScheme::FirstInitialLastName => Arc::new(FirstInitialLastName),
            KeyScheme::FirstDotLast => Arc::new(FirstDotLast),
        }
    }
}

/// Retry policy for remote calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetrySettings {
    #[must_use]
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

/// Group taxonomy settings.
///
/// When a `groups` section is present it replaces the default taxonomy
/// entirely; omitted lists inside it are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Bucket for departments without a mapping.
    #[serde(default = "default_unassigned")]
    pub unassigned: String,
    /// Managed groups, in reconciliation order.
    #[serde(default)]
    pub names: Vec<String>,
    /// Department → group name.
    #[serde(default)]
    pub departments: BTreeMap<String, String>,
}

fn default_unassigned() -> String {
    "Unassigned".to_string()
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            unassigned: default_unassigned(),
            names: vec![
                "Education".to_string(),
                "Engineers".to_string(),
                "Managers".to_string(),
            ],
            departments: BTreeMap::from([
                ("Education".to_string(), "Education".to_string()),
                ("Engineering".to_string(), "Engineers".to_string()),
                ("Management".to_string(), "Managers".to_string()),
            ]),
        }
    }
}

fn parse_group(field: &str, name: &str) -> Result<GroupName, ConfigError> {
    GroupName::parse(name.trim()).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

impl GroupsConfig {
    /// Build the taxonomy these settings describe.
    pub fn to_taxonomy(&self) -> Result<GroupTaxonomy, ConfigError> {
        let unassigned = parse_group("groups.unassigned", &self.unassigned)?;
        let groups = self
            .names
            .iter()
            .map(|name| parse_group("groups.names", name))
            .collect::<Result<Vec<_>, _>>()?;
        let departments = self
            .departments
            .iter()
            .map(|(department, group)| {
                parse_group("groups.departments", group).map(|g| (department.clone(), g))
            })
            .collect::<Result<Vec<_>, _>>()?;

        GroupTaxonomy::new(groups, unassigned, departments)
    }
}

/// Provisioning engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Give new users a console login profile.
    #[serde(default = "default_console_access")]
    pub console_access: bool,
    /// Key derivation scheme.
    #[serde(default)]
    pub key_scheme: KeyScheme,
    /// Maximum remote calls in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Timeout for a single remote call attempt.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub groups: GroupsConfig,
}

fn default_console_access() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            console_access: default_console_access(),
            key_scheme: KeyScheme::default(),
            concurrency: default_concurrency(),
            call_timeout_ms: default_call_timeout_ms(),
            retry: RetrySettings::default(),
            groups: GroupsConfig::default(),
        }
    }
}

impl ProvisioningConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `ROSTER_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source, then re-validate.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            self.concurrency = parse_override(ENV_CONCURRENCY, &value)?;
        }
        if let Some(value) = lookup(ENV_CALL_TIMEOUT_MS) {
            self.call_timeout_ms = parse_override(ENV_CALL_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = parse_override(ENV_MAX_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(ENV_CONSOLE_ACCESS) {
            self.console_access = parse_override(ENV_CONSOLE_ACCESS, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges and the group taxonomy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invalid("concurrency", "must be at least 1"));
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::invalid("call_timeout_ms", "must be greater than 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if !(self.retry.backoff_multiplier.is_finite() && self.retry.backoff_multiplier >= 1.0) {
            return Err(ConfigError::invalid(
                "retry.backoff_multiplier",
                "must be a finite number >= 1.0",
            ));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::invalid(
                "retry.initial_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.groups.unassigned.trim().is_empty() {
            return Err(ConfigError::invalid("groups.unassigned", "must not be empty"));
        }
        self.groups.to_taxonomy()?;
        Ok(())
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.to_retry_config()
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, format!("cannot parse '{value}'")))
}
