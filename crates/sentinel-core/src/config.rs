//! Configuration
//!
//! Resolution order:
//! 1. Explicit path (`--config`), or `~/.config/sentinel/config.toml` if present
//! 2. Embedded defaults (compiled into the binary)
//! 3. Environment overrides for provider credentials and the session TTL
//!
//! Missing sections or keys fall back to the built-in defaults, so a user
//! file only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::IncomePolicy;
use crate::error::{Error, Result};
use crate::store::DEFAULT_YEARLY_THRESHOLD;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/sentinel.toml");

/// Fully resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub simplefin: SimpleFinConfig,
    pub plaid: PlaidConfig,
    pub runway: RunwayConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleFinConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SimpleFinConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.username.is_some() && self.password.is_some()
    }
}

/// Plaid deployment tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaidEnvironment {
    #[default]
    Sandbox,
    Development,
    Production,
}

impl PlaidEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.plaid.com", self.as_str())
    }
}

impl std::str::FromStr for PlaidEnvironment {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(Error::Config(format!("unknown Plaid environment: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaidConfig {
    pub client_id: Option<String>,
    pub secret: Option<String>,
    pub environment: PlaidEnvironment,
    /// Overrides the environment's URL (tests, proxies)
    pub base_url: Option<String>,
    pub client_name: String,
    pub user_id: String,
    pub history_start: NaiveDate,
}

impl Default for PlaidConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            secret: None,
            environment: PlaidEnvironment::default(),
            base_url: None,
            client_name: "Sentinel".to_string(),
            user_id: "sentinel-user".to_string(),
            history_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        }
    }
}

impl PlaidConfig {
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.secret.is_some()
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunwayConfig {
    pub yearly_threshold: Decimal,
    pub income_policy: IncomePolicy,
}

impl Default for RunwayConfig {
    fn default() -> Self {
        Self {
            yearly_threshold: DEFAULT_YEARLY_THRESHOLD,
            income_policy: IncomePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub session_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 86_400,
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Default user config location (~/.config/sentinel/config.toml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sentinel").join("config.toml"))
}

impl Config {
    /// Load from files and the process environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(override_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from files only (override first, then default)
    pub fn load_file(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::parse(&content)
            }
            None => Self::parse(DEFAULT_CONFIG),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Apply environment overrides using the given lookup
    ///
    /// Empty values are ignored. An unparseable `SENTINEL_SESSION_TTL_SECS`
    /// or `PLAID_ENV` leaves the file value in place.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SIMPLEFIN_BASE_URL") {
            self.simplefin.base_url = Some(v);
        }
        if let Some(v) = get("SIMPLEFIN_USERNAME") {
            self.simplefin.username = Some(v);
        }
        if let Some(v) = get("SIMPLEFIN_PASSWORD") {
            self.simplefin.password = Some(v);
        }
        if let Some(v) = get("PLAID_CLIENT_ID") {
            self.plaid.client_id = Some(v);
        }
        if let Some(v) = get("PLAID_SECRET") {
            self.plaid.secret = Some(v);
        }
        if let Some(v) = get("PLAID_ENV") {
            match v.parse() {
                Ok(env) => self.plaid.environment = env,
                Err(e) => tracing::warn!(error = %e, "Ignoring PLAID_ENV"),
            }
        }
        if let Some(v) = get("PLAID_BASE_URL") {
            self.plaid.base_url = Some(v);
        }
        if let Some(v) = get("SENTINEL_SESSION_TTL_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.server.session_ttl_secs = secs,
                Err(_) => tracing::warn!(value = %v, "Ignoring SENTINEL_SESSION_TTL_SECS"),
            }
        }
    }

    /// Copy with credentials replaced by a mask, for display
    pub fn masked(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        let mut out = self.clone();
        out.simplefin.username = mask(&self.simplefin.username);
        out.simplefin.password = mask(&self.simplefin.password);
        out.plaid.secret = mask(&self.plaid.secret);
        out
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
