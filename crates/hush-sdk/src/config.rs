// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Client configuration.
//!
//! Stored as JSON at `~/.hush/config.json`. Every field can be overridden
//! with a `HUSH_*` environment variable, which wins over the file:
//!
//! | Field | Env |
//! |---|---|
//! | `relayer_url` | `HUSH_RELAYER_URL` |
//! | `ipfs_api_url` | `HUSH_IPFS_API_URL` |
//! | `ipfs_user` / `ipfs_password` | `HUSH_IPFS_USER` / `HUSH_IPFS_PASSWORD` |
//! | `cache_url` / `cache_token` | `HUSH_CACHE_URL` / `HUSH_CACHE_TOKEN` |
//! | `cache_ttl_secs` | `HUSH_CACHE_TTL_SECS` |
//! | `rpc_url` | `HUSH_RPC_URL` |
//! | `contract_address` | `HUSH_CONTRACT_ADDRESS` |
//! | `artifacts_dir` | `HUSH_ARTIFACTS_DIR` |
//! | `wallet` | `HUSH_WALLET` |

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 180;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ForumConfig {
    pub relayer_url: String,
    pub ipfs_api_url: String,
    pub ipfs_user: Option<String>,
    pub ipfs_password: Option<String>,
    pub cache_url: String,
    pub cache_token: String,
    pub cache_ttl_secs: u64,
    pub rpc_url: String,
    pub contract_address: String,
    pub artifacts_dir: PathBuf,
    pub wallet: Option<String>,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            relayer_url: "http://localhost:3001".into(),
            ipfs_api_url: "http://localhost:5001".into(),
            ipfs_user: None,
            ipfs_password: None,
            cache_url: String::new(),
            cache_token: String::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            rpc_url: "http://localhost:8545".into(),
            contract_address: "PLACEHOLDER".into(),
            artifacts_dir: PathBuf::from("artifacts"),
            wallet: None,
        }
    }
}

impl ForumConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn has_remote_cache(&self) -> bool {
        !self.cache_url.is_empty() && !self.cache_token.is_empty()
    }

    /// Apply `HUSH_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = get("HUSH_RELAYER_URL") {
            self.relayer_url = v;
        }
        if let Some(v) = get("HUSH_IPFS_API_URL") {
            self.ipfs_api_url = v;
        }
        if let Some(v) = get("HUSH_IPFS_USER") {
            self.ipfs_user = Some(v);
        }
        if let Some(v) = get("HUSH_IPFS_PASSWORD") {
            self.ipfs_password = Some(v);
        }
        if let Some(v) = get("HUSH_CACHE_URL") {
            self.cache_url = v;
        }
        if let Some(v) = get("HUSH_CACHE_TOKEN") {
            self.cache_token = v;
        }
        if let Some(v) = get("HUSH_CACHE_TTL_SECS") {
            match v.parse() {
                Ok(secs) => self.cache_ttl_secs = secs,
                Err(_) => tracing::warn!(value = %v, "invalid HUSH_CACHE_TTL_SECS, keeping {}", self.cache_ttl_secs),
            }
        }
        if let Some(v) = get("HUSH_RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = get("HUSH_CONTRACT_ADDRESS") {
            self.contract_address = v;
        }
        if let Some(v) = get("HUSH_ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(v);
        }
        if let Some(v) = get("HUSH_WALLET") {
            self.wallet = Some(v);
        }
        self
    }

    /// Set one field by name (used by `hush config set`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "relayer_url" => self.relayer_url = value.into(),
            "ipfs_api_url" => self.ipfs_api_url = value.into(),
            "ipfs_user" => self.ipfs_user = Some(value.into()),
            "ipfs_password" => self.ipfs_password = Some(value.into()),
            "cache_url" => self.cache_url = value.into(),
            "cache_token" => self.cache_token = value.into(),
            "cache_ttl_secs" => {
                self.cache_ttl_secs = value.parse().context("cache_ttl_secs must be an integer")?
            }
            "rpc_url" => self.rpc_url = value.into(),
            "contract_address" => self.contract_address = value.into(),
            "artifacts_dir" => self.artifacts_dir = PathBuf::from(value),
            "wallet" => self.wallet = Some(value.into()),
            _ => anyhow::bail!("unknown config key: {key}"),
        }
        Ok(())
    }
}

pub const CONFIG_KEYS: &[&str] = &[
    "relayer_url",
    "ipfs_api_url",
    "ipfs_user",
    "ipfs_password",
    "cache_url",
    "cache_token",
    "cache_ttl_secs",
    "rpc_url",
    "contract_address",
    "artifacts_dir",
    "wallet",
];

pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".hush").join("config.json"))
}

/// The config file as stored, defaults if absent. No env overrides.
pub fn load_config_file() -> Result<ForumConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ForumConfig::default());
    }
    let data = fs::read_to_string(&path)
        .with_context(|| format!("cannot read config at {}", path.display()))?;
    serde_json::from_str(&data).context("invalid config JSON")
}

/// Load the config file and apply env overrides.
pub fn load_config() -> Result<ForumConfig> {
    Ok(load_config_file()?.with_env())
}

pub fn save_config(config: &ForumConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}
