use anyhow::Result;
use hush_sdk::config::{load_config_file, save_config, ForumConfig, CONFIG_KEYS};

use crate::output::{self, mask};

pub fn set(key: &str, value: &str) -> Result<()> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(output::fail_with_hint(
            &format!("unknown config key: {key}"),
            &format!("allowed keys: {}", CONFIG_KEYS.join(", ")),
        ));
    }

    // env overrides are not persisted
    let mut config = load_config_file()?;
    config.set(key, value)?;
    save_config(&config)?;

    let shown = if is_secret(key) { mask(value) } else { value.to_string() };
    if output::is_json() {
        output::json_output(serde_json::json!({ "key": key, "value": shown }));
    } else {
        output::success(&format!("{key} updated"));
    }
    Ok(())
}

fn is_secret(key: &str) -> bool {
    matches!(key, "cache_token" | "ipfs_password")
}

/// Effective configuration, after `HUSH_*` overrides.
pub fn show(config: &ForumConfig) -> Result<()> {
    let token = mask(&config.cache_token);
    let password = config.ipfs_password.as_deref().map(mask).unwrap_or_default();
    let wallet = config.wallet.clone().unwrap_or_default();
    let artifacts = config.artifacts_dir.display().to_string();

    if output::is_json() {
        output::json_output(serde_json::json!({
            "relayer_url": config.relayer_url,
            "ipfs_api_url": config.ipfs_api_url,
            "ipfs_user": config.ipfs_user,
            "ipfs_password": password,
            "cache_url": config.cache_url,
            "cache_token": token,
            "cache_ttl_secs": config.cache_ttl_secs,
            "rpc_url": config.rpc_url,
            "contract_address": config.contract_address,
            "artifacts_dir": artifacts,
            "wallet": wallet,
        }));
    } else {
        output::label("relayer_url", &config.relayer_url);
        output::label("ipfs_api_url", &config.ipfs_api_url);
        output::label("ipfs_user", config.ipfs_user.as_deref().unwrap_or(""));
        output::label("ipfs_password", &password);
        output::label("cache_url", &config.cache_url);
        output::label("cache_token", &token);
        output::label("cache_ttl_secs", &config.cache_ttl_secs.to_string());
        output::label("rpc_url", &config.rpc_url);
        output::label("contract_address", &config.contract_address);
        output::label("artifacts_dir", &artifacts);
        output::label("wallet", &wallet);
    }
    Ok(())
}
