use anyhow::Result;
use hush_sdk::cache::{CacheResult, Entry, JsonStore};

use crate::output;
use crate::session::Session;

fn entry_json(key: &str, result: &CacheResult<Entry>) -> serde_json::Value {
    match result {
        CacheResult::Hit(entry) => serde_json::json!({
            "key": key,
            "status": if entry.is_stale { "stale" } else { "fresh" },
            "lastCachedAt": entry.last_cached_at,
            "data": entry.data,
        }),
        CacheResult::Miss => serde_json::json!({ "key": key, "status": "miss" }),
        CacheResult::Unavailable(reason) => {
            serde_json::json!({ "key": key, "status": "unavailable", "error": reason })
        }
    }
}

fn print_entry(key: &str, result: &CacheResult<Entry>) {
    match result {
        CacheResult::Hit(entry) => {
            output::label(key, if entry.is_stale { "stale" } else { "fresh" });
            output::label("lastCachedAt", &entry.last_cached_at.to_string());
            output::info(&serde_json::to_string_pretty(&entry.data).unwrap_or_default());
        }
        CacheResult::Miss => output::label(key, "miss"),
        CacheResult::Unavailable(reason) => output::warn(&format!("{key}: cache unavailable: {reason}")),
    }
}

pub async fn get<S: JsonStore + Clone>(session: &Session<S>, key: &str) -> Result<()> {
    let result = session.cache().get(key).await;
    if output::is_json() {
        output::json_output(entry_json(key, &result));
    } else {
        print_entry(key, &result);
    }
    Ok(())
}

pub async fn mget<S: JsonStore + Clone>(session: &Session<S>, keys: &[String]) -> Result<()> {
    let results = session.cache().get_many(keys).await;
    if output::is_json() {
        let docs: Vec<_> = keys.iter().zip(&results).map(|(k, r)| entry_json(k, r)).collect();
        output::json_output(serde_json::Value::Array(docs));
    } else {
        for (key, result) in keys.iter().zip(&results) {
            print_entry(key, result);
        }
    }
    Ok(())
}

pub async fn del<S: JsonStore + Clone>(session: &Session<S>, key: &str) -> Result<()> {
    session
        .cache()
        .remove_at(key, None)
        .await
        .map_err(|e| anyhow::anyhow!("cache delete failed: {e}"))?;
    if output::is_json() {
        output::json_output(serde_json::json!({ "deleted": key }));
    } else {
        output::success(&format!("{key} removed"));
    }
    Ok(())
}
