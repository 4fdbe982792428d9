// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! RedisJSON over the Upstash REST API: each command is POSTed as a JSON
//! array of strings with a bearer token, the reply is `{"result": ..}` or
//! `{"error": ".."}`.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::JsonStore;

#[derive(Clone)]
pub struct UpstashStore {
    url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

/// `$`-rooted form of a path, so replies are always JSON arrays.
fn dollar_path(path: &str) -> String {
    match path.strip_prefix('.') {
        Some(rest) => format!("${}", if rest.is_empty() { "" } else { path }),
        None => path.to_string(),
    }
}

/// Decode a `$`-path reply: a JSON-encoded array of matches, or nil.
fn first_match(result: &Value) -> Result<Option<Value>> {
    let Some(text) = result.as_str() else {
        return Ok(None);
    };
    let matches: Vec<Value> =
        serde_json::from_str(text).with_context(|| format!("bad JSON.GET reply: {text}"))?;
    Ok(matches.into_iter().next())
}

impl UpstashStore {
    pub fn new(url: &str, token: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &crate::config::ForumConfig) -> Option<Self> {
        config
            .has_remote_cache()
            .then(|| Self::new(&config.cache_url, &config.cache_token))
    }

    async fn command(&self, args: Vec<String>) -> Result<Value> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await
            .context("upstash request failed")?;
        let status = resp.status();
        let reply: Reply = resp.json().await.context("upstash reply is not JSON")?;
        if let Some(err) = reply.error {
            bail!("{} ({status}): {err}", args.first().map(String::as_str).unwrap_or("?"));
        }
        if !status.is_success() {
            bail!("upstash returned {status}");
        }
        Ok(reply.result)
    }
}

impl JsonStore for UpstashStore {
    async fn json_get(&self, key: &str, path: &str) -> Result<Option<Value>> {
        let result = self
            .command(vec!["JSON.GET".into(), key.into(), dollar_path(path)])
            .await?;
        first_match(&result)
    }

    async fn json_mget(&self, keys: &[String], path: &str) -> Result<Vec<Option<Value>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec!["JSON.MGET".to_string()];
        args.extend(keys.iter().cloned());
        args.push(dollar_path(path));
        let result = self.command(args).await?;
        let replies = result
            .as_array()
            .ok_or_else(|| anyhow!("JSON.MGET reply is not an array"))?;
        if replies.len() != keys.len() {
            bail!("JSON.MGET returned {} replies for {} keys", replies.len(), keys.len());
        }
        replies.iter().map(first_match).collect()
    }

    async fn json_set(&self, key: &str, path: &str, value: &Value) -> Result<()> {
        self.command(vec![
            "JSON.SET".into(),
            key.into(),
            dollar_path(path),
            value.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn json_del(&self, key: &str, path: &str) -> Result<()> {
        self.command(vec!["JSON.DEL".into(), key.into(), dollar_path(path)])
            .await?;
        Ok(())
    }

    async fn json_arr_append(&self, key: &str, path: &str, value: &Value) -> Result<()> {
        self.command(vec![
            "JSON.ARRAPPEND".into(),
            key.into(),
            dollar_path(path),
            value.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn json_arr_insert(&self, key: &str, path: &str, index: i64, value: &Value) -> Result<()> {
        self.command(vec![
            "JSON.ARRINSERT".into(),
            key.into(),
            dollar_path(path),
            index.to_string(),
            value.to_string(),
        ])
        .await?;
        Ok(())
    }
}
