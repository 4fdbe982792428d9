// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Content addressing and IPFS storage.
//!
//! The contract stores content pointers as `bytes32`: the sha2-256 digest
//! of an IPFS CIDv0 without its `0x1220` multihash header.
//!
//! ```rust
//! use hush_sdk::content::{bytes32_from_ipfs_hash, ipfs_hash_from_bytes32};
//!
//! let b32 = format!("0x{}", "ab".repeat(32));
//! let cid = ipfs_hash_from_bytes32(&b32).unwrap();
//! assert!(cid.starts_with("Qm"));
//! assert_eq!(bytes32_from_ipfs_hash(&cid).unwrap(), b32);
//!
//! // the zero pointer means "no content"
//! assert_eq!(ipfs_hash_from_bytes32(&format!("0x{}", "00".repeat(32))).unwrap(), "");
//! ```

use std::future::Future;

use serde::Deserialize;

use crate::error::{ForumError, ForumResult};

/// sha2-256 code, 32-byte digest length.
const MULTIHASH_HEADER: [u8; 2] = [0x12, 0x20];

/// All-zero pointer written when an item is deleted.
pub fn zero_bytes32() -> String {
    format!("0x{}", "00".repeat(32))
}

pub fn ipfs_hash_from_bytes32(bytes32: &str) -> ForumResult<String> {
    let raw = bytes32.strip_prefix("0x").unwrap_or(bytes32);
    let digest = hex::decode(raw).map_err(|e| ForumError::InvalidCid(format!("{bytes32}: {e}")))?;
    if digest.len() != 32 {
        return Err(ForumError::InvalidCid(format!(
            "{bytes32}: expected 32 bytes, got {}",
            digest.len()
        )));
    }
    if digest.iter().all(|b| *b == 0) {
        return Ok(String::new());
    }
    let mut multihash = Vec::with_capacity(34);
    multihash.extend_from_slice(&MULTIHASH_HEADER);
    multihash.extend_from_slice(&digest);
    Ok(bs58::encode(multihash).into_string())
}

pub fn bytes32_from_ipfs_hash(hash: &str) -> ForumResult<String> {
    let bytes = bs58::decode(hash)
        .into_vec()
        .map_err(|e| ForumError::InvalidCid(format!("{hash}: {e}")))?;
    if bytes.len() != 34 || bytes[..2] != MULTIHASH_HEADER {
        return Err(ForumError::InvalidCid(format!(
            "{hash}: not a sha2-256 CIDv0"
        )));
    }
    Ok(format!("0x{}", hex::encode(&bytes[2..])))
}

/// Stored content is `"{timestamp}#{payload}"`; only the payload matters.
pub fn split_stored_content(text: &str) -> &str {
    match text.split_once('#') {
        Some((_, payload)) => payload,
        None => text,
    }
}

pub fn encode_upload(timestamp_ms: i64, payload: &serde_json::Value) -> String {
    format!("{timestamp_ms}#{payload}")
}

/// Content storage seam; [`IpfsClient`] in production, fakes in tests.
pub trait ContentStore {
    /// Pin `payload`; `None` on any failure. Never errors.
    fn upload(&self, payload: &serde_json::Value) -> impl Future<Output = Option<String>> + Send;

    /// Fetch the meaningful (post-`#`) text stored under `hash`.
    fn fetch(&self, hash: &str) -> impl Future<Output = ForumResult<String>> + Send;
}

pub struct IpfsClient {
    api_url: String,
    user: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            user: None,
            password: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_basic_auth(mut self, user: &str, password: Option<&str>) -> Self {
        self.user = Some(user.to_string());
        self.password = password.map(str::to_string);
        self
    }

    pub fn from_config(config: &crate::config::ForumConfig) -> Self {
        let client = Self::new(&config.ipfs_api_url);
        match &config.ipfs_user {
            Some(user) => client.with_basic_auth(user, config.ipfs_password.as_deref()),
            None => client,
        }
    }

    fn request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let req = self.http.post(format!("{}/api/v0/{endpoint}", self.api_url));
        match &self.user {
            Some(user) => req.basic_auth(user, self.password.as_deref()),
            None => req,
        }
    }

    async fn try_add(&self, body: String) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(body.into_bytes()).file_name("content");
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .request("add?pin=true")
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<AddResponse>().await?.hash)
    }
}

impl IpfsClient {
    pub async fn add(&self, payload: &serde_json::Value) -> Option<String> {
        let body = encode_upload(chrono::Utc::now().timestamp_millis(), payload);
        match self.try_add(body).await {
            Ok(hash) => {
                tracing::debug!(%hash, "content pinned");
                Some(hash)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ipfs add failed");
                None
            }
        }
    }

    pub async fn cat(&self, hash: &str) -> ForumResult<String> {
        let mut resp = self
            .request(&format!("cat?arg={hash}"))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ForumError::Ipfs(e.to_string()))?;

        let mut buf = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(|e| ForumError::Ipfs(e.to_string()))? {
            buf.extend_from_slice(&chunk);
        }
        let text = String::from_utf8(buf).map_err(|e| ForumError::Ipfs(format!("{hash}: {e}")))?;
        Ok(split_stored_content(&text).to_string())
    }
}

impl ContentStore for IpfsClient {
    async fn upload(&self, payload: &serde_json::Value) -> Option<String> {
        self.add(payload).await
    }

    async fn fetch(&self, hash: &str) -> ForumResult<String> {
        self.cat(hash).await
    }
}
