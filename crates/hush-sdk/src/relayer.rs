// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Relayer HTTP client.
//!
//! The relayer submits transactions on the user's behalf and answers every
//! endpoint with `{status, data}`. Create endpoints return the emitted
//! contract event as `data = {event, args}`.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ForumError, ForumResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    JoinGroup,
    CreateGroup,
    Post,
    Comment,
    Edit,
    Vote,
    UnirepSignUp,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::JoinGroup => "/join-group",
            Endpoint::CreateGroup => "/create-group",
            Endpoint::Post => "/post",
            Endpoint::Comment => "/comment",
            Endpoint::Edit => "/edit",
            Endpoint::Vote => "/vote",
            Endpoint::UnirepSignUp => "/user-unirep-sign-up",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RelayerResponse {
    pub status: u16,
    #[serde(default)]
    pub data: Value,
}

impl RelayerResponse {
    /// `Ok(data)` on status 200, otherwise the relayer's message as an error.
    pub fn into_data(self) -> ForumResult<Value> {
        if self.status == 200 {
            return Ok(self.data);
        }
        Err(ForumError::Relayer {
            status: self.status,
            message: relayer_message(&self.data),
        })
    }
}

fn relayer_message(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        Value::Null => "no details".to_string(),
        other => other.to_string(),
    }
}

pub trait Relayer {
    /// POST `body` to `endpoint`; errors on transport failure or non-200.
    fn post(&self, endpoint: Endpoint, body: Value) -> impl Future<Output = ForumResult<Value>> + Send;
}

pub struct RelayerClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl Relayer for RelayerClient {
    async fn post(&self, endpoint: Endpoint, body: Value) -> ForumResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(%url, "relayer request");
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForumError::Relayer {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            })?;

        let http_status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| ForumError::Relayer {
            status: http_status,
            message: e.to_string(),
        })?;
        let reply = match serde_json::from_str::<RelayerResponse>(&text) {
            Ok(reply) => reply,
            Err(_) => RelayerResponse {
                status: http_status,
                data: Value::String(text),
            },
        };
        if reply.status != 200 {
            tracing::warn!(endpoint = endpoint.path(), status = reply.status, "relayer rejected request");
        }
        reply.into_data()
    }
}

/// Read an unsigned id from an event argument: a BigNumber `{hex}` object,
/// a JSON number, or a decimal / `0x` hex string.
pub fn parse_event_uint(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_uint_str(s),
        Value::Object(map) => map
            .get("hex")
            .or_else(|| map.get("_hex"))
            .and_then(Value::as_str)
            .and_then(parse_uint_str),
        _ => None,
    }
}

fn parse_uint_str(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn event_arg(data: &Value, index: usize, field: &'static str) -> ForumResult<u64> {
    data.get("args")
        .and_then(|args| args.get(index))
        .and_then(parse_event_uint)
        .ok_or(ForumError::MissingField(field))
}

/// New item id from a create response: `data.args[2]`.
pub fn event_item_id(data: &Value) -> ForumResult<u64> {
    event_arg(data, 2, "args[2]")
}

/// New group id from a create-group response: `data.args[0]`.
pub fn event_group_id(data: &Value) -> ForumResult<u64> {
    event_arg(data, 0, "args[0]")
}
