use hush_sdk::events::{ChainEvent, EVENT_SIGNATURES};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Upper bound on one `eth_getLogs` block range.
pub const MAX_BLOCK_RANGE: u64 = 2_000;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: String,
    pub transaction_hash: String,
    pub log_index: String,
}

impl RpcLog {
    pub fn block(&self) -> anyhow::Result<u64> {
        parse_quantity(&self.block_number)
    }

    pub fn index(&self) -> anyhow::Result<u64> {
        parse_quantity(&self.log_index)
    }
}

/// `0x`-prefixed Keccak-256 of an event signature (topic 0).
pub fn topic_of(signature: &str) -> String {
    format!("0x{}", hex::encode(Keccak256::digest(signature.as_bytes())))
}

fn event_for_topic(topic: &str) -> Option<&'static str> {
    EVENT_SIGNATURES
        .iter()
        .find(|(_, sig)| topic_of(sig).eq_ignore_ascii_case(topic))
        .map(|(name, _)| *name)
}

pub fn parse_quantity(s: &str) -> anyhow::Result<u64> {
    let hex = s
        .strip_prefix("0x")
        .ok_or_else(|| anyhow::anyhow!("quantity without 0x: {s}"))?;
    Ok(u64::from_str_radix(hex, 16)?)
}

async fn call<T: for<'de> Deserialize<'de>>(
    client: &Client,
    rpc_url: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<T> {
    let req = JsonRpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };
    let resp: JsonRpcResponse<T> = client.post(rpc_url).json(&req).send().await?.json().await?;
    match resp.result {
        Some(r) => Ok(r),
        None => Err(anyhow::anyhow!("{method} error: {:?}", resp.error)),
    }
}

pub async fn block_number(client: &Client, rpc_url: &str) -> anyhow::Result<u64> {
    let hex: String = call(client, rpc_url, "eth_blockNumber", serde_json::json!([])).await?;
    parse_quantity(&hex)
}

/// Logs of `address` in `[from, to]`.
pub async fn get_logs(
    client: &Client,
    rpc_url: &str,
    address: &str,
    from: u64,
    to: u64,
) -> anyhow::Result<Vec<RpcLog>> {
    let params = serde_json::json!([{
        "address": address,
        "fromBlock": format!("0x{from:x}"),
        "toBlock": format!("0x{to:x}"),
    }]);
    call(client, rpc_url, "eth_getLogs", params).await
}

/// Decode a log into a forum event. `Ok(None)` for topics that are not
/// forum events.
pub fn decode_log(log: &RpcLog) -> anyhow::Result<Option<ChainEvent>> {
    let Some(topic) = log.topics.first() else {
        return Ok(None);
    };
    let Some(name) = event_for_topic(topic) else {
        return Ok(None);
    };
    let raw = log.data.strip_prefix("0x").unwrap_or(&log.data);
    if raw.len() % 64 != 0 {
        anyhow::bail!("{name}: data is not a whole number of words ({} hex chars)", raw.len());
    }
    let words: Vec<String> = raw
        .as_bytes()
        .chunks(64)
        .map(|w| format!("0x{}", String::from_utf8_lossy(w)))
        .collect();
    let payload = serde_json::json!({
        "event": name,
        "args": words,
        "blockNumber": log.block_number,
    });
    Ok(Some(ChainEvent::from_relayer(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn word(n: u64) -> String {
        format!("{n:064x}")
    }

    fn log_with(topic: String, words: &[String]) -> RpcLog {
        RpcLog {
            address: "0xforum".into(),
            topics: vec![topic],
            data: format!("0x{}", words.concat()),
            block_number: "0x10".into(),
            transaction_hash: "0xtx".into(),
            log_index: "0x0".into(),
        }
    }

    #[test]
    fn topic_is_keccak_of_signature() {
        // keccak256("Transfer(address,address,uint256)")
        assert_eq!(
            topic_of("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn decodes_new_user() {
        let log = log_with(topic_of("NewUser(uint256,uint256)"), &[word(3), word(99)]);
        assert_eq!(
            decode_log(&log).unwrap(),
            Some(ChainEvent::NewUser {
                group_id: 3,
                commitment: "99".into(),
            })
        );
        assert_eq!(log.block().unwrap(), 16);
    }

    #[test]
    fn unknown_topic_is_skipped() {
        let log = log_with(topic_of("Other(uint256)"), &[word(1)]);
        assert_eq!(decode_log(&log).unwrap(), None);
    }

    #[test]
    fn ragged_data_is_an_error() {
        let mut log = log_with(topic_of("NewUser(uint256,uint256)"), &[word(3)]);
        log.data.push_str("ab");
        assert!(decode_log(&log).is_err());
    }

    #[test]
    fn quantities() {
        assert_eq!(parse_quantity("0x1f").unwrap(), 31);
        assert!(parse_quantity("31").is_err());
    }
}
