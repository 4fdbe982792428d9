use anyhow::Result;
use hush_sdk::content::{bytes32_from_ipfs_hash, ipfs_hash_from_bytes32};

use crate::output;

/// `0x…` input is read as bytes32, anything else as a CIDv0.
pub fn run(value: &str) -> Result<()> {
    let (cid, bytes32) = if value.starts_with("0x") {
        (ipfs_hash_from_bytes32(value)?, value.to_lowercase())
    } else {
        (value.to_string(), bytes32_from_ipfs_hash(value)?)
    };

    if output::is_json() {
        output::json_output(serde_json::json!({ "cid": cid, "bytes32": bytes32 }));
    } else if cid.is_empty() {
        output::label("cid", "(none, zero pointer)");
        output::label("bytes32", &bytes32);
    } else {
        output::label("cid", &cid);
        output::label("bytes32", &bytes32);
    }
    Ok(())
}
