use anyhow::Result;
use hush_sdk::config::ForumConfig;
use hush_sdk::models::fr_to_decimal;
use hush_sdk::{derive_identity, derive_note, identity_commitment};

use crate::output;
use crate::session::seed_from;

pub fn run(config: &ForumConfig, group_id: u64, user: Option<&str>) -> Result<()> {
    let seed = seed_from(config, group_id, user)?;
    let identity = derive_identity(&seed);
    let note = derive_note(&identity)?;
    let commitment = fr_to_decimal(&identity_commitment(&identity));

    if output::is_json() {
        output::json_output(serde_json::json!({
            "group_id": group_id,
            "identity_commitment": commitment,
            "note": note.to_decimal(),
        }));
    } else {
        output::label("group", &group_id.to_string());
        output::label("identity_commitment", &commitment);
        output::label("note", &note.to_decimal());
    }
    Ok(())
}
