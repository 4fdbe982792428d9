use anyhow::Result;
use hush_sdk::cache::{keys, JsonStore};
use hush_sdk::entities::{create_group, join_group, ActionContext};
use hush_sdk::models::{fr_to_decimal, GroupDetails};

use crate::output;
use crate::session::Session;

pub async fn join<S: JsonStore + Clone + Send + Sync>(
    session: &Session<S>,
    group_id: u64,
    user: Option<String>,
) -> Result<()> {
    let seed = session.seed(group_id, user.as_deref())?;
    let ctx = ActionContext::new(seed, group_id, Vec::new());

    let sp = output::spinner(&format!("joining group {group_id}..."));
    let result = join_group(&session.relayer(), &session.cache(), group_id, &ctx).await;
    sp.finish_and_clear();
    let commitment = fr_to_decimal(&result?);

    if output::is_json() {
        output::json_output(serde_json::json!({
            "group_id": group_id,
            "identity_commitment": commitment,
        }));
    } else {
        output::success(&format!("joined group {group_id}"));
        output::label("identity_commitment", &commitment);
    }
    Ok(())
}

/// One past the highest cached group id.
async fn next_group_id<S: JsonStore + Clone>(session: &Session<S>) -> u64 {
    session
        .cache()
        .get(&keys::groups())
        .await
        .hit()
        .and_then(|entry| {
            entry
                .data
                .as_array()
                .and_then(|ids| ids.iter().filter_map(|id| id.as_u64()).max())
        })
        .map_or(1, |max| max + 1)
}

pub async fn create<S: JsonStore + Clone + Send + Sync>(
    session: &Session<S>,
    name: &str,
    description: String,
    tags: Vec<String>,
    expected_id: Option<u64>,
    user: Option<String>,
) -> Result<()> {
    // the creator's identity is bound to the id the group will get
    let expected = match expected_id {
        Some(id) => id,
        None => next_group_id(session).await,
    };
    let seed = session.seed(expected, user.as_deref())?;
    let ctx = ActionContext::new(seed, expected, Vec::new());
    let details = GroupDetails {
        description,
        tags,
        ..Default::default()
    };

    let sp = output::spinner(&format!("creating group {name}..."));
    let result = create_group(&session.relayer(), &session.cache(), name, details, Vec::new(), &ctx).await;
    sp.finish_and_clear();
    let group = result?;
    if group.id != expected {
        output::warn(&format!(
            "group was assigned id {} but your identity is bound to {expected}; run `hush join -g {}`",
            group.id, group.id
        ));
    }

    if output::is_json() {
        output::json_output(serde_json::to_value(&group)?);
    } else {
        output::success(&format!("group {} created", group.name));
        output::label("id", &group.id.to_string());
    }
    Ok(())
}
