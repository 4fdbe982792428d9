use anyhow::Result;
use hush_sdk::cache::{keys, JsonStore};
use hush_sdk::entities::cached_item;
use hush_sdk::models::{Item, ItemContent, Kind, Role, VoteType};
use hush_sdk::reconcile::{OptimisticList, VoteTally};

use crate::output;
use crate::session::Session;

/// Where an existing item lives.
pub struct ItemRef {
    pub group_id: u64,
    pub kind: Kind,
    pub id: u64,
    pub parent_id: u64,
    pub user: Option<String>,
}

impl ItemRef {
    fn key(&self) -> String {
        keys::item(self.kind, self.group_id, self.parent_id, self.id)
    }
}

pub fn body(title: Option<String>, text: &str, options: Vec<String>) -> ItemContent {
    ItemContent {
        options,
        ..ItemContent::text(title.as_deref(), text)
    }
}

fn role(moderator: bool) -> Role {
    if moderator {
        Role::Moderator
    } else {
        Role::Member
    }
}

async fn load<S: JsonStore + Clone>(session: &Session<S>, target: &ItemRef) -> Result<Item> {
    cached_item(&session.cache(), &target.key()).await.ok_or_else(|| {
        output::fail_with_hint(
            &format!("{} {} not in cache", target.kind.as_str(), target.id),
            "the watcher caches items as they appear on chain",
        )
    })
}

fn report(verb: &str, item: &Item) {
    if output::is_json() {
        output::json_output(serde_json::to_value(item).unwrap_or_default());
    } else {
        output::success(&format!("{} {verb}", item.kind.as_str()));
        output::label("id", &item.id.to_string());
        output::label("group", &item.group_id.to_string());
        output::label("contentCID", &item.content_cid);
        output::label("note", &item.note);
    }
}

pub async fn create<S: JsonStore + Clone + Send + Sync>(
    session: &Session<S>,
    group_id: u64,
    user: Option<String>,
    kind: Kind,
    parent_id: u64,
    content: ItemContent,
) -> Result<()> {
    let ctx = session.context(group_id, user.as_deref(), Role::Member).await?;
    let service = session.service()?;
    let mut list = OptimisticList::new();

    let sp = output::spinner(&format!("proving and submitting {}...", kind.as_str()));
    let result = service.create(kind, parent_id, &content, &ctx, &mut list).await;
    sp.finish_and_clear();

    report("created", &result?);
    Ok(())
}

pub async fn edit<S: JsonStore + Clone + Send + Sync>(
    session: &Session<S>,
    target: &ItemRef,
    content: ItemContent,
    moderator: bool,
) -> Result<()> {
    let item = load(session, target).await?;
    let ctx = session
        .context(target.group_id, target.user.as_deref(), role(moderator))
        .await?;
    let service = session.service()?;

    let sp = output::spinner("submitting edit...");
    let result = service.edit(&item, &content, &ctx).await;
    sp.finish_and_clear();

    report("edited", &result?);
    Ok(())
}

pub async fn delete<S: JsonStore + Clone + Send + Sync>(
    session: &Session<S>,
    target: &ItemRef,
    moderator: bool,
) -> Result<()> {
    let item = load(session, target).await?;
    let ctx = session
        .context(target.group_id, target.user.as_deref(), role(moderator))
        .await?;
    let service = session.service()?;

    let sp = output::spinner("submitting delete...");
    let result = service.delete(&item, &ctx).await;
    sp.finish_and_clear();
    result?;

    if output::is_json() {
        output::json_output(serde_json::json!({ "deleted": item.id, "kind": item.kind }));
    } else {
        output::success(&format!("{} {} deleted", item.kind.as_str(), item.id));
    }
    Ok(())
}

pub async fn vote<S: JsonStore + Clone + Send + Sync>(session: &Session<S>, target: &ItemRef, down: bool) -> Result<()> {
    let item = load(session, target).await?;
    let ctx = session
        .context(target.group_id, target.user.as_deref(), Role::Member)
        .await?;
    let service = session.service()?;
    let vote_type = if down { VoteType::Downvote } else { VoteType::Upvote };
    let mut tally = VoteTally::new(item.upvote, item.downvote);

    let sp = output::spinner("proving and submitting vote...");
    let result = service.vote(&item, vote_type, &ctx, &mut tally).await;
    sp.finish_and_clear();
    result?;

    if output::is_json() {
        output::json_output(serde_json::json!({
            "id": item.id,
            "upvote": tally.upvote,
            "downvote": tally.downvote,
        }));
    } else {
        output::success("vote recorded");
        output::label("upvote", &tally.upvote.to_string());
        output::label("downvote", &tally.downvote.to_string());
    }
    Ok(())
}
