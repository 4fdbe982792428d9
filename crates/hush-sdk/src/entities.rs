// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Forum actions: create, edit, vote and delete items, create and join
//! groups.
//!
//! Every action runs strictly in order: upload → derive note → prove →
//! relayer → cache. The cache is only written after the relayer accepts,
//! and cache failures never fail an action.
//!
//! ```rust,no_run
//! use hush_sdk::cache::{Cache, MemoryStore};
//! use hush_sdk::content::IpfsClient;
//! use hush_sdk::entities::{ActionContext, ItemService};
//! use hush_sdk::models::{ItemContent, Kind};
//! use hush_sdk::prove::Prover;
//! use hush_sdk::reconcile::OptimisticList;
//! use hush_sdk::relayer::RelayerClient;
//! use hush_sdk::IdentitySeed;
//!
//! # async fn example(members: Vec<ark_bls12_381::Fr>) -> hush_sdk::error::ForumResult<()> {
//! let service = ItemService::new(
//!     IpfsClient::new("http://localhost:5001"),
//!     RelayerClient::new("http://localhost:3001"),
//!     Cache::new(MemoryStore::new()),
//!     Prover::load(std::path::Path::new("artifacts"))?,
//! );
//! let ctx = ActionContext::new(IdentitySeed::new("0xabc").in_group(1), 1, members);
//! let mut comments = OptimisticList::new();
//! let item = service
//!     .create(Kind::Comment, 7, &ItemContent::text(None, "hello"), &ctx, &mut comments)
//!     .await?;
//! println!("comment {} posted", item.id);
//! # Ok(())
//! # }
//! ```

use ark_bls12_381::Fr;
use hush_hash::{derive_identity, derive_note, external_nullifier, identity_commitment};
use hush_types::{IdentitySeed, Note};
use serde_json::{json, Value};

use crate::cache::{keys, Cache, CacheResult, JsonStore};
use crate::content::{bytes32_from_ipfs_hash, ipfs_hash_from_bytes32, zero_bytes32, ContentStore};
use crate::error::{ForumError, ForumResult};
use crate::events::link_comment;
use crate::models::{fr_from_decimal, fr_to_decimal, Group, GroupDetails, Item, ItemContent, Kind, Requirement, Role, VoteType};
use crate::prove::{FormattedProof, Prover};
use crate::reconcile::{OptimisticList, Outcome, VoteTally};
use crate::relayer::{event_group_id, event_item_id, Endpoint, Relayer};

/// Who is acting, in which group, and with which privileges.
#[derive(Clone, Debug)]
pub struct ActionContext {
    pub seed: IdentitySeed,
    pub group_id: u64,
    /// Identity commitments of the group, in join order.
    pub members: Vec<Fr>,
    pub role: Role,
}

impl ActionContext {
    pub fn new(seed: IdentitySeed, group_id: u64, members: Vec<Fr>) -> Self {
        Self {
            seed,
            group_id,
            members,
            role: Role::Member,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

fn proof_fields(body: &mut Value, proof: &FormattedProof) {
    body["proof"] = json!(proof.proof);
    body["publicSignals"] = json!(proof.public_signals);
}

pub struct ItemService<C, R, S> {
    content: C,
    relayer: R,
    cache: Cache<S>,
    prover: Prover,
}

impl<C: ContentStore, R: Relayer, S: JsonStore> ItemService<C, R, S> {
    pub fn new(content: C, relayer: R, cache: Cache<S>, prover: Prover) -> Self {
        Self {
            content,
            relayer,
            cache,
            prover,
        }
    }

    pub fn cache(&self) -> &Cache<S> {
        &self.cache
    }

    pub fn relayer(&self) -> &R {
        &self.relayer
    }

    async fn upload(&self, content: &ItemContent) -> ForumResult<String> {
        let payload = serde_json::to_value(content).map_err(anyhow::Error::from)?;
        self.content.upload(&payload).await.ok_or(ForumError::Upload)
    }

    /// Create a post, poll or comment. A placeholder keyed by the content
    /// hash is pushed into `list` and resolved from the relayer outcome.
    pub async fn create(
        &self,
        kind: Kind,
        parent_id: u64,
        content: &ItemContent,
        ctx: &ActionContext,
        list: &mut OptimisticList<ItemContent>,
    ) -> ForumResult<Item> {
        let cid = self.upload(content).await?;
        list.push_pending(&cid, content.clone());

        match self.submit_create(kind, parent_id, &cid, content, ctx).await {
            Ok(item) => {
                list.reconcile(&cid, Outcome::Confirmed(item.id));
                self.cache_new_item(&item).await;
                tracing::info!(kind = kind.as_str(), id = item.id, group = item.group_id, "item created");
                Ok(item)
            }
            Err(e) => {
                list.reconcile(&cid, Outcome::Failed);
                tracing::warn!(kind = kind.as_str(), %cid, error = %e, "create failed, placeholder removed");
                Err(e)
            }
        }
    }

    async fn submit_create(
        &self,
        kind: Kind,
        parent_id: u64,
        cid: &str,
        content: &ItemContent,
        ctx: &ActionContext,
    ) -> ForumResult<Item> {
        let identity = derive_identity(&ctx.seed);
        let note = derive_note(&identity)?;
        let content_cid = bytes32_from_ipfs_hash(cid)?;
        let ext = external_nullifier(cid, kind.as_str());
        let proof = self
            .prover
            .prove_membership(identity, &ctx.members, ext, &content_cid)
            .await?;

        let mut body = json!({
            "groupId": ctx.group_id,
            "parentId": parent_id,
            "kind": kind.as_u8(),
            "contentCID": content_cid,
            "note": note.to_decimal(),
            "signal": content_cid,
        });
        proof_fields(&mut body, &proof);

        let endpoint = match kind {
            Kind::Comment => Endpoint::Comment,
            Kind::Post | Kind::Poll => Endpoint::Post,
        };
        let data = self.relayer.post(endpoint, body).await?;
        let id = event_item_id(&data)?;

        Ok(Item {
            kind,
            id,
            parent_id,
            group_id: ctx.group_id,
            created_at_block: 0,
            child_ids: Vec::new(),
            upvote: 0,
            downvote: 0,
            note: note.to_decimal(),
            content_cid,
            removed: false,
            title: content.title.clone(),
            description: Some(content.description.clone()),
            created_at: Some(crate::cache::now_ms()),
        })
    }

    async fn cache_new_item(&self, item: &Item) {
        let key = keys::item(item.kind, item.group_id, item.parent_id, item.id);
        // the watcher may already hold the chain's view of this item
        let cached = self
            .cache
            .get(&key)
            .await
            .hit()
            .and_then(|entry| serde_json::from_value::<Item>(entry.data).ok());
        let merged = match cached {
            Some(cached) => Item {
                title: item.title.clone().or(cached.title),
                description: item.description.clone().or(cached.description),
                created_at: cached.created_at.or(item.created_at),
                ..cached
            },
            None => item.clone(),
        };
        if let Ok(doc) = serde_json::to_value(&merged) {
            let _ = self.cache.put(&key, &doc).await;
        }
        let list = keys::parent_list(item.kind, item.group_id, item.parent_id);
        let _ = self.cache.push_unique(&list, &json!(item.id)).await;
        if item.kind == Kind::Comment {
            let _ = link_comment(&self.cache, item.group_id, item.parent_id, item.id).await;
        }
    }

    /// Ownership gate shared by edit and delete. Members must hold the
    /// item's note and prove it; moderators and admins skip the proof.
    async fn authorize(&self, item: &Item, ctx: &ActionContext) -> ForumResult<(Note, Option<FormattedProof>)> {
        let identity = derive_identity(&ctx.seed);
        let note = derive_note(&identity)?;
        if ctx.role.bypasses_ownership() {
            return Ok((note, None));
        }
        if Note::from_decimal(&item.note) != Some(note) {
            return Err(ForumError::NotOwner);
        }
        let proof = self.prover.prove_ownership(identity).await?;
        Ok((note, Some(proof)))
    }

    async fn submit_update(&self, item: &Item, content_cid: &str, ctx: &ActionContext) -> ForumResult<()> {
        let (note, proof) = self.authorize(item, ctx).await?;
        let mut body = json!({
            "itemId": item.id,
            "groupId": item.group_id,
            "contentCID": content_cid,
            "note": note.to_decimal(),
            "moderator": proof.is_none(),
        });
        if let Some(proof) = &proof {
            proof_fields(&mut body, proof);
        }
        self.relayer.post(Endpoint::Edit, body).await?;
        Ok(())
    }

    /// Replace an item's content. Returns the item as now cached.
    pub async fn edit(&self, item: &Item, content: &ItemContent, ctx: &ActionContext) -> ForumResult<Item> {
        let cid = self.upload(content).await?;
        let content_cid = bytes32_from_ipfs_hash(&cid)?;
        self.submit_update(item, &content_cid, ctx).await?;

        let key = keys::item(item.kind, item.group_id, item.parent_id, item.id);
        let _ = self.cache.set_at_path(&key, "$.data.contentCID", &json!(content_cid)).await;
        let _ = self.cache.set_at_path(&key, "$.data.title", &json!(content.title)).await;
        let _ = self
            .cache
            .set_at_path(&key, "$.data.description", &content.description)
            .await;
        tracing::info!(id = item.id, %cid, "item edited");

        Ok(Item {
            content_cid,
            title: content.title.clone(),
            description: Some(content.description.clone()),
            ..item.clone()
        })
    }

    /// Point the item at the zero content id and drop its cached document.
    pub async fn delete(&self, item: &Item, ctx: &ActionContext) -> ForumResult<()> {
        self.submit_update(item, &zero_bytes32(), ctx).await?;
        let key = keys::item(item.kind, item.group_id, item.parent_id, item.id);
        let _ = self.cache.remove_at(&key, None).await;
        tracing::info!(id = item.id, "item deleted");
        Ok(())
    }

    /// Vote once per identity per item. The tally moves optimistically and
    /// is reverted if the relayer refuses.
    pub async fn vote(
        &self,
        item: &Item,
        vote_type: VoteType,
        ctx: &ActionContext,
        tally: &mut VoteTally,
    ) -> ForumResult<()> {
        let identity = derive_identity(&ctx.seed);
        let ext = external_nullifier(&item.id.to_string(), "vote");
        let signal = vote_type.as_u8().to_string();
        let proof = self
            .prover
            .prove_membership(identity, &ctx.members, ext, &signal)
            .await?;

        tally.apply_optimistic(vote_type);
        let mut body = json!({
            "groupId": item.group_id,
            "itemId": item.id,
            "voteType": vote_type.as_u8(),
        });
        proof_fields(&mut body, &proof);

        match self.relayer.post(Endpoint::Vote, body).await {
            Ok(_) => {
                tally.confirm();
                let key = keys::item(item.kind, item.group_id, item.parent_id, item.id);
                let (path, count) = match vote_type {
                    VoteType::Upvote => ("$.data.upvote", tally.upvote),
                    VoteType::Downvote => ("$.data.downvote", tally.downvote),
                };
                let _ = self.cache.set_at_path(&key, path, &json!(count)).await;
                Ok(())
            }
            Err(e) => {
                tally.revert();
                tracing::warn!(id = item.id, error = %e, "vote failed, tally reverted");
                Err(e)
            }
        }
    }

    /// Create a group with the caller as its first member.
    pub async fn create_group(
        &self,
        name: &str,
        details: GroupDetails,
        requirements: Vec<Requirement>,
        ctx: &ActionContext,
    ) -> ForumResult<Group> {
        create_group(&self.relayer, &self.cache, name, details, requirements, ctx).await
    }

    pub async fn join_group(&self, group_id: u64, ctx: &ActionContext) -> ForumResult<Fr> {
        join_group(&self.relayer, &self.cache, group_id, ctx).await
    }

    /// Off-chain body of an item; `None` once the item has been deleted.
    pub async fn load_content(&self, item: &Item) -> ForumResult<Option<ItemContent>> {
        let cid = ipfs_hash_from_bytes32(&item.content_cid)?;
        if cid.is_empty() {
            return Ok(None);
        }
        let text = self.content.fetch(&cid).await?;
        let content = serde_json::from_str(&text).map_err(anyhow::Error::from)?;
        Ok(Some(content))
    }
}

/// Create a group with the caller as its first member. Needs no proof,
/// so it takes only the relayer and the cache.
pub async fn create_group<R: Relayer, S: JsonStore>(
    relayer: &R,
    cache: &Cache<S>,
    name: &str,
    details: GroupDetails,
    requirements: Vec<Requirement>,
    ctx: &ActionContext,
) -> ForumResult<Group> {
    let identity = derive_identity(&ctx.seed);
    let note = derive_note(&identity)?;
    let commitment = fr_to_decimal(&identity_commitment(&identity));
    let body = json!({
        "name": name,
        "groupDetails": details,
        "requirements": requirements,
        "note": note.to_decimal(),
        "identityCommitment": commitment,
    });
    let data = relayer.post(Endpoint::CreateGroup, body).await?;
    let id = event_group_id(&data)?;

    let group = Group {
        id,
        name: name.to_string(),
        group_details: details,
        requirements,
        user_count: 1,
        chain_id: 0,
        posts: Vec::new(),
        removed: false,
    };
    if let Ok(doc) = serde_json::to_value(&group) {
        let _ = cache.put(&keys::group(id), &doc).await;
    }
    let _ = cache.push_unique(&keys::groups(), &json!(id)).await;
    let _ = cache.push_unique(&keys::members(id), &json!(commitment)).await;
    tracing::info!(id, %name, "group created");
    Ok(group)
}

/// Register the caller's identity commitment in `group_id`.
pub async fn join_group<R: Relayer, S: JsonStore>(
    relayer: &R,
    cache: &Cache<S>,
    group_id: u64,
    ctx: &ActionContext,
) -> ForumResult<Fr> {
    let identity = derive_identity(&ctx.seed);
    let commitment = identity_commitment(&identity);
    let body = json!({
        "groupId": group_id,
        "identityCommitment": fr_to_decimal(&commitment),
    });
    relayer.post(Endpoint::JoinGroup, body).await?;

    let _ = cache
        .push_unique(&keys::members(group_id), &json!(fr_to_decimal(&commitment)))
        .await;
    if let CacheResult::Hit(entry) = cache.get(&keys::group(group_id)).await {
        let count = entry.data.get("userCount").and_then(Value::as_u64).unwrap_or(0);
        let _ = cache
            .set_at_path(&keys::group(group_id), "$.data.userCount", &json!(count + 1))
            .await;
    }
    tracing::info!(group = group_id, "joined group");
    Ok(commitment)
}

/// Member commitments cached under `{group}_members`, in join order.
/// Entries that are not decimal field elements are skipped.
pub async fn cached_members<S: JsonStore>(cache: &Cache<S>, group_id: u64) -> CacheResult<Vec<Fr>> {
    match cache.get(&keys::members(group_id)).await {
        CacheResult::Hit(entry) => CacheResult::Hit(
            entry
                .data
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(fr_from_decimal)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        CacheResult::Miss => CacheResult::Miss,
        CacheResult::Unavailable(reason) => CacheResult::Unavailable(reason),
    }
}

/// Cached item document at `key`, if present and well formed.
pub async fn cached_item<S: JsonStore>(cache: &Cache<S>, key: &str) -> Option<Item> {
    let entry = cache.get(key).await.hit()?;
    serde_json::from_value(entry.data).ok()
}
