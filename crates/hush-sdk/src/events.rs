// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Contract events and their authoritative effect on the cache.
//!
//! Events arrive two ways: in relayer create responses (`{event, args}`)
//! and as raw logs read by the watcher, which reshapes each log's ABI
//! words into the same `{event, args}` form. Both go through
//! [`ChainEvent::from_relayer`].
//!
//! | Event | Args |
//! |---|---|
//! | `NewGroupCreated` | groupId, name (bytes32), creator commitment |
//! | `NewItem` | kind, groupId, itemId, parentId, contentCID, note |
//! | `VoteItem` | voteType, kind, groupId, itemId, parentId, upvote, downvote |
//! | `UpdateItem` | kind, groupId, itemId, parentId, contentCID |
//! | `NewUser` | groupId, identity commitment |

use ark_bls12_381::Fr;
use ark_ff::PrimeField;
use serde_json::{json, Value};

use crate::cache::{keys, Cache, CacheResult, CacheWrite, JsonStore};
use crate::content::zero_bytes32;
use crate::error::{ForumError, ForumResult};
use crate::models::{fr_from_decimal, fr_to_decimal, Group, Item, Kind, VoteType};
use crate::relayer::parse_event_uint;

/// Solidity signatures; the watcher matches logs on their Keccak-256.
pub const EVENT_SIGNATURES: [(&str, &str); 5] = [
    ("NewGroupCreated", "NewGroupCreated(uint256,bytes32,uint256)"),
    ("NewItem", "NewItem(uint8,uint256,uint256,uint256,bytes32,uint256)"),
    ("VoteItem", "VoteItem(uint8,uint8,uint256,uint256,uint256,uint256,uint256)"),
    ("UpdateItem", "UpdateItem(uint8,uint256,uint256,uint256,bytes32)"),
    ("NewUser", "NewUser(uint256,uint256)"),
];

#[derive(Clone, Debug, PartialEq)]
pub enum ChainEvent {
    NewGroupCreated {
        group_id: u64,
        name: String,
        creator_commitment: String,
    },
    NewItem {
        kind: Kind,
        group_id: u64,
        item_id: u64,
        parent_id: u64,
        content_cid: String,
        note: String,
        block: u64,
    },
    VoteItem {
        vote_type: VoteType,
        kind: Kind,
        group_id: u64,
        item_id: u64,
        parent_id: u64,
        upvote: u64,
        downvote: u64,
    },
    UpdateItem {
        kind: Kind,
        group_id: u64,
        item_id: u64,
        parent_id: u64,
        content_cid: String,
    },
    NewUser {
        group_id: u64,
        commitment: String,
    },
}

struct Args<'a> {
    event: &'static str,
    args: &'a [Value],
}

impl<'a> Args<'a> {
    fn get(&self, i: usize) -> ForumResult<&'a Value> {
        self.args.get(i).ok_or(ForumError::MissingField(self.event))
    }

    fn uint(&self, i: usize) -> ForumResult<u64> {
        parse_event_uint(self.get(i)?).ok_or(ForumError::MissingField(self.event))
    }

    fn kind(&self, i: usize) -> ForumResult<Kind> {
        u8::try_from(self.uint(i)?)
            .ok()
            .and_then(Kind::from_u8)
            .ok_or(ForumError::MissingField(self.event))
    }

    fn vote_type(&self, i: usize) -> ForumResult<VoteType> {
        u8::try_from(self.uint(i)?)
            .ok()
            .and_then(VoteType::from_u8)
            .ok_or(ForumError::MissingField(self.event))
    }

    fn bytes32(&self, i: usize) -> ForumResult<String> {
        let hex = hex_payload(self.get(i)?).ok_or(ForumError::MissingField(self.event))?;
        let raw = hex.strip_prefix("0x").unwrap_or(hex);
        if raw.len() != 64 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ForumError::MissingField(self.event));
        }
        Ok(format!("0x{}", raw.to_ascii_lowercase()))
    }

    /// A field element as a decimal string.
    fn field(&self, i: usize) -> ForumResult<String> {
        let v = self.get(i)?;
        if let Some(n) = v.as_u64() {
            return Ok(n.to_string());
        }
        let s = hex_payload(v).ok_or(ForumError::MissingField(self.event))?;
        match s.strip_prefix("0x") {
            Some(raw) => {
                let bytes = hex::decode(raw).map_err(|_| ForumError::MissingField(self.event))?;
                Ok(fr_to_decimal(&Fr::from_be_bytes_mod_order(&bytes)))
            }
            None => fr_from_decimal(s)
                .map(|f| fr_to_decimal(&f))
                .ok_or(ForumError::MissingField(self.event)),
        }
    }

    /// A short string packed into a bytes32 word, or a plain string.
    fn name(&self, i: usize) -> ForumResult<String> {
        let v = self.get(i)?;
        let s = v.as_str().ok_or(ForumError::MissingField(self.event))?;
        match s.strip_prefix("0x").and_then(|raw| hex::decode(raw).ok()) {
            Some(bytes) => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                String::from_utf8(bytes[..end].to_vec()).map_err(|_| ForumError::MissingField(self.event))
            }
            None => Ok(s.to_string()),
        }
    }
}

fn hex_payload(v: &Value) -> Option<&str> {
    match v {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("hex").or_else(|| map.get("_hex")).and_then(Value::as_str),
        _ => None,
    }
}

fn event_name(name: &str) -> Option<&'static str> {
    EVENT_SIGNATURES.iter().find(|(n, _)| *n == name).map(|(n, _)| *n)
}

impl ChainEvent {
    /// Parse `{event, args, blockNumber?}`.
    pub fn from_relayer(data: &Value) -> ForumResult<ChainEvent> {
        let name = data
            .get("event")
            .and_then(Value::as_str)
            .ok_or(ForumError::MissingField("event"))?;
        let event = event_name(name).ok_or_else(|| ForumError::MissingField("known event name"))?;
        let args = data
            .get("args")
            .and_then(Value::as_array)
            .ok_or(ForumError::MissingField("args"))?;
        let a = Args { event, args };

        Ok(match event {
            "NewGroupCreated" => ChainEvent::NewGroupCreated {
                group_id: a.uint(0)?,
                name: a.name(1)?,
                creator_commitment: a.field(2)?,
            },
            "NewItem" => ChainEvent::NewItem {
                kind: a.kind(0)?,
                group_id: a.uint(1)?,
                item_id: a.uint(2)?,
                parent_id: a.uint(3)?,
                content_cid: a.bytes32(4)?,
                note: a.field(5)?,
                block: data.get("blockNumber").and_then(parse_event_uint).unwrap_or(0),
            },
            "VoteItem" => ChainEvent::VoteItem {
                vote_type: a.vote_type(0)?,
                kind: a.kind(1)?,
                group_id: a.uint(2)?,
                item_id: a.uint(3)?,
                parent_id: a.uint(4)?,
                upvote: a.uint(5)?,
                downvote: a.uint(6)?,
            },
            "UpdateItem" => ChainEvent::UpdateItem {
                kind: a.kind(0)?,
                group_id: a.uint(1)?,
                item_id: a.uint(2)?,
                parent_id: a.uint(3)?,
                content_cid: a.bytes32(4)?,
            },
            _ => ChainEvent::NewUser {
                group_id: a.uint(0)?,
                commitment: a.field(1)?,
            },
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChainEvent::NewGroupCreated { .. } => "NewGroupCreated",
            ChainEvent::NewItem { .. } => "NewItem",
            ChainEvent::VoteItem { .. } => "VoteItem",
            ChainEvent::UpdateItem { .. } => "UpdateItem",
            ChainEvent::NewUser { .. } => "NewUser",
        }
    }
}

/// Write an event's authoritative values into the cache. Events for
/// documents that are not cached are dropped; readers will miss and refetch.
/// Add a comment id to its cached post's `childIds` unless already there.
/// An uncached post is left alone.
pub(crate) async fn link_comment<S: JsonStore>(
    cache: &Cache<S>,
    group_id: u64,
    post_id: u64,
    comment_id: u64,
) -> CacheWrite {
    let parent = keys::post(group_id, post_id);
    if let Some(post) = cache.get(&parent).await.hit() {
        let ids = post.data.get("childIds").and_then(Value::as_array);
        if !ids.is_some_and(|ids| ids.contains(&json!(comment_id))) {
            return cache.append(&parent, "$.data.childIds", &json!(comment_id)).await;
        }
    }
    Ok(())
}

pub async fn apply_event<S: JsonStore>(cache: &Cache<S>, event: &ChainEvent) -> CacheWrite {
    match event {
        ChainEvent::NewGroupCreated {
            group_id,
            name,
            creator_commitment,
        } => {
            let key = keys::group(*group_id);
            if let CacheResult::Miss = cache.get(&key).await {
                let group = Group {
                    id: *group_id,
                    name: name.clone(),
                    group_details: Default::default(),
                    requirements: Vec::new(),
                    user_count: 1,
                    chain_id: 0,
                    posts: Vec::new(),
                    removed: false,
                };
                if let Ok(doc) = serde_json::to_value(&group) {
                    cache.put(&key, &doc).await?;
                }
            }
            cache.push_unique(&keys::groups(), &json!(group_id)).await?;
            cache
                .push_unique(&keys::members(*group_id), &json!(creator_commitment))
                .await
        }

        ChainEvent::NewItem {
            kind,
            group_id,
            item_id,
            parent_id,
            content_cid,
            note,
            block,
        } => {
            let key = keys::item(*kind, *group_id, *parent_id, *item_id);
            let cached = match cache.get(&key).await {
                CacheResult::Hit(entry) => serde_json::from_value::<Item>(entry.data).ok(),
                CacheResult::Miss => None,
                CacheResult::Unavailable(reason) => return Err(crate::cache::CacheError(reason)),
            };
            let item = Item {
                kind: *kind,
                id: *item_id,
                parent_id: *parent_id,
                group_id: *group_id,
                created_at_block: *block,
                note: note.clone(),
                content_cid: content_cid.clone(),
                removed: false,
                ..cached.unwrap_or(Item {
                    kind: *kind,
                    id: *item_id,
                    parent_id: *parent_id,
                    group_id: *group_id,
                    created_at_block: 0,
                    child_ids: Vec::new(),
                    upvote: 0,
                    downvote: 0,
                    note: String::new(),
                    content_cid: String::new(),
                    removed: false,
                    title: None,
                    description: None,
                    created_at: None,
                })
            };
            if let Ok(doc) = serde_json::to_value(&item) {
                cache.put(&key, &doc).await?;
            }
            cache
                .push_unique(&keys::parent_list(*kind, *group_id, *parent_id), &json!(item_id))
                .await?;
            if *kind == Kind::Comment {
                link_comment(cache, *group_id, *parent_id, *item_id).await?;
            }
            Ok(())
        }

        ChainEvent::VoteItem {
            kind,
            group_id,
            item_id,
            parent_id,
            upvote,
            downvote,
            ..
        } => {
            let key = keys::item(*kind, *group_id, *parent_id, *item_id);
            if !cache.get(&key).await.is_hit() {
                return Ok(());
            }
            cache.set_at_path(&key, "$.data.upvote", &json!(upvote)).await?;
            cache.set_at_path(&key, "$.data.downvote", &json!(downvote)).await
        }

        ChainEvent::UpdateItem {
            kind,
            group_id,
            item_id,
            parent_id,
            content_cid,
        } => {
            let key = keys::item(*kind, *group_id, *parent_id, *item_id);
            if !cache.get(&key).await.is_hit() {
                return Ok(());
            }
            cache
                .set_at_path(&key, "$.data.contentCID", &json!(content_cid))
                .await?;
            if *content_cid == zero_bytes32() {
                cache.set_at_path(&key, "$.data.removed", &json!(true)).await?;
            }
            Ok(())
        }

        ChainEvent::NewUser {
            group_id,
            commitment,
        } => {
            cache
                .push_unique(&keys::members(*group_id), &json!(commitment))
                .await
        }
    }
}
