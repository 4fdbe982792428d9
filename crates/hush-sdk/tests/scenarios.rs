// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Forum actions end to end against in-process content, relayer and cache.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, OnceLock};

use ark_bls12_381::Fr;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Value};

use hush_sdk::cache::{keys, Cache, CacheResult, JsonStore, MemoryStore};
use hush_sdk::content::{bytes32_from_ipfs_hash, ipfs_hash_from_bytes32, zero_bytes32, ContentStore};
use hush_sdk::entities::{cached_item, cached_members, join_group, ActionContext, ItemService};
use hush_sdk::error::{ForumError, ForumResult};
use hush_sdk::events::{apply_event, ChainEvent};
use hush_sdk::models::{fr_to_decimal, Item, ItemContent, Kind, Role, VoteType};
use hush_sdk::prove::Prover;
use hush_sdk::reconcile::{EntryId, OptimisticList, PendingState, VoteTally};
use hush_sdk::relayer::{Endpoint, Relayer};
use hush_sdk::{derive_identity, derive_note, identity_commitment, IdentitySeed};

// ── fakes ────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeContent {
    pinned: Mutex<HashMap<String, String>>,
    next: Mutex<u8>,
    offline: bool,
}

impl FakeContent {
    fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }
}

impl ContentStore for FakeContent {
    async fn upload(&self, payload: &Value) -> Option<String> {
        if self.offline {
            return None;
        }
        let mut next = self.next.lock().unwrap();
        *next += 1;
        let hash = ipfs_hash_from_bytes32(&format!("0x{}", hex::encode([*next; 32]))).ok()?;
        self.pinned.lock().unwrap().insert(hash.clone(), payload.to_string());
        Some(hash)
    }

    async fn fetch(&self, hash: &str) -> ForumResult<String> {
        self.pinned
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| ForumError::Ipfs(format!("{hash} not pinned")))
    }
}

/// Replies from a script, in order; records every request.
#[derive(Default)]
struct FakeRelayer {
    replies: Mutex<VecDeque<ForumResult<Value>>>,
    seen: Mutex<Vec<(Endpoint, Value)>>,
}

impl FakeRelayer {
    fn replying(replies: Vec<ForumResult<Value>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::default(),
        }
    }

    fn seen(&self) -> Vec<(Endpoint, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Relayer for FakeRelayer {
    async fn post(&self, endpoint: Endpoint, body: Value) -> ForumResult<Value> {
        self.seen.lock().unwrap().push((endpoint, body));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

fn relayer_refusal() -> ForumError {
    ForumError::Relayer {
        status: 500,
        message: "execution reverted".into(),
    }
}

// ── fixtures ─────────────────────────────────────────────────────────

fn prover() -> Prover {
    static PROVER: OnceLock<Prover> = OnceLock::new();
    PROVER
        .get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(42);
            let (membership, _) = hush_circuits::membership::setup(&mut rng).unwrap();
            let params = hush_hash::pedersen_params().unwrap();
            let (owner, _) = hush_circuits::ownership::setup(params, &mut rng).unwrap();
            Prover::new(membership, owner)
        })
        .clone()
}

fn seed() -> IdentitySeed {
    IdentitySeed::new("0xA11ce").in_group(1)
}

fn member_ctx(role: Role) -> ActionContext {
    let other = identity_commitment(&derive_identity(&IdentitySeed::new("0xB0b").in_group(1)));
    let me = identity_commitment(&derive_identity(&seed()));
    ActionContext::new(seed(), 1, vec![other, me]).with_role(role)
}

fn service(
    content: FakeContent,
    relayer: FakeRelayer,
) -> ItemService<FakeContent, FakeRelayer, MemoryStore> {
    ItemService::new(content, relayer, Cache::new(MemoryStore::new()), prover())
}

fn post_item(id: u64, note: String) -> Item {
    Item {
        kind: Kind::Post,
        id,
        parent_id: 0,
        group_id: 1,
        created_at_block: 3,
        child_ids: vec![],
        upvote: 10,
        downvote: 0,
        note,
        content_cid: format!("0x{}", hex::encode([0x42u8; 32])),
        removed: false,
        title: Some("hello".into()),
        description: None,
        created_at: None,
    }
}

fn my_note() -> String {
    derive_note(&derive_identity(&seed())).unwrap().to_decimal()
}

// ── scenarios ────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_placeholder_becomes_confirmed_id() {
    let relayer = FakeRelayer::replying(vec![Ok(json!({ "event": "NewItem", "args": [1, 1, 5, 7] }))]);
    let svc = service(FakeContent::default(), relayer);
    svc.cache()
        .put(&keys::post(1, 7), &serde_json::to_value(post_item(7, "1".into())).unwrap())
        .await
        .unwrap();

    let mut comments = OptimisticList::new();
    let content = ItemContent::text(None, "first");
    let item = svc
        .create(Kind::Comment, 7, &content, &member_ctx(Role::Member), &mut comments)
        .await
        .unwrap();

    assert_eq!(item.id, 5);
    assert_eq!(item.note, my_note());
    assert_eq!(comments.ids(), vec![EntryId::Confirmed(5)]);
    assert_eq!(comments.pending_count(), 0);

    // the relayer saw the bytes32 form and a four-signal membership proof
    let seen = svc_relayer_calls(&svc);
    assert_eq!(seen.len(), 1);
    let (endpoint, body) = &seen[0];
    assert_eq!(*endpoint, Endpoint::Comment);
    assert_eq!(body["parentId"], 7);
    assert_eq!(body["publicSignals"].as_array().unwrap().len(), 4);
    let cid = body["contentCID"].as_str().unwrap();
    assert_eq!(bytes32_from_ipfs_hash(&ipfs_hash_from_bytes32(cid).unwrap()).unwrap(), cid);

    let cached = cached_item(svc.cache(), &keys::comment(7, 5)).await.unwrap();
    assert_eq!(cached.content_cid, cid);
    let list = svc.cache().get(&keys::comments(7)).await.hit().unwrap();
    assert_eq!(list.data, json!([5]));
    let post = svc.cache().get(&keys::post(1, 7)).await.hit().unwrap();
    assert_eq!(post.data["childIds"], json!([5]));

    let loaded = svc.load_content(&cached).await.unwrap().unwrap();
    assert_eq!(loaded, content);
}

fn svc_relayer_calls(svc: &ItemService<FakeContent, FakeRelayer, MemoryStore>) -> Vec<(Endpoint, Value)> {
    svc.relayer().seen()
}

#[tokio::test]
async fn refused_create_rolls_back_placeholder() {
    let relayer = FakeRelayer::replying(vec![Err(relayer_refusal())]);
    let svc = service(FakeContent::default(), relayer);
    let mut posts = OptimisticList::from_confirmed([(1, ItemContent::text(Some("old"), "x"))]);

    let err = svc
        .create(Kind::Post, 0, &ItemContent::text(Some("t"), "b"), &member_ctx(Role::Member), &mut posts)
        .await
        .unwrap_err();

    assert!(matches!(err, ForumError::Relayer { status: 500, .. }));
    assert_eq!(posts.ids(), vec![EntryId::Confirmed(1)]);
    assert!(matches!(svc.cache().get(&keys::posts(1)).await, CacheResult::Miss));
}

#[tokio::test]
async fn failed_upload_stops_before_relayer() {
    let svc = service(FakeContent::offline(), FakeRelayer::default());
    let mut posts = OptimisticList::new();
    let err = svc
        .create(Kind::Post, 0, &ItemContent::text(Some("t"), "b"), &member_ctx(Role::Member), &mut posts)
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::Upload));
    assert_eq!(err.to_string(), "Upload to IPFS failed");
    assert!(posts.is_empty());
    assert!(svc_relayer_calls(&svc).is_empty());
}

#[tokio::test]
async fn non_member_cannot_post() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let outsider = ActionContext::new(seed(), 1, vec![Fr::from(9u64)]);
    let mut posts = OptimisticList::new();
    let err = svc
        .create(Kind::Post, 0, &ItemContent::text(Some("t"), "b"), &outsider, &mut posts)
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::Proof(hush_sdk::error::ProofError::NotAMember)));
    assert!(posts.is_empty());
}

#[tokio::test]
async fn upvote_is_optimistic_then_cached() {
    let svc = service(FakeContent::default(), FakeRelayer::replying(vec![Ok(json!({}))]));
    let item = post_item(3, "1".into());
    svc.cache()
        .put(&keys::post(1, 3), &serde_json::to_value(&item).unwrap())
        .await
        .unwrap();

    let mut tally = VoteTally::new(10, 0);
    svc.vote(&item, VoteType::Upvote, &member_ctx(Role::Member), &mut tally)
        .await
        .unwrap();

    assert_eq!(tally, VoteTally::new(11, 0));
    let cached = cached_item(svc.cache(), &keys::post(1, 3)).await.unwrap();
    assert_eq!(cached.upvote, 11);

    let (endpoint, body) = &svc_relayer_calls(&svc)[0];
    assert_eq!(*endpoint, Endpoint::Vote);
    assert_eq!(body["voteType"], 0);
}

#[tokio::test]
async fn refused_vote_reverts_tally() {
    let svc = service(FakeContent::default(), FakeRelayer::replying(vec![Err(relayer_refusal())]));
    let item = post_item(3, "1".into());
    let mut tally = VoteTally::new(10, 2);
    assert!(svc
        .vote(&item, VoteType::Downvote, &member_ctx(Role::Member), &mut tally)
        .await
        .is_err());
    assert_eq!(tally, VoteTally::new(10, 2));
}

#[tokio::test]
async fn edit_by_stranger_is_rejected() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, "12345".into());
    let err = svc
        .edit(&item, &ItemContent::text(Some("new"), "b"), &member_ctx(Role::Member))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::NotOwner));
    assert!(svc_relayer_calls(&svc).is_empty());
}

#[tokio::test]
async fn owner_edit_carries_ownership_proof() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, my_note());
    svc.cache()
        .put(&keys::post(1, 3), &serde_json::to_value(&item).unwrap())
        .await
        .unwrap();

    let edited = svc
        .edit(&item, &ItemContent::text(Some("new"), "b"), &member_ctx(Role::Member))
        .await
        .unwrap();

    let (endpoint, body) = &svc_relayer_calls(&svc)[0];
    assert_eq!(*endpoint, Endpoint::Edit);
    assert_eq!(body["moderator"], false);
    assert_eq!(body["publicSignals"].as_array().unwrap().len(), 1);
    let cached = cached_item(svc.cache(), &keys::post(1, 3)).await.unwrap();
    assert_eq!(cached.content_cid, edited.content_cid);
    assert_eq!(cached.title.as_deref(), Some("new"));
}

#[tokio::test]
async fn moderator_edits_without_proof() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, "12345".into());
    svc.edit(&item, &ItemContent::text(Some("mod"), "b"), &member_ctx(Role::Moderator))
        .await
        .unwrap();
    let (_, body) = &svc_relayer_calls(&svc)[0];
    assert_eq!(body["moderator"], true);
    assert!(body.get("proof").is_none());
}

#[tokio::test]
async fn delete_zeroes_content_and_evicts() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, "12345".into());
    svc.cache()
        .put(&keys::post(1, 3), &serde_json::to_value(&item).unwrap())
        .await
        .unwrap();

    svc.delete(&item, &member_ctx(Role::Admin)).await.unwrap();

    let (_, body) = &svc_relayer_calls(&svc)[0];
    assert_eq!(body["contentCID"], zero_bytes32());
    assert!(matches!(svc.cache().get(&keys::post(1, 3)).await, CacheResult::Miss));

    let gone = Item {
        content_cid: zero_bytes32(),
        ..item
    };
    assert_eq!(svc.load_content(&gone).await.unwrap(), None);
}

#[tokio::test]
async fn owner_delete_carries_ownership_proof() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, my_note());
    svc.cache()
        .put(&keys::post(1, 3), &serde_json::to_value(&item).unwrap())
        .await
        .unwrap();

    svc.delete(&item, &member_ctx(Role::Member)).await.unwrap();

    let (endpoint, body) = &svc_relayer_calls(&svc)[0];
    assert_eq!(*endpoint, Endpoint::Edit);
    assert_eq!(body["moderator"], false);
    assert_eq!(body["contentCID"], zero_bytes32());
    assert_eq!(body["publicSignals"].as_array().unwrap().len(), 1);
    assert!(matches!(svc.cache().get(&keys::post(1, 3)).await, CacheResult::Miss));
}

#[tokio::test]
async fn delete_by_stranger_is_rejected() {
    let svc = service(FakeContent::default(), FakeRelayer::default());
    let item = post_item(3, "12345".into());
    svc.cache()
        .put(&keys::post(1, 3), &serde_json::to_value(&item).unwrap())
        .await
        .unwrap();

    let err = svc.delete(&item, &member_ctx(Role::Member)).await.unwrap_err();
    assert!(matches!(err, ForumError::NotOwner));
    assert!(svc_relayer_calls(&svc).is_empty());
    assert!(svc.cache().get(&keys::post(1, 3)).await.is_hit());
}

#[tokio::test]
async fn create_after_watcher_keeps_chain_view() {
    let relayer = FakeRelayer::replying(vec![Ok(json!({ "event": "NewItem", "args": [1, 1, 5, 7] }))]);
    let svc = service(FakeContent::default(), relayer);
    svc.cache()
        .put(&keys::post(1, 7), &serde_json::to_value(post_item(7, "1".into())).unwrap())
        .await
        .unwrap();

    // the watcher sees the receipt before the relayer answers
    let chain_cid = format!("0x{}", hex::encode([1u8; 32]));
    let event = ChainEvent::NewItem {
        kind: Kind::Comment,
        group_id: 1,
        item_id: 5,
        parent_id: 7,
        content_cid: chain_cid.clone(),
        note: my_note(),
        block: 99,
    };
    apply_event(svc.cache(), &event).await.unwrap();

    let mut comments = OptimisticList::new();
    svc.create(Kind::Comment, 7, &ItemContent::text(None, "first"), &member_ctx(Role::Member), &mut comments)
        .await
        .unwrap();

    let list = svc.cache().get(&keys::comments(7)).await.hit().unwrap();
    assert_eq!(list.data, json!([5]));
    let post = svc.cache().get(&keys::post(1, 7)).await.hit().unwrap();
    assert_eq!(post.data["childIds"], json!([5]));
    let cached = cached_item(svc.cache(), &keys::comment(7, 5)).await.unwrap();
    assert_eq!(cached.created_at_block, 99);
    assert_eq!(cached.content_cid, chain_cid);
    assert!(cached.description.is_some());
}

#[tokio::test]
async fn group_lifecycle_tracks_members() {
    let relayer = FakeRelayer::replying(vec![
        Ok(json!({ "event": "NewGroupCreated", "args": [{ "hex": "0x4" }] })),
        Ok(json!({})),
    ]);
    let svc = service(FakeContent::default(), relayer);
    let founder = member_ctx(Role::Member);

    let group = svc
        .create_group("devs", Default::default(), vec![], &founder)
        .await
        .unwrap();
    assert_eq!(group.id, 4);

    let newcomer = ActionContext::new(IdentitySeed::new("0xC4r01").in_group(4), 4, vec![]);
    let commitment = svc.join_group(4, &newcomer).await.unwrap();

    let members = cached_members(svc.cache(), 4).await.hit().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1], commitment);
    let cached = svc.cache().get(&keys::group(4)).await.hit().unwrap();
    assert_eq!(cached.data["userCount"], 2);

    let (endpoint, body) = &svc_relayer_calls(&svc)[1];
    assert_eq!(*endpoint, Endpoint::JoinGroup);
    assert_eq!(body["identityCommitment"], fr_to_decimal(&commitment));
}

#[tokio::test]
async fn joining_needs_no_proving_keys() {
    let relayer = FakeRelayer::default();
    let cache = Cache::new(MemoryStore::new());
    let ctx = ActionContext::new(IdentitySeed::new("0xC4r01").in_group(4), 4, vec![]);

    let first = join_group(&relayer, &cache, 4, &ctx).await.unwrap();
    let again = join_group(&relayer, &cache, 4, &ctx).await.unwrap();
    assert_eq!(first, again);

    let members = cached_members(&cache, 4).await.hit().unwrap();
    assert_eq!(members, vec![first]);
    let seen = relayer.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(endpoint, _)| *endpoint == Endpoint::JoinGroup));
}

#[tokio::test]
async fn staleness_follows_ttl() {
    let store = MemoryStore::new();
    let cache = Cache::new(store.clone());
    let now = hush_sdk::cache::now_ms();
    store
        .json_set("old", "$", &json!({ "data": 1, "lastCachedAt": now - 4 * 60_000 }))
        .await
        .unwrap();
    store
        .json_set("fresh", "$", &json!({ "data": 2, "lastCachedAt": now - 60_000 }))
        .await
        .unwrap();

    let results = cache
        .get_many(&["old".to_string(), "missing".to_string(), "fresh".to_string()])
        .await;
    assert_eq!(results.len(), 3);
    assert!(results[0].as_hit().unwrap().is_stale);
    assert!(matches!(results[1], CacheResult::Miss));
    assert!(!results[2].as_hit().unwrap().is_stale);
    assert_eq!(results[2].as_hit().unwrap().data, json!(2));
}

#[test]
fn pending_state_is_terminal_once_resolved() {
    let mut list = OptimisticList::new();
    list.push_pending("QmA", 1u8);
    assert_eq!(
        list.reconcile("QmA", hush_sdk::reconcile::Outcome::Confirmed(9)),
        Some(PendingState::Confirmed(9))
    );
    assert_eq!(list.reconcile("QmA", hush_sdk::reconcile::Outcome::Failed), None);
}
