use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::routing::post;
use axum::Json;
use http_body_util::BodyExt;
use hush_sdk::cache::{keys, Cache, JsonStore, MemoryStore};
use hush_sdk::models::{Item, Kind};
use tokio::sync::RwLock;
use tower::ServiceExt;

use hush_watcher::api::{AppState, SharedState};
use hush_watcher::db::Db;
use hush_watcher::rpc::{topic_of, RpcLog};
use hush_watcher::watcher::Watcher;

fn word(n: u64) -> String {
    format!("{n:064x}")
}

fn log(signature: &str, words: &[String], block: u64, tx: &str, index: u64) -> RpcLog {
    RpcLog {
        address: "0xforum".into(),
        topics: vec![topic_of(signature)],
        data: format!("0x{}", words.concat()),
        block_number: format!("0x{block:x}"),
        transaction_hash: tx.into(),
        log_index: format!("0x{index:x}"),
    }
}

fn new_post(group: u64, id: u64, cid_byte: u8, block: u64) -> RpcLog {
    log(
        "NewItem(uint8,uint256,uint256,uint256,bytes32,uint256)",
        &[
            word(Kind::Post.as_u8() as u64),
            word(group),
            word(id),
            word(0),
            hex::encode([cid_byte; 32]),
            word(777),
        ],
        block,
        &format!("0xtx{id}"),
        0,
    )
}

fn make_watcher(db: Db, store: MemoryStore) -> Watcher<MemoryStore> {
    let state: SharedState = Arc::new(RwLock::new(AppState { db, head: None }));
    Watcher::new(state, Cache::new(store), "http://unused".into(), "0xforum".into())
}

async fn get_json(app: &axum::Router, uri: &str) -> (u16, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn new_item_log_lands_in_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let watcher = make_watcher(Db::open(&tmp.path().join("w.db")).unwrap(), store.clone());

    let stats = watcher.apply_logs(&[new_post(1, 5, 0x11, 40)]).await;
    assert_eq!(stats.applied, 1);

    let entry = watcher.cache.get(&keys::post(1, 5)).await.hit().expect("post cached");
    let item: Item = serde_json::from_value(entry.data).unwrap();
    assert_eq!(item.id, 5);
    assert_eq!(item.created_at_block, 40);
    assert_eq!(item.note, "777");
    assert_eq!(item.content_cid, format!("0x{}", hex::encode([0x11u8; 32])));

    let list = watcher.cache.get(&keys::posts(1)).await.hit().expect("post list");
    assert_eq!(list.data, serde_json::json!([5]));
}

#[tokio::test]
async fn replayed_logs_apply_once() {
    let tmp = tempfile::tempdir().unwrap();
    let watcher = make_watcher(Db::open(&tmp.path().join("w.db")).unwrap(), MemoryStore::new());
    let batch = [new_post(1, 5, 0x11, 40), new_post(1, 6, 0x22, 41)];

    let first = watcher.apply_logs(&batch).await;
    let second = watcher.apply_logs(&batch).await;
    assert_eq!(first.applied, 2);
    assert_eq!(second.applied, 0);
    assert_eq!(second.duplicates, 2);

    let list = watcher.cache.get(&keys::posts(1)).await.hit().unwrap();
    assert_eq!(list.data, serde_json::json!([5, 6]));
    assert_eq!(watcher.state.read().await.db.events_applied().unwrap(), 2);
}

#[tokio::test]
async fn foreign_and_malformed_logs_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let watcher = make_watcher(Db::open(&tmp.path().join("w.db")).unwrap(), MemoryStore::new());

    let foreign = log("Approval(address,address,uint256)", &[word(1)], 10, "0xa", 0);
    let mut ragged = new_post(1, 5, 0x11, 10);
    ragged.data.push('f');

    let stats = watcher.apply_logs(&[foreign, ragged]).await;
    assert_eq!(stats.applied, 0);
    assert_eq!(stats.skipped, 2);
    assert!(watcher.state.read().await.db.load_cursor().unwrap().is_none());
}

#[tokio::test]
async fn cursor_and_counter_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("w.db");
    {
        let watcher = make_watcher(Db::open(&path).unwrap(), MemoryStore::new());
        watcher.apply_logs(&[new_post(2, 1, 0x33, 90)]).await;
        watcher.state.read().await.db.save_cursor(91).unwrap();
    }
    let db = Db::open(&path).unwrap();
    assert_eq!(db.load_cursor().unwrap(), Some(91));
    assert_eq!(db.events_applied().unwrap(), 1);
    assert!(db.is_applied("0xtx1", 0).unwrap());
}

#[tokio::test]
async fn members_feed_group_root_endpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let watcher = make_watcher(Db::open(&tmp.path().join("w.db")).unwrap(), MemoryStore::new());

    let created = log(
        "NewGroupCreated(uint256,bytes32,uint256)",
        &[word(3), format!("{:0<64}", hex::encode("devs")), word(100)],
        5,
        "0xg",
        0,
    );
    let joined = log("NewUser(uint256,uint256)", &[word(3), word(200)], 6, "0xu", 0);
    let stats = watcher.apply_logs(&[created, joined]).await;
    assert_eq!(stats.applied, 2);

    let members = watcher.cache.get(&keys::members(3)).await.hit().unwrap();
    assert_eq!(members.data, serde_json::json!(["100", "200"]));
    let group = watcher.cache.get(&keys::group(3)).await.hit().unwrap();
    assert_eq!(group.data["name"], "devs");

    let app = hush_watcher::api::router(watcher.state.clone());
    let (status, json) = get_json(&app, "/v1/groups/3/root").await;
    assert_eq!(status, 200);
    assert_eq!(json["members"], 2);
    assert!(json["root"].as_str().is_some_and(|r| !r.is_empty()));

    let (status, _) = get_json(&app, "/v1/groups/4/root").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn health_and_status() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Db::open(&tmp.path().join("w.db")).unwrap();
    db.save_cursor(12).unwrap();
    let state: SharedState = Arc::new(RwLock::new(AppState { db, head: Some(20) }));
    let app = hush_watcher::api::router(state);

    let (status, json) = get_json(&app, "/v1/health").await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "ok");

    let (status, json) = get_json(&app, "/v1/status").await;
    assert_eq!(status, 200);
    assert_eq!(json["next_block"], 12);
    assert_eq!(json["events_applied"], 0);
    assert_eq!(json["head"], 20);
}

/// `MemoryStore` that refuses every command while `down` is set.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    down: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(&self) -> anyhow::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }
}

impl JsonStore for FlakyStore {
    async fn json_get(&self, key: &str, path: &str) -> anyhow::Result<Option<serde_json::Value>> {
        self.check()?;
        self.inner.json_get(key, path).await
    }

    async fn json_mget(&self, keys: &[String], path: &str) -> anyhow::Result<Vec<Option<serde_json::Value>>> {
        self.check()?;
        self.inner.json_mget(keys, path).await
    }

    async fn json_set(&self, key: &str, path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        self.check()?;
        self.inner.json_set(key, path, value).await
    }

    async fn json_del(&self, key: &str, path: &str) -> anyhow::Result<()> {
        self.check()?;
        self.inner.json_del(key, path).await
    }

    async fn json_arr_append(&self, key: &str, path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        self.check()?;
        self.inner.json_arr_append(key, path, value).await
    }

    async fn json_arr_insert(&self, key: &str, path: &str, index: i64, value: &serde_json::Value) -> anyhow::Result<()> {
        self.check()?;
        self.inner.json_arr_insert(key, path, index, value).await
    }
}

/// JSON-RPC node at a fixed head that returns `logs` for any range.
async fn mock_node(head: u64, logs: Vec<RpcLog>) -> String {
    let app = axum::Router::new().route(
        "/",
        post(move |Json(req): Json<serde_json::Value>| {
            let logs = logs.clone();
            async move {
                let result = match req["method"].as_str() {
                    Some("eth_blockNumber") => serde_json::json!(format!("0x{head:x}")),
                    Some("eth_getLogs") => serde_json::to_value(&logs).unwrap(),
                    _ => serde_json::Value::Null,
                };
                Json(serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn cache_outage_holds_cursor_until_applied() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FlakyStore::default();
    store.down.store(true, Ordering::SeqCst);
    let rpc_url = mock_node(0x10, vec![new_post(1, 5, 0x11, 0x10)]).await;
    let state: SharedState = Arc::new(RwLock::new(AppState {
        db: Db::open(&tmp.path().join("w.db")).unwrap(),
        head: None,
    }));
    let watcher = Watcher::new(state, Cache::new(store.clone()), rpc_url, "0xforum".into());

    let stats = watcher.apply_logs(&[new_post(1, 5, 0x11, 0x10)]).await;
    assert_eq!((stats.applied, stats.failed, stats.retry_from), (0, 1, Some(0x10)));

    let next = watcher.poll_once(0).await.unwrap();
    assert_eq!(next, 0x10);
    {
        let s = watcher.state.read().await;
        assert_eq!(s.db.load_cursor().unwrap(), Some(0x10));
        assert_eq!(s.db.events_applied().unwrap(), 0);
    }

    store.down.store(false, Ordering::SeqCst);
    let next = watcher.poll_once(next).await.unwrap();
    assert_eq!(next, 0x11);
    {
        let s = watcher.state.read().await;
        assert_eq!(s.db.load_cursor().unwrap(), Some(0x11));
        assert_eq!(s.db.events_applied().unwrap(), 1);
    }
    let list = watcher.cache.get(&keys::posts(1)).await.hit().expect("post list");
    assert_eq!(list.data, serde_json::json!([5]));
}
