use std::sync::Arc;

use hush_sdk::cache::{Cache, JsonStore, MemoryStore, UpstashStore};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use hush_watcher::api::{self, AppState, SharedState};
use hush_watcher::db::Db;
use hush_watcher::rpc;
use hush_watcher::watcher::Watcher;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

struct Settings {
    rpc_url: String,
    contract: String,
    db_path: String,
    listen_addr: String,
    start_block: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings {
        rpc_url: env_or("HUSH_RPC_URL", "http://127.0.0.1:8545"),
        contract: env_or("HUSH_CONTRACT_ADDRESS", "0x0000000000000000000000000000000000000000"),
        db_path: env_or("HUSH_WATCHER_DB", "hush-watcher.db"),
        listen_addr: env_or("HUSH_LISTEN_ADDR", "0.0.0.0:3000"),
        start_block: std::env::var("HUSH_START_BLOCK").ok().and_then(|b| b.parse().ok()),
    };

    match (std::env::var("HUSH_CACHE_URL"), std::env::var("HUSH_CACHE_TOKEN")) {
        (Ok(url), Ok(token)) if !url.is_empty() => run(settings, UpstashStore::new(&url, &token)).await,
        _ => {
            tracing::warn!("HUSH_CACHE_URL/HUSH_CACHE_TOKEN unset, using an in-process cache");
            run(settings, MemoryStore::new()).await
        }
    }
}

async fn run<S: JsonStore + Send + Sync + 'static>(settings: Settings, store: S) -> anyhow::Result<()> {
    tracing::info!(contract = %settings.contract, rpc = %settings.rpc_url, "hush-watcher starting");

    let db = Db::open(std::path::Path::new(&settings.db_path))?;
    let cursor = db.load_cursor()?;
    let state: SharedState = Arc::new(RwLock::new(AppState { db, head: None }));

    let start = match (cursor, settings.start_block) {
        (Some(next), _) => next,
        (None, Some(block)) => block,
        (None, None) => {
            // first run without a start block: follow from the head
            let head = rpc::block_number(&reqwest::Client::new(), &settings.rpc_url).await?;
            tracing::info!(head, "no cursor, starting at head");
            head
        }
    };

    let watcher = Watcher::new(state.clone(), Cache::new(store), settings.rpc_url, settings.contract);
    tokio::spawn(watcher.run(start));

    let router = api::router(state);
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    tracing::info!(addr = %settings.listen_addr, from = start, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
