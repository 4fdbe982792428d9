use std::time::Duration;

use hush_sdk::cache::{Cache, JsonStore};
use hush_sdk::events::{apply_event, ChainEvent};
use reqwest::Client;

use crate::api::SharedState;
use crate::rpc::{self, RpcLog, MAX_BLOCK_RANGE};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Counts from one batch of logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub applied: usize,
    pub duplicates: usize,
    pub skipped: usize,
    /// Forum events that could not be applied and must be rescanned.
    pub failed: usize,
    /// Block of the first failed log.
    pub retry_from: Option<u64>,
}

impl BatchStats {
    fn fail(&mut self, block: u64) {
        self.failed += 1;
        self.retry_from.get_or_insert(block);
    }
}

pub struct Watcher<S> {
    pub state: SharedState,
    pub cache: Cache<S>,
    pub rpc_url: String,
    pub contract: String,
    client: Client,
}

impl<S: JsonStore + Send + Sync> Watcher<S> {
    pub fn new(state: SharedState, cache: Cache<S>, rpc_url: String, contract: String) -> Self {
        Self {
            state,
            cache,
            rpc_url,
            contract,
            client: Client::new(),
        }
    }

    /// Apply a batch of logs in order. A log already recorded is skipped,
    /// so replaying a range is harmless. Logs that fail are left
    /// unrecorded and reported through `retry_from`.
    pub async fn apply_logs(&self, logs: &[RpcLog]) -> BatchStats {
        let mut stats = BatchStats::default();
        for log in logs {
            let (block, index) = match (log.block(), log.index()) {
                (Ok(b), Ok(i)) => (b, i),
                _ => {
                    tracing::warn!(tx = %log.transaction_hash, "log without block number or index");
                    stats.skipped += 1;
                    continue;
                }
            };

            let event = match rpc::decode_log(log) {
                Ok(Some(event)) => event,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx = %log.transaction_hash, block, "undecodable log: {e}");
                    stats.skipped += 1;
                    continue;
                }
            };

            let s = self.state.read().await;
            match s.db.is_applied(&log.transaction_hash, index) {
                Ok(true) => {
                    stats.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("db lookup failed: {e}");
                    stats.fail(block);
                    continue;
                }
            }

            if let ChainEvent::NewUser { group_id, commitment }
            | ChainEvent::NewGroupCreated {
                group_id,
                creator_commitment: commitment,
                ..
            } = &event
            {
                if let Err(e) = s.db.insert_member(*group_id, commitment) {
                    tracing::warn!(group_id, "member insert failed: {e}");
                }
            }

            if let Err(e) = apply_event(&self.cache, &event).await {
                tracing::warn!(event = event.name(), block, "cache update failed: {e}");
                stats.fail(block);
                continue;
            }

            match s.db.record_event(&log.transaction_hash, index, block, event.name()) {
                Ok(_) => {
                    tracing::debug!(event = event.name(), block, "applied");
                    stats.applied += 1;
                }
                Err(e) => tracing::warn!("record event failed: {e}"),
            }
        }
        stats
    }

    /// Scan `[from, min(head, from + MAX_BLOCK_RANGE - 1)]` and return the
    /// next block to scan. When a log failed, that is the failed log's block,
    /// so the next tick rescans it.
    pub async fn poll_once(&self, from: u64) -> anyhow::Result<u64> {
        let head = rpc::block_number(&self.client, &self.rpc_url).await?;
        self.state.write().await.head = Some(head);
        if from > head {
            return Ok(from);
        }
        let to = head.min(from + MAX_BLOCK_RANGE - 1);
        let logs = rpc::get_logs(&self.client, &self.rpc_url, &self.contract, from, to).await?;
        let stats = self.apply_logs(&logs).await;
        if stats.applied > 0 || stats.skipped > 0 || stats.failed > 0 {
            tracing::info!(
                from,
                to,
                applied = stats.applied,
                duplicates = stats.duplicates,
                skipped = stats.skipped,
                failed = stats.failed,
                "scanned"
            );
        }
        let next = stats.retry_from.unwrap_or(to + 1);
        self.state.read().await.db.save_cursor(next)?;
        Ok(next)
    }

    /// Poll forever from `start`. RPC failures are logged and retried on
    /// the next tick.
    pub async fn run(self, start: u64) {
        let mut next = start;
        loop {
            match self.poll_once(next).await {
                Ok(n) => {
                    // behind the head and making progress: keep going without waiting
                    let behind = self.state.read().await.head.is_some_and(|h| n <= h);
                    let progressed = n > next;
                    next = n;
                    if behind && progressed {
                        continue;
                    }
                }
                Err(e) => tracing::warn!(from = next, "poll failed: {e}"),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
