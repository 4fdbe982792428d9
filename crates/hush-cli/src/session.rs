use anyhow::Result;
use ark_bls12_381::Fr;
use hush_sdk::cache::{Cache, CacheResult, JsonStore};
use hush_sdk::config::ForumConfig;
use hush_sdk::content::IpfsClient;
use hush_sdk::entities::{cached_members, ActionContext, ItemService};
use hush_sdk::models::Role;
use hush_sdk::prove::Prover;
use hush_sdk::relayer::RelayerClient;
use hush_sdk::IdentitySeed;

use crate::output;

pub type Service<S> = ItemService<IpfsClient, RelayerClient, S>;

/// Config plus the cache backend chosen at startup.
pub struct Session<S> {
    pub config: ForumConfig,
    store: S,
}

impl<S: JsonStore + Clone> Session<S> {
    pub fn new(config: ForumConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn cache(&self) -> Cache<S> {
        Cache::with_ttl(self.store.clone(), self.config.cache_ttl())
    }

    pub fn seed(&self, group_id: u64, user: Option<&str>) -> Result<IdentitySeed> {
        seed_from(&self.config, group_id, user)
    }

    pub fn relayer(&self) -> RelayerClient {
        RelayerClient::new(&self.config.relayer_url)
    }

    /// Services for actions that need proofs; loads both proving keys.
    pub fn service(&self) -> Result<Service<S>> {
        let sp = output::spinner("loading proving keys...");
        let prover = Prover::load(&self.config.artifacts_dir).map_err(|e| {
            output::fail_with_hint(&e.to_string(), "run `hush setup` or set artifacts_dir")
        });
        sp.finish_and_clear();
        Ok(ItemService::new(
            IpfsClient::from_config(&self.config),
            self.relayer(),
            self.cache(),
            prover?,
        ))
    }

    /// Group members as cached by the watcher and by previous joins.
    pub async fn members(&self, group_id: u64) -> Result<Vec<Fr>> {
        match cached_members(&self.cache(), group_id).await {
            CacheResult::Hit(members) => Ok(members),
            CacheResult::Miss => Err(output::fail_with_hint(
                &format!("no members cached for group {group_id}"),
                "run `hush join` or point cache_url at the watcher's cache",
            )),
            CacheResult::Unavailable(reason) => Err(anyhow::anyhow!("cache unavailable: {reason}")),
        }
    }

    pub async fn context(&self, group_id: u64, user: Option<&str>, role: Role) -> Result<ActionContext> {
        let seed = self.seed(group_id, user)?;
        let members = self.members(group_id).await?;
        Ok(ActionContext::new(seed, group_id, members).with_role(role))
    }
}

pub fn seed_from(config: &ForumConfig, group_id: u64, user: Option<&str>) -> Result<IdentitySeed> {
    let wallet = config.wallet.as_deref().ok_or_else(|| {
        output::fail_with_hint("no wallet set", "run `hush config set wallet <address>` or pass --wallet")
    })?;
    let seed = IdentitySeed::new(wallet).in_group(group_id);
    Ok(match user {
        Some(name) => seed.as_user(name),
        None => seed,
    })
}
