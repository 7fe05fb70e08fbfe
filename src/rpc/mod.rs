//! Ledger connection seam.
//!
//! Everything the SDK needs from the cluster goes through
//! [`LedgerConnection`], so builders can run against a live RPC node or a
//! canned connection in tests.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{account::Account, hash::Hash, pubkey::Pubkey};
use tokio::sync::RwLock;

use crate::fees::EpochInfo;

/// `getMultipleAccounts` accepts at most this many keys per request.
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// One entry per key, in order; `None` for accounts that do not exist.
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>>;

    async fn get_latest_blockhash(&self) -> Result<Hash>;

    async fn get_epoch_info(&self) -> Result<EpochInfo>;
}

#[async_trait]
impl LedgerConnection for RpcClient {
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        let mut accounts = Vec::with_capacity(pubkeys.len());
        for chunk in pubkeys.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let fetched = RpcClient::get_multiple_accounts(self, chunk)
                .await
                .with_context(|| format!("fetching {} accounts", chunk.len()))?;
            accounts.extend(fetched);
        }
        Ok(accounts)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        RpcClient::get_latest_blockhash(self)
            .await
            .context("fetching latest blockhash")
    }

    async fn get_epoch_info(&self) -> Result<EpochInfo> {
        let info = RpcClient::get_epoch_info(self)
            .await
            .context("fetching epoch info")?;
        Ok(info.into())
    }
}

/// Keeps the last fetched [`EpochInfo`] around for `ttl`.
///
/// Fee quotes only need epoch granularity, so a slightly stale slot is fine.
#[derive(Debug)]
pub struct EpochInfoCache {
    ttl: Duration,
    cached: RwLock<Option<(Instant, EpochInfo)>>,
}

impl EpochInfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn get(&self, conn: &dyn LedgerConnection) -> Result<EpochInfo> {
        if let Some((fetched_at, info)) = *self.cached.read().await {
            if fetched_at.elapsed() < self.ttl {
                return Ok(info);
            }
        }

        let info = conn.get_epoch_info().await?;
        debug!(
            "[EPOCH] refreshed epoch {} (slot {}, {} slots/epoch)",
            info.epoch, info.absolute_slot, info.slots_in_epoch
        );
        *self.cached.write().await = Some((Instant::now(), info));
        Ok(info)
    }

    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Canned connection for unit tests.
    #[derive(Default)]
    pub struct MockConnection {
        pub accounts: HashMap<Pubkey, Account>,
        pub blockhash: Hash,
        pub epoch_info: EpochInfo,
        pub account_calls: AtomicUsize,
        pub epoch_calls: AtomicUsize,
    }

    #[async_trait]
    impl LedgerConnection for MockConnection {
        async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            Ok(pubkeys.iter().map(|k| self.accounts.get(k).cloned()).collect())
        }

        async fn get_latest_blockhash(&self) -> Result<Hash> {
            Ok(self.blockhash)
        }

        async fn get_epoch_info(&self) -> Result<EpochInfo> {
            self.epoch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.epoch_info)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::mock::MockConnection;
    use super::*;

    #[tokio::test]
    async fn test_epoch_cache_reuses_within_ttl() {
        let conn = MockConnection {
            epoch_info: EpochInfo {
                epoch: 612,
                slots_in_epoch: 432_000,
                absolute_slot: 264_384_000,
            },
            ..Default::default()
        };
        let cache = EpochInfoCache::new(Duration::from_secs(60));

        let first = cache.get(&conn).await.unwrap();
        let second = cache.get(&conn).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.epoch, 612);
        assert_eq!(conn.epoch_calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache.get(&conn).await.unwrap();
        assert_eq!(conn.epoch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_epoch_cache_zero_ttl_always_refreshes() {
        let conn = MockConnection::default();
        let cache = EpochInfoCache::new(Duration::ZERO);
        cache.get(&conn).await.unwrap();
        cache.get(&conn).await.unwrap();
        assert_eq!(conn.epoch_calls.load(Ordering::SeqCst), 2);
    }
}
