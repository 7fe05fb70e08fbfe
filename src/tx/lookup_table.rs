//! Address lookup table cache.
//!
//! Lookup tables are append-only in practice, so once a table has been
//! fetched it is reused for the lifetime of the cache.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use log::{debug, warn};
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    pubkey::Pubkey,
};

use crate::rpc::LedgerConnection;

#[derive(Debug, Default)]
pub struct LookupTableCache {
    tables: DashMap<Pubkey, AddressLookupTableAccount>,
}

impl LookupTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: AddressLookupTableAccount) {
        self.tables.insert(table.key, table);
    }

    pub fn get(&self, key: &Pubkey) -> Option<AddressLookupTableAccount> {
        self.tables.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolve `keys`, fetching only the tables not cached yet.
    ///
    /// Tables that do not exist or fail to decode are skipped with a warning;
    /// a transaction can still be built without them.
    pub async fn get_multiple(
        &self,
        conn: &dyn LedgerConnection,
        keys: &[Pubkey],
    ) -> Result<HashMap<Pubkey, AddressLookupTableAccount>> {
        let mut resolved = HashMap::with_capacity(keys.len());
        let mut missing = Vec::new();

        for key in keys {
            match self.get(key) {
                Some(table) => {
                    resolved.insert(*key, table);
                }
                None if !missing.contains(key) => missing.push(*key),
                None => {}
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        debug!("[ALT] fetching {} uncached lookup tables", missing.len());
        let accounts = conn.get_multiple_accounts(&missing).await?;

        for (key, account) in missing.iter().zip(accounts) {
            let Some(account) = account else {
                warn!("[ALT] lookup table {} not found, skipping", key);
                continue;
            };
            match decode_lookup_table(key, &account.data) {
                Ok(table) => {
                    self.insert(table.clone());
                    resolved.insert(*key, table);
                }
                Err(e) => warn!("[ALT] {}", e),
            }
        }

        Ok(resolved)
    }
}

pub fn decode_lookup_table(key: &Pubkey, data: &[u8]) -> Result<AddressLookupTableAccount> {
    let table = AddressLookupTable::deserialize(data)
        .map_err(|e| anyhow!("Failed to decode lookup table {}: {}", key, e))?;
    Ok(AddressLookupTableAccount {
        key: *key,
        addresses: table.addresses.to_vec(),
    })
}
