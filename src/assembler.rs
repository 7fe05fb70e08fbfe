//! Entry point tying the ledger connection, caches and settings together.
//!
//! `TxAssembler` quotes Token-2022 transfer fees for mints and turns
//! instruction lists into signed, packet-sized transactions.

use std::sync::Arc;

use anyhow::Result;
use log::info;
use num_bigint::BigUint;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};

use crate::{
    config::settings::Settings,
    fees::{compute_route_fees, EpochInfo, GetTransferAmountFee, RouteFees, TransferLeg},
    rpc::{EpochInfoCache, LedgerConnection},
    token::{fetch_multiple_mint_infos, MintInfo},
    tx::{build_batched_transactions, BatchContext, ComputeBudget, LookupTableCache, TxVersion},
};

/// One transfer to quote as part of a route.
#[derive(Clone, Debug)]
pub struct MintTransfer {
    pub mint: Pubkey,
    pub amount: BigUint,
    /// Gross the amount up so the recipient nets `amount`.
    pub add_fee: bool,
}

pub struct TxAssembler {
    conn: Arc<dyn LedgerConnection>,
    payer: Arc<Keypair>,
    compute_budget: ComputeBudget,
    lookup_table_keys: Vec<Pubkey>,
    use_versioned_tx: bool,
    lookup_tables: LookupTableCache,
    epoch_info: EpochInfoCache,
}

impl TxAssembler {
    pub fn new(conn: Arc<dyn LedgerConnection>, settings: &Settings) -> Self {
        Self {
            conn,
            payer: Arc::clone(&settings.keypair),
            compute_budget: settings.compute_budget,
            lookup_table_keys: settings.lookup_tables.clone(),
            use_versioned_tx: settings.use_versioned_tx,
            lookup_tables: LookupTableCache::new(),
            epoch_info: EpochInfoCache::new(settings.epoch_info_ttl),
        }
    }

    /// Use the settings' own RPC client as the connection.
    pub fn from_settings(settings: &Settings) -> Self {
        let conn: Arc<dyn LedgerConnection> = settings.rpc_client.clone();
        Self::new(conn, settings)
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn lookup_table_cache(&self) -> &LookupTableCache {
        &self.lookup_tables
    }

    pub async fn epoch_info(&self) -> Result<EpochInfo> {
        self.epoch_info.get(self.conn.as_ref()).await
    }

    pub async fn mint_infos(&self, mints: &[Pubkey]) -> Result<Vec<MintInfo>> {
        fetch_multiple_mint_infos(self.conn.as_ref(), mints).await
    }

    /// Quote a single transfer of `mint` at the current epoch.
    pub async fn quote_transfer(
        &self,
        mint: &Pubkey,
        amount: &BigUint,
        add_fee: bool,
    ) -> Result<GetTransferAmountFee> {
        let epoch_info = self.epoch_info().await?;
        let mint_info = self.mint_infos(std::slice::from_ref(mint)).await?.remove(0);
        Ok(mint_info.transfer_amount_fee(amount, &epoch_info, add_fee))
    }

    /// Quote every leg of a route with one mint fetch and one epoch read.
    pub async fn quote_route(&self, transfers: &[MintTransfer]) -> Result<RouteFees> {
        let epoch_info = self.epoch_info().await?;
        let mints: Vec<Pubkey> = transfers.iter().map(|t| t.mint).collect();
        let mint_infos = self.mint_infos(&mints).await?;

        let legs: Vec<TransferLeg<'_>> = transfers
            .iter()
            .zip(&mint_infos)
            .map(|(transfer, info)| TransferLeg {
                amount: &transfer.amount,
                fee_config: info.transfer_fee_config.as_ref(),
                add_fee: transfer.add_fee,
            })
            .collect();
        Ok(compute_route_fees(&legs, &epoch_info))
    }

    async fn resolve_lookup_tables(&self) -> Result<Vec<AddressLookupTableAccount>> {
        if self.lookup_table_keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = self
            .lookup_tables
            .get_multiple(self.conn.as_ref(), &self.lookup_table_keys)
            .await?;
        Ok(self
            .lookup_table_keys
            .iter()
            .filter_map(|key| found.remove(key))
            .collect())
    }

    /// Split `instructions` into transactions paid and signed by the
    /// configured payer plus `extra_signers`.
    ///
    /// The outer error covers setup (splitting, blockhash, lookup tables);
    /// each batch then succeeds or fails on its own.
    pub async fn build_transactions(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> Result<Vec<Result<VersionedTransaction>>> {
        let lookup_tables = self.resolve_lookup_tables().await?;
        let version = TxVersion::for_tables(self.use_versioned_tx, &lookup_tables);
        let prefix = self.compute_budget.instructions();
        let payer = self.payer.pubkey();

        let ctx = BatchContext {
            payer: &payer,
            lookup_tables: &lookup_tables,
            version,
            prefix: &prefix,
        };

        let mut signers: Vec<&Keypair> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(self.payer.as_ref());
        signers.extend_from_slice(extra_signers);

        let results = build_batched_transactions(self.conn.as_ref(), &ctx, instructions, &signers).await?;
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            "[ASSEMBLER] built {}/{} transactions for {}",
            results.len() - failed,
            results.len(),
            payer
        );
        Ok(results)
    }
}
