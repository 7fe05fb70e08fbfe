//! Mint account loading.
//!
//! Decoding is left to `spl-token-2022`; this module only picks out what the
//! fee engine needs and maps the on-chain `TransferFeeConfig` extension into
//! [`crate::fees::TransferFeeConfig`].

use anyhow::{anyhow, Result};
use log::{debug, warn};
use num_bigint::BigUint;
use solana_sdk::{account::Account, pubkey::Pubkey};
use spl_token_2022::{
    extension::{transfer_fee, BaseStateWithExtensions, StateWithExtensions},
    state::Mint,
};

use crate::fees::{
    compute_transfer_amount_fee, EpochInfo, GetTransferAmountFee, TransferFee, TransferFeeConfig,
};
use crate::rpc::LedgerConnection;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintInfo {
    pub address: Pubkey,
    /// SPL Token or Token-2022.
    pub program_id: Pubkey,
    pub decimals: u8,
    pub transfer_fee_config: Option<TransferFeeConfig>,
}

impl MintInfo {
    pub fn is_token_2022(&self) -> bool {
        self.program_id == spl_token_2022::id()
    }

    /// Quote a transfer of this mint.
    pub fn transfer_amount_fee(
        &self,
        amount: &BigUint,
        epoch_info: &EpochInfo,
        add_fee: bool,
    ) -> GetTransferAmountFee {
        compute_transfer_amount_fee(amount, self.transfer_fee_config.as_ref(), epoch_info, add_fee)
    }
}

fn convert_transfer_fee(fee: &transfer_fee::TransferFee) -> TransferFee {
    TransferFee {
        epoch: u64::from(fee.epoch),
        maximum_fee: BigUint::from(u64::from(fee.maximum_fee)),
        transfer_fee_basis_points: u16::from(fee.transfer_fee_basis_points),
    }
}

impl From<&transfer_fee::TransferFeeConfig> for TransferFeeConfig {
    fn from(ext: &transfer_fee::TransferFeeConfig) -> Self {
        Self {
            transfer_fee_config_authority: Option::<Pubkey>::from(ext.transfer_fee_config_authority),
            withdraw_withheld_authority: Option::<Pubkey>::from(ext.withdraw_withheld_authority),
            withheld_amount: u64::from(ext.withheld_amount),
            older_transfer_fee: convert_transfer_fee(&ext.older_transfer_fee),
            newer_transfer_fee: convert_transfer_fee(&ext.newer_transfer_fee),
        }
    }
}

/// Decode a fetched mint account.
pub fn unpack_mint(address: &Pubkey, account: &Account) -> Result<MintInfo> {
    if account.owner != spl_token::id() && account.owner != spl_token_2022::id() {
        return Err(anyhow!(
            "Mint {} is owned by {}, not a token program",
            address,
            account.owner
        ));
    }

    let state = StateWithExtensions::<Mint>::unpack(&account.data)
        .map_err(|e| anyhow!("Failed to unpack mint {}: {}", address, e))?;

    let transfer_fee_config = state
        .get_extension::<transfer_fee::TransferFeeConfig>()
        .ok()
        .map(TransferFeeConfig::from);

    if let Some(cfg) = &transfer_fee_config {
        debug!(
            "[MINT] {} transfer fee {}bp (older {}bp, newer from epoch {})",
            address,
            cfg.newer_transfer_fee.transfer_fee_basis_points,
            cfg.older_transfer_fee.transfer_fee_basis_points,
            cfg.newer_transfer_fee.epoch
        );
    }

    Ok(MintInfo {
        address: *address,
        program_id: account.owner,
        decimals: state.base.decimals,
        transfer_fee_config,
    })
}

/// Fetch and decode several mints in as few requests as the connection
/// allows. Order of the result follows `mints`.
pub async fn fetch_multiple_mint_infos(
    conn: &dyn LedgerConnection,
    mints: &[Pubkey],
) -> Result<Vec<MintInfo>> {
    let accounts = conn.get_multiple_accounts(mints).await?;
    if accounts.len() != mints.len() {
        warn!(
            "[MINT] asked for {} mints, connection returned {}",
            mints.len(),
            accounts.len()
        );
    }

    mints
        .iter()
        .zip(accounts.iter().map(Some).chain(std::iter::repeat(None)))
        .map(|(mint, account)| match account.and_then(|a| a.as_ref()) {
            Some(account) => unpack_mint(mint, account),
            None => Err(anyhow!("Mint account {} not found", mint)),
        })
        .collect()
}
