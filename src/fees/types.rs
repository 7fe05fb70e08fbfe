//! Value types shared by the transfer-fee selector and engine.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Basis-point denominator: 10_000 bp == 100%.
pub const FEE_RATE_DENOMINATOR: u16 = 10_000;

/// One fee tier of a Token-2022 mint, active from `epoch` until superseded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFee {
    pub epoch: u64,
    pub maximum_fee: BigUint,
    /// Expected in `0..=10_000`.
    pub transfer_fee_basis_points: u16,
}

impl TransferFee {
    pub fn new(epoch: u64, transfer_fee_basis_points: u16, maximum_fee: impl Into<BigUint>) -> Self {
        Self {
            epoch,
            maximum_fee: maximum_fee.into(),
            transfer_fee_basis_points,
        }
    }
}

/// Decoded `TransferFeeConfig` mint extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFeeConfig {
    pub transfer_fee_config_authority: Option<Pubkey>,
    pub withdraw_withheld_authority: Option<Pubkey>,
    pub withheld_amount: u64,
    pub older_transfer_fee: TransferFee,
    pub newer_transfer_fee: TransferFee,
}

impl TransferFeeConfig {
    /// Config without authorities, mostly useful for quoting and tests.
    pub fn new(older_transfer_fee: TransferFee, newer_transfer_fee: TransferFee) -> Self {
        Self {
            transfer_fee_config_authority: None,
            withdraw_withheld_authority: None,
            withheld_amount: 0,
            older_transfer_fee,
            newer_transfer_fee,
        }
    }

    /// Same tier before and after any epoch.
    pub fn flat(transfer_fee: TransferFee) -> Self {
        Self::new(transfer_fee.clone(), transfer_fee)
    }

    /// Tiers ordered by activation epoch.
    pub fn tiers(&self) -> [&TransferFee; 2] {
        [&self.older_transfer_fee, &self.newer_transfer_fee]
    }
}

/// Snapshot of the cluster epoch, supplied by the caller per quote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub epoch: u64,
    pub slots_in_epoch: u64,
    pub absolute_slot: u64,
}

impl From<solana_sdk::epoch_info::EpochInfo> for EpochInfo {
    fn from(info: solana_sdk::epoch_info::EpochInfo) -> Self {
        Self {
            epoch: info.epoch,
            slots_in_epoch: info.slots_in_epoch,
            absolute_slot: info.absolute_slot,
        }
    }
}

/// Result of a single transfer quote.
///
/// `fee` is `None` when the mint has no transfer-fee extension, which is
/// distinct from a configured fee that evaluates to zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransferAmountFee {
    pub amount: BigUint,
    pub fee: Option<BigUint>,
    /// Seconds until the pending tier activates.
    pub expiration_time: Option<u64>,
}

impl GetTransferAmountFee {
    /// Amount left for the recipient once the fee is withheld.
    pub fn net_amount(&self) -> BigUint {
        match &self.fee {
            Some(fee) if *fee <= self.amount => &self.amount - fee,
            Some(_) => BigUint::default(),
            None => self.amount.clone(),
        }
    }
}
