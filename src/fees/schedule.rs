//! Active fee tier selection for epoch-versioned transfer fees.

use super::types::{EpochInfo, TransferFee, TransferFeeConfig};

/// Slot time the expiration estimate is based on.
pub const MS_PER_SLOT: u64 = 400;

/// Tier in force for a given epoch, plus how long until the pending tier
/// replaces it (if one is pending).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveTransferFee<'a> {
    pub transfer_fee: &'a TransferFee,
    pub expiration_time: Option<u64>,
}

/// Pick the older tier while the newer one is still pending, the newer tier
/// otherwise.
pub fn select_transfer_fee<'a>(
    fee_config: &'a TransferFeeConfig,
    epoch_info: &EpochInfo,
) -> ActiveTransferFee<'a> {
    let newer = &fee_config.newer_transfer_fee;
    if epoch_info.epoch < newer.epoch {
        ActiveTransferFee {
            transfer_fee: &fee_config.older_transfer_fee,
            expiration_time: Some(pending_tier_expiration(newer.epoch, epoch_info)),
        }
    } else {
        ActiveTransferFee {
            transfer_fee: newer,
            expiration_time: None,
        }
    }
}

/// Seconds from `absolute_slot` until the first slot of `activation_epoch`.
///
/// Saturates at zero if the slot is already past the estimated boundary.
pub fn pending_tier_expiration(activation_epoch: u64, epoch_info: &EpochInfo) -> u64 {
    let activation_slot = u128::from(activation_epoch) * u128::from(epoch_info.slots_in_epoch);
    let remaining_slots = activation_slot.saturating_sub(u128::from(epoch_info.absolute_slot));
    let seconds = remaining_slots * u128::from(MS_PER_SLOT) / 1000;
    u64::try_from(seconds).unwrap_or(u64::MAX)
}
