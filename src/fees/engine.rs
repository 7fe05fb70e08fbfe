//! Transfer-fee math for Token-2022 mints.
//!
//! Everything here is exact `BigUint` arithmetic. Two directions are
//! supported:
//!
//! * fee-only: `amount` is what the sender transfers, the result carries the
//!   fee the token program withholds from it;
//! * gross-up: `amount` is what the recipient must end up with, the result
//!   carries the amount to send so that it survives the fee.
//!
//! Inputs are trusted. Basis points above 10_000 are a caller bug; they do
//! not panic but the numbers are meaningless.

use num::{Integer, Zero};
use num_bigint::BigUint;

use super::schedule::select_transfer_fee;
use super::types::{EpochInfo, GetTransferAmountFee, TransferFee, TransferFeeConfig, FEE_RATE_DENOMINATOR};

/// Integer division rounded toward positive infinity.
///
/// `b` must be non-zero.
pub fn ceil_div(a: &BigUint, b: &BigUint) -> BigUint {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + 1u32
    }
}

/// Fee withheld when `amount` is transferred under `transfer_fee`.
pub fn calculate_fee(transfer_fee: &TransferFee, amount: &BigUint) -> BigUint {
    let raw = ceil_div(
        &(amount * u32::from(transfer_fee.transfer_fee_basis_points)),
        &BigUint::from(FEE_RATE_DENOMINATOR),
    );
    raw.min(transfer_fee.maximum_fee.clone())
}

/// Amount to send so that roughly `net_amount` arrives after the fee.
///
/// A 100% tier has no proportional inverse, so the cap becomes the whole
/// fee there.
pub fn calculate_gross_amount(transfer_fee: &TransferFee, net_amount: &BigUint) -> BigUint {
    let bp = transfer_fee.transfer_fee_basis_points;
    if bp >= FEE_RATE_DENOMINATOR {
        return net_amount + &transfer_fee.maximum_fee;
    }

    let gross = ceil_div(
        &(net_amount * u32::from(FEE_RATE_DENOMINATOR)),
        &BigUint::from(FEE_RATE_DENOMINATOR - bp),
    );
    if &gross - net_amount > transfer_fee.maximum_fee {
        net_amount + &transfer_fee.maximum_fee
    } else {
        gross
    }
}

/// Quote a single transfer against an optional fee config.
///
/// With `add_fee == false` the amount is returned untouched together with
/// the withheld fee. With `add_fee == true` the returned amount is the
/// grossed-up transfer amount and `fee` is recomputed on it.
pub fn compute_transfer_amount_fee(
    amount: &BigUint,
    fee_config: Option<&TransferFeeConfig>,
    epoch_info: &EpochInfo,
    add_fee: bool,
) -> GetTransferAmountFee {
    let Some(fee_config) = fee_config else {
        return GetTransferAmountFee {
            amount: amount.clone(),
            fee: None,
            expiration_time: None,
        };
    };

    let active = select_transfer_fee(fee_config, epoch_info);
    let transfer_fee = active.transfer_fee;

    if !add_fee {
        return GetTransferAmountFee {
            amount: amount.clone(),
            fee: Some(calculate_fee(transfer_fee, amount)),
            expiration_time: active.expiration_time,
        };
    }

    if transfer_fee.transfer_fee_basis_points >= FEE_RATE_DENOMINATOR {
        return GetTransferAmountFee {
            amount: amount + &transfer_fee.maximum_fee,
            fee: Some(transfer_fee.maximum_fee.clone()),
            expiration_time: active.expiration_time,
        };
    }

    let gross = calculate_gross_amount(transfer_fee, amount);
    let fee = calculate_fee(transfer_fee, &gross);
    GetTransferAmountFee {
        amount: gross,
        fee: Some(fee),
        expiration_time: active.expiration_time,
    }
}

/// Earliest of two optional expirations.
pub fn min_expiration_time(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// One transfer of a multi-leg route.
#[derive(Clone, Copy, Debug)]
pub struct TransferLeg<'a> {
    pub amount: &'a BigUint,
    pub fee_config: Option<&'a TransferFeeConfig>,
    pub add_fee: bool,
}

/// Per-leg quotes of a route together with the earliest expiration among
/// them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteFees {
    pub legs: Vec<GetTransferAmountFee>,
    pub expiration_time: Option<u64>,
}

pub fn compute_route_fees(legs: &[TransferLeg<'_>], epoch_info: &EpochInfo) -> RouteFees {
    let legs: Vec<_> = legs
        .iter()
        .map(|leg| compute_transfer_amount_fee(leg.amount, leg.fee_config, epoch_info, leg.add_fee))
        .collect();
    let expiration_time = legs
        .iter()
        .fold(None, |acc, quote| min_expiration_time(acc, quote.expiration_time));
    RouteFees { legs, expiration_time }
}
