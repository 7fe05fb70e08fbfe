/* --------------------------------------------------------------------- */
/*  Token-2022 transfer fees                                             */
/* --------------------------------------------------------------------- */

pub mod engine;
pub mod schedule;
pub mod types;

pub use engine::{
    calculate_fee, calculate_gross_amount, ceil_div, compute_route_fees,
    compute_transfer_amount_fee, min_expiration_time, RouteFees, TransferLeg,
};
pub use schedule::{select_transfer_fee, ActiveTransferFee};
pub use types::{EpochInfo, GetTransferAmountFee, TransferFee, TransferFeeConfig};
