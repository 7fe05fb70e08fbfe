//! DEX-agnostic helpers for composing transactions.

use serde::{Deserialize, Serialize};
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;

use crate::utils::fees::priority_fee_to_cu_price;

/// Compute budget prepended to every assembled transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeBudget {
    pub unit_limit: Option<u32>,
    /// Total priority fee in lamports, spread over `unit_limit`.
    pub priority_fee_lamports: u64,
}

impl ComputeBudget {
    pub fn new(unit_limit: u32, priority_fee_lamports: u64) -> Self {
        Self {
            unit_limit: Some(unit_limit),
            priority_fee_lamports,
        }
    }

    /// Price per CU in micro-lamports; zero without a limit.
    pub fn unit_price(&self) -> u64 {
        self.unit_limit
            .map(|limit| priority_fee_to_cu_price(self.priority_fee_lamports, limit))
            .unwrap_or(0)
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        let mut ixs = Vec::with_capacity(2);
        push_compute_budget_ix(&mut ixs, self);
        ixs
    }
}

/// Append compute budget instructions. The limit goes first so the fee is
/// predictable.
pub fn push_compute_budget_ix(ixs: &mut Vec<Instruction>, budget: &ComputeBudget) {
    let Some(limit) = budget.unit_limit else {
        return;
    };
    ixs.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));

    let price = budget.unit_price();
    if price > 0 {
        ixs.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }
}
