//! Priority-fee helpers shared by all builders.

/// Micro-lamports in one lamport.
pub const MICRO_LAMPORTS_PER_LAMPORT: u64 = 1_000_000;

/// Convert a *total* priority fee in lamports into the per-compute-unit
/// price `ComputeBudgetInstruction::set_compute_unit_price` expects.
///
/// Rounds down so the total never exceeds the requested fee.
pub fn priority_fee_to_cu_price(total_lamports: u64, compute_unit_limit: u32) -> u64 {
    if compute_unit_limit == 0 {
        return 0;
    }
    let micro = u128::from(total_lamports) * u128::from(MICRO_LAMPORTS_PER_LAMPORT);
    let price = micro / u128::from(compute_unit_limit);
    u64::try_from(price).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_fee_to_cu_price() {
        // 0.0001 SOL over 200k CU
        assert_eq!(priority_fee_to_cu_price(100_000, 200_000), 500_000);
        assert_eq!(priority_fee_to_cu_price(1, 3), 333_333);
        assert_eq!(priority_fee_to_cu_price(0, 200_000), 0);
        assert_eq!(priority_fee_to_cu_price(5_000, 0), 0);
    }

    #[test]
    fn test_priority_fee_to_cu_price_saturates() {
        assert_eq!(priority_fee_to_cu_price(u64::MAX, 1), u64::MAX);
    }
}
