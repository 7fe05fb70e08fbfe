//! Splits a long instruction list into transaction-sized groups and builds
//! one signed transaction per group.

use anyhow::{anyhow, Result};
use log::{info, warn};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Keypair,
    transaction::VersionedTransaction,
};

use super::builder::{build_transaction, compile_message, fits_in_packet, TxVersion};
use crate::rpc::LedgerConnection;

/// Fixed inputs shared by every batch.
#[derive(Clone, Copy, Debug)]
pub struct BatchContext<'a> {
    pub payer: &'a Pubkey,
    pub lookup_tables: &'a [AddressLookupTableAccount],
    pub version: TxVersion,
    /// Prepended to every batch, e.g. compute budget instructions.
    pub prefix: &'a [Instruction],
}

impl BatchContext<'_> {
    fn fits(&self, group: &[Instruction]) -> Result<bool> {
        let ixs: Vec<Instruction> = self.prefix.iter().chain(group).cloned().collect();
        // Blockhash does not affect the size.
        let message = compile_message(&ixs, self.payer, Hash::default(), self.lookup_tables, self.version)?;
        fits_in_packet(&message)
    }
}

/// Greedy, order-preserving partition of `instructions`.
///
/// Each group plus `ctx.prefix` fits a single packet. An instruction that
/// does not fit on its own is an error.
pub fn split_instructions(
    ctx: &BatchContext<'_>,
    instructions: &[Instruction],
) -> Result<Vec<Vec<Instruction>>> {
    let mut groups: Vec<Vec<Instruction>> = Vec::new();
    let mut current: Vec<Instruction> = Vec::new();

    for (index, ix) in instructions.iter().enumerate() {
        current.push(ix.clone());
        if ctx.fits(&current)? {
            continue;
        }

        current.pop();
        if current.is_empty() {
            return Err(anyhow!(
                "Instruction {} for program {} does not fit in a transaction",
                index,
                ix.program_id
            ));
        }
        groups.push(std::mem::take(&mut current));

        current.push(ix.clone());
        if !ctx.fits(&current)? {
            return Err(anyhow!(
                "Instruction {} for program {} does not fit in a transaction",
                index,
                ix.program_id
            ));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}

/// Sign one transaction per group. A group that fails to build is reported
/// in its slot and does not stop the others.
pub fn build_batches(
    ctx: &BatchContext<'_>,
    groups: &[Vec<Instruction>],
    recent_blockhash: Hash,
    signers: &[&Keypair],
) -> Vec<Result<VersionedTransaction>> {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let ixs: Vec<Instruction> = ctx.prefix.iter().chain(group).cloned().collect();
            build_transaction(&ixs, ctx.payer, recent_blockhash, ctx.lookup_tables, ctx.version, signers)
                .map_err(|e| {
                    warn!("[BATCH] batch {}/{} failed: {:#}", i + 1, groups.len(), e);
                    e
                })
        })
        .collect()
}

/// Split, fetch one recent blockhash and sign every batch.
pub async fn build_batched_transactions(
    conn: &dyn LedgerConnection,
    ctx: &BatchContext<'_>,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<Vec<Result<VersionedTransaction>>> {
    let groups = split_instructions(ctx, instructions)?;
    let recent_blockhash = conn.get_latest_blockhash().await?;
    info!(
        "[BATCH] {} instructions -> {} transactions ({:?})",
        instructions.len(),
        groups.len(),
        ctx.version
    );
    Ok(build_batches(ctx, &groups, recent_blockhash, signers))
}

#[cfg(test)]
mod tests {
    use solana_sdk::{signature::Signer, system_instruction};

    use super::*;
    use crate::rpc::mock::MockConnection;
    use crate::tx::builder::transaction_size;
    use crate::tx::wrapper::ComputeBudget;

    fn transfers(from: &Pubkey, n: usize) -> Vec<Instruction> {
        (0..n)
            .map(|i| system_instruction::transfer(from, &Pubkey::new_unique(), 1 + i as u64))
            .collect()
    }

    fn ctx<'a>(payer: &'a Pubkey, prefix: &'a [Instruction]) -> BatchContext<'a> {
        BatchContext {
            payer,
            lookup_tables: &[],
            version: TxVersion::V0,
            prefix,
        }
    }

    #[test]
    fn test_small_list_is_one_batch() {
        let payer = Pubkey::new_unique();
        let ixs = transfers(&payer, 3);
        let groups = split_instructions(&ctx(&payer, &[]), &ixs).unwrap();
        assert_eq!(groups, vec![ixs]);
    }

    #[test]
    fn test_split_preserves_order_and_fits() {
        let payer = Pubkey::new_unique();
        let prefix = ComputeBudget::new(200_000, 10_000).instructions();
        let ixs = transfers(&payer, 60);
        let context = ctx(&payer, &prefix);

        let groups = split_instructions(&context, &ixs).unwrap();
        assert!(groups.len() > 1);
        let flattened: Vec<Instruction> = groups.iter().flatten().cloned().collect();
        assert_eq!(flattened, ixs);

        for group in &groups {
            let all: Vec<Instruction> = prefix.iter().chain(group).cloned().collect();
            let message = compile_message(&all, &payer, Hash::default(), &[], TxVersion::V0).unwrap();
            assert!(transaction_size(&message).unwrap() <= solana_sdk::packet::PACKET_DATA_SIZE);
        }
    }

    #[test]
    fn test_oversized_instruction_is_an_error() {
        let payer = Pubkey::new_unique();
        let huge = Instruction::new_with_bytes(Pubkey::new_unique(), &[0u8; 1_300], vec![]);
        let res = split_instructions(&ctx(&payer, &[]), &[huge]);
        assert!(res.unwrap_err().to_string().contains("does not fit"));
    }

    #[test]
    fn test_empty_list_has_no_batches() {
        let payer = Pubkey::new_unique();
        assert!(split_instructions(&ctx(&payer, &[]), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_failed_batch_does_not_abort_others() {
        let payer = Keypair::new();
        let payer_key = payer.pubkey();
        let cosigner = Keypair::new();
        let context = ctx(&payer_key, &[]);

        let ok_group = transfers(&payer_key, 1);
        // needs a signature we do not provide
        let bad_group = vec![system_instruction::transfer(&cosigner.pubkey(), &payer_key, 5)];
        let groups = vec![ok_group, bad_group, transfers(&payer_key, 2)];

        let results = build_batches(&context, &groups, Hash::new_unique(), &[&payer]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_build_batched_transactions_uses_one_blockhash() {
        let payer = Keypair::new();
        let payer_key = payer.pubkey();
        let conn = MockConnection {
            blockhash: Hash::new_unique(),
            ..Default::default()
        };
        let prefix = ComputeBudget::new(300_000, 0).instructions();
        let context = ctx(&payer_key, &prefix);

        let txs = build_batched_transactions(&conn, &context, &transfers(&payer_key, 45), &[&payer])
            .await
            .unwrap();
        assert!(txs.len() >= 2);
        for tx in txs {
            let tx = tx.unwrap();
            assert_eq!(*tx.message.recent_blockhash(), conn.blockhash);
            assert!(tx.message.instructions().len() >= 2);
        }
    }
}
