//! Signed transaction assembly from an ordered instruction list.

use anyhow::{anyhow, Context, Result};
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    hash::Hash,
    instruction::Instruction,
    message::{v0, Message, VersionedMessage},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};

/// Message flavour to compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxVersion {
    Legacy,
    V0,
}

impl TxVersion {
    /// Lookup tables only work with v0 messages.
    pub fn for_tables(use_versioned_tx: bool, lookup_tables: &[AddressLookupTableAccount]) -> Self {
        if use_versioned_tx || !lookup_tables.is_empty() {
            TxVersion::V0
        } else {
            TxVersion::Legacy
        }
    }
}

pub fn compile_message(
    instructions: &[Instruction],
    payer: &Pubkey,
    recent_blockhash: Hash,
    lookup_tables: &[AddressLookupTableAccount],
    version: TxVersion,
) -> Result<VersionedMessage> {
    match version {
        TxVersion::Legacy => {
            if !lookup_tables.is_empty() {
                return Err(anyhow!("Lookup tables need a v0 message"));
            }
            Ok(VersionedMessage::Legacy(Message::new_with_blockhash(
                instructions,
                Some(payer),
                &recent_blockhash,
            )))
        }
        TxVersion::V0 => {
            let message = v0::Message::try_compile(payer, instructions, lookup_tables, recent_blockhash)
                .context("compiling v0 message")?;
            Ok(VersionedMessage::V0(message))
        }
    }
}

/// Wire size of the transaction once every required signature is attached.
pub fn transaction_size(message: &VersionedMessage) -> Result<usize> {
    let unsigned = VersionedTransaction {
        signatures: vec![Signature::default(); usize::from(message.header().num_required_signatures)],
        message: message.clone(),
    };
    let size = bincode::serialized_size(&unsigned).context("sizing transaction")?;
    Ok(size as usize)
}

pub fn fits_in_packet(message: &VersionedMessage) -> Result<bool> {
    Ok(transaction_size(message)? <= PACKET_DATA_SIZE)
}

/// Keep only the signers the message asks for, erroring on any that is
/// missing.
pub fn select_signers<'a>(message: &VersionedMessage, signers: &[&'a Keypair]) -> Result<Vec<&'a Keypair>> {
    let required = usize::from(message.header().num_required_signatures);
    message
        .static_account_keys()
        .iter()
        .take(required)
        .map(|key| {
            signers
                .iter()
                .find(|signer| signer.pubkey() == *key)
                .copied()
                .ok_or_else(|| anyhow!("Missing signer {}", key))
        })
        .collect()
}

/// Compile and sign. `signers` may hold more keypairs than the message
/// needs; only the required ones sign.
pub fn build_transaction(
    instructions: &[Instruction],
    payer: &Pubkey,
    recent_blockhash: Hash,
    lookup_tables: &[AddressLookupTableAccount],
    version: TxVersion,
    signers: &[&Keypair],
) -> Result<VersionedTransaction> {
    if instructions.is_empty() {
        return Err(anyhow!("Cannot build a transaction without instructions"));
    }
    let message = compile_message(instructions, payer, recent_blockhash, lookup_tables, version)?;
    let size = transaction_size(&message)?;
    if size > PACKET_DATA_SIZE {
        return Err(anyhow!(
            "Transaction too large: {} bytes (max {})",
            size,
            PACKET_DATA_SIZE
        ));
    }

    let signers = select_signers(&message, signers)?;
    VersionedTransaction::try_new(message, signers.as_slice()).context("signing transaction")
}

#[cfg(test)]
mod tests {
    use solana_sdk::system_instruction;

    use super::*;

    fn transfers(from: &Pubkey, n: usize) -> Vec<Instruction> {
        (0..n)
            .map(|i| system_instruction::transfer(from, &Pubkey::new_unique(), 1_000 + i as u64))
            .collect()
    }

    #[test]
    fn test_build_legacy_transaction() {
        let payer = Keypair::new();
        let blockhash = Hash::new_unique();
        let tx = build_transaction(
            &transfers(&payer.pubkey(), 2),
            &payer.pubkey(),
            blockhash,
            &[],
            TxVersion::Legacy,
            &[&payer],
        )
        .unwrap();

        assert!(matches!(tx.message, VersionedMessage::Legacy(_)));
        assert_eq!(*tx.message.recent_blockhash(), blockhash);
        assert_eq!(tx.signatures.len(), 1);
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_build_v0_with_lookup_table() {
        let payer = Keypair::new();
        let ixs = transfers(&payer.pubkey(), 4);
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: ixs.iter().map(|ix| ix.accounts[1].pubkey).collect(),
        };

        let with_table = compile_message(&ixs, &payer.pubkey(), Hash::default(), &[table.clone()], TxVersion::V0).unwrap();
        let without = compile_message(&ixs, &payer.pubkey(), Hash::default(), &[], TxVersion::V0).unwrap();
        assert!(transaction_size(&with_table).unwrap() < transaction_size(&without).unwrap());

        let tx = build_transaction(&ixs, &payer.pubkey(), Hash::default(), &[table], TxVersion::V0, &[&payer]).unwrap();
        let VersionedMessage::V0(message) = &tx.message else {
            panic!("expected v0 message");
        };
        assert_eq!(message.address_table_lookups.len(), 1);
    }

    #[test]
    fn test_legacy_rejects_lookup_tables() {
        let payer = Keypair::new();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![],
        };
        let res = compile_message(&transfers(&payer.pubkey(), 1), &payer.pubkey(), Hash::default(), &[table], TxVersion::Legacy);
        assert!(res.is_err());
    }

    #[test]
    fn test_extra_signers_are_ignored() {
        let payer = Keypair::new();
        let bystander = Keypair::new();
        let tx = build_transaction(
            &transfers(&payer.pubkey(), 1),
            &payer.pubkey(),
            Hash::default(),
            &[],
            TxVersion::V0,
            &[&bystander, &payer],
        )
        .unwrap();
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn test_missing_signer_is_an_error() {
        let payer = Keypair::new();
        let other = Keypair::new();
        let err = build_transaction(
            &transfers(&payer.pubkey(), 1),
            &payer.pubkey(),
            Hash::default(),
            &[],
            TxVersion::Legacy,
            &[&other],
        )
        .unwrap_err();
        assert!(err.to_string().contains(&payer.pubkey().to_string()));
    }

    #[test]
    fn test_oversized_transaction_rejected() {
        let payer = Keypair::new();
        let res = build_transaction(&transfers(&payer.pubkey(), 40), &payer.pubkey(), Hash::default(), &[], TxVersion::Legacy, &[&payer]);
        assert!(res.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_version_selection() {
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![],
        };
        assert_eq!(TxVersion::for_tables(false, &[]), TxVersion::Legacy);
        assert_eq!(TxVersion::for_tables(true, &[]), TxVersion::V0);
        assert_eq!(TxVersion::for_tables(false, &[table]), TxVersion::V0);
    }
}
