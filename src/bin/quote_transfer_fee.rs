//! Quote the Token-2022 transfer fee for a mint at the current epoch
//!
//! Usage: cargo run --bin quote_transfer_fee -- --mint <MINT> --amount 1000000 [--add-fee]

use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::Parser;
use num_bigint::BigUint;
use solana_sdk::pubkey::Pubkey;
use token_fee_sdk::{config::settings::Settings, TxAssembler};

#[derive(Parser, Debug)]
#[command(about = "Quote Token-2022 transfer fees")]
struct Args {
    /// Path to settings.json
    #[arg(long, default_value = "config/settings.json")]
    settings: String,

    /// Mint address
    #[arg(long)]
    mint: String,

    /// Amount in the mint's smallest unit
    #[arg(long)]
    amount: String,

    /// Treat --amount as what the recipient must receive
    #[arg(long, default_value_t = false)]
    add_fee: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::load_from_file(&args.settings)?;
    let mint = Pubkey::from_str(&args.mint)?;
    let amount = BigUint::from_str(&args.amount)
        .map_err(|e| anyhow!("invalid amount `{}`: {}", args.amount, e))?;

    let assembler = TxAssembler::from_settings(&settings);
    let epoch_info = assembler.epoch_info().await?;
    let mint_info = assembler
        .mint_infos(std::slice::from_ref(&mint))
        .await?
        .remove(0);
    let quote = mint_info.transfer_amount_fee(&amount, &epoch_info, args.add_fee);

    let report = serde_json::json!({
        "mint": mint.to_string(),
        "program_id": mint_info.program_id.to_string(),
        "decimals": mint_info.decimals,
        "epoch": epoch_info.epoch,
        "add_fee": args.add_fee,
        "amount": quote.amount.to_string(),
        "fee": quote.fee.as_ref().map(|f| f.to_string()),
        "net_amount": quote.net_amount().to_string(),
        "expiration_time": quote.expiration_time,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
