//! Runtime configuration loader and common helpers.

use std::{fmt, fs, path::Path, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use crate::tx::wrapper::ComputeBudget;

/// ------------------------------------------------------------------
/// Wallet file entries
/// ------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct WalletKeypairEntry {
    pub name: String,
    pub address: String,
    pub private_key_base58: String,
}

/// ------------------------------------------------------------------
/// Main Settings object
/// ------------------------------------------------------------------
pub struct Settings {
    /* -------- infrastructure ------------------------ */
    pub rpc_url: String,
    pub commitment: CommitmentConfig,

    /* -------- fee payer ----------------------------- */
    pub wallets_file: String,
    pub active_wallet: String,
    pub keypair: Arc<Keypair>,

    /* -------- transaction assembly ------------------ */
    pub compute_budget: ComputeBudget,
    pub lookup_tables: Vec<Pubkey>,
    pub use_versioned_tx: bool,

    /* -------- fee quotes ---------------------------- */
    pub epoch_info_ttl: Duration,

    /* -------- shared objects ------------------------ */
    pub rpc_client: Arc<RpcClient>,
}

impl Settings {
    /// --------------------------------------------------------------
    /// Read `settings.json` from disk.
    /// --------------------------------------------------------------
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        let json: serde_json::Value = serde_json::from_str(&raw)?;

        /* -------- plain strings ---------------------------------- */
        let rpc_url = json["rpc_url"]
            .as_str()
            .unwrap_or("https://api.mainnet-beta.solana.com")
            .to_string();
        let commitment_raw = json["commitment"].as_str().unwrap_or("confirmed");
        let commitment = CommitmentConfig::from_str(commitment_raw)
            .map_err(|_| anyhow!("invalid commitment `{commitment_raw}`"))?;

        let wallets_file = json["wallets_file"]
            .as_str()
            .unwrap_or("./wallets.json")
            .to_string();
        let active_wallet = json["active_wallet"]
            .as_str()
            .unwrap_or("FeePayer")
            .to_string();

        /* -------- transaction assembly --------------------------- */
        let unit_limit = match json["compute_unit_limit"].as_u64() {
            Some(limit) => Some(
                u32::try_from(limit).with_context(|| format!("compute_unit_limit {limit} out of range"))?,
            ),
            None => Some(200_000),
        };
        let priority_fee_lamports = json["priority_fee_lamports"].as_u64().unwrap_or(0);
        let compute_budget = ComputeBudget {
            unit_limit,
            priority_fee_lamports,
        };

        let mut lookup_tables = Vec::new();
        if let Some(tables) = json["lookup_tables"].as_array() {
            for table in tables {
                let key = table
                    .as_str()
                    .ok_or_else(|| anyhow!("lookup_tables entries must be strings"))?;
                lookup_tables.push(
                    Pubkey::from_str(key).with_context(|| format!("parsing lookup table {key}"))?,
                );
            }
        }
        let use_versioned_tx = json["use_versioned_tx"].as_bool().unwrap_or(true);

        let epoch_info_ttl = Duration::from_secs(json["epoch_info_ttl_secs"].as_u64().unwrap_or(30));

        /* -------- fee payer keypair ------------------------------ */
        let wallets_path = resolve_relative(path.as_ref(), &wallets_file);
        let wallet_map_raw = fs::read_to_string(&wallets_path)
            .with_context(|| format!("reading wallets file {}", wallets_path.display()))?;
        let wallet_list: Vec<WalletKeypairEntry> =
            serde_json::from_str(&wallet_map_raw).context("parsing wallets file")?;

        let active_wallet_entry = wallet_list
            .iter()
            .find(|w| w.name == active_wallet)
            .ok_or_else(|| anyhow!("active wallet `{active_wallet}` not found"))?;

        let private_key_bytes = bs58::decode(&active_wallet_entry.private_key_base58)
            .into_vec()
            .context("decoding base58 key")?;
        let keypair = Keypair::from_bytes(&private_key_bytes)
            .map_err(|e| anyhow!("invalid keypair for `{active_wallet}`: {e}"))?;
        if keypair.pubkey().to_string() != active_wallet_entry.address {
            return Err(anyhow!(
                "wallet `{}` address {} does not match its private key ({})",
                active_wallet,
                active_wallet_entry.address,
                keypair.pubkey()
            ));
        }

        /* -------- misc ------------------------------------------- */
        let rpc_client = Arc::new(RpcClient::new_with_commitment(rpc_url.clone(), commitment));

        Ok(Self {
            rpc_url,
            commitment,
            wallets_file,
            active_wallet,
            keypair: Arc::new(keypair),
            compute_budget,
            lookup_tables,
            use_versioned_tx,
            epoch_info_ttl,
            rpc_client,
        })
    }

    /// --------------------------------------------------------------
    /// Load settings from default config/settings.json file.
    /// --------------------------------------------------------------
    pub fn load() -> Result<Self> {
        Self::load_from_file("config/settings.json")
    }

    pub fn payer(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

/// Relative wallet paths are taken relative to the settings file.
fn resolve_relative(settings_path: &Path, file: &str) -> std::path::PathBuf {
    let candidate = Path::new(file);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    settings_path
        .parent()
        .map(|dir| dir.join(candidate))
        .unwrap_or_else(|| candidate.to_path_buf())
}

/* ------------------------------------------------------------------ */
/*  Manual Clone & Debug implementations (RpcClient isn’t Clone/Debug) */
/* ------------------------------------------------------------------ */
impl Clone for Settings {
    fn clone(&self) -> Self {
        Self {
            rpc_url: self.rpc_url.clone(),
            commitment: self.commitment,
            wallets_file: self.wallets_file.clone(),
            active_wallet: self.active_wallet.clone(),
            keypair: Arc::clone(&self.keypair),
            compute_budget: self.compute_budget,
            lookup_tables: self.lookup_tables.clone(),
            use_versioned_tx: self.use_versioned_tx,
            epoch_info_ttl: self.epoch_info_ttl,
            rpc_client: Arc::clone(&self.rpc_client),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("rpc_url", &self.rpc_url)
            .field("commitment", &self.commitment.commitment)
            .field("active_wallet", &self.active_wallet)
            .field("payer", &self.keypair.pubkey())
            .field("compute_budget", &self.compute_budget)
            .field("lookup_tables", &self.lookup_tables)
            .finish_non_exhaustive()
    }
}
