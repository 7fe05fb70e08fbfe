pub mod mint;

pub use mint::{fetch_multiple_mint_infos, unpack_mint, MintInfo};
