// App-specific modules
pub mod assembler;
pub mod config;
pub mod fees;
pub mod rpc;
pub mod token;
pub mod tx;
pub mod utils;

pub use assembler::{MintTransfer, TxAssembler};
