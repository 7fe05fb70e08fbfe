//! Transaction assembly: compute budget, lookup tables, signing, batching.

pub mod batch;
pub mod builder;
pub mod lookup_table;
pub mod wrapper;

pub use batch::{build_batched_transactions, split_instructions, BatchContext};
pub use builder::{build_transaction, TxVersion};
pub use lookup_table::LookupTableCache;
pub use wrapper::ComputeBudget;
