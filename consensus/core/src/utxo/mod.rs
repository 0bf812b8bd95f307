pub mod utxo_diff;

pub use utxo_diff::UtxoDiff;
