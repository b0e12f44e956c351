/// The three-way label set
pub mod label;

/// The cached, indexable dataset
pub mod dataset;

/// Batching into Burn tensors
pub mod batcher;

pub use batcher::Batcher;
pub use dataset::{Dataset, Item, Row, Tensors};
pub use label::Label;

/// The name of the NLI dataset
pub static DATASET: &str = "nli";

/// Sequence length used when tokenizing sentence pairs
#[derive(burn::config::Config)]
pub struct Config {
    /// Every pair is truncated or padded to exactly this many tokens
    #[config(default = 128)]
    pub max_sequence_length: usize,
}
