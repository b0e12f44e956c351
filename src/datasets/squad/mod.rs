/// SQuAD examples
pub mod example;

/// Fixed-length feature windows
pub mod feature;

/// The cached, indexable dataset
pub mod dataset;

/// Batching into Burn tensors
pub mod batcher;

pub use batcher::Batcher;
pub use dataset::{Cached, Dataset, Item, Tensors};
pub use example::{read_examples, Answer, Example};
pub use feature::{convert_examples, Feature};

/// The name of the SQuAD dataset
pub static DATASET: &str = "squad";

/// Window sizes used when converting examples to features
#[derive(burn::config::Config)]
pub struct Config {
    /// Length of every window, in tokens
    #[config(default = 384)]
    pub max_seq_len: usize,

    /// Overlap between consecutive windows over the same context
    #[config(default = 128)]
    pub doc_stride: usize,

    /// Questions longer than this many tokens are truncated
    #[config(default = 64)]
    pub max_query_len: usize,
}
