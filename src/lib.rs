//! # Burn Corpora
//!
//! Tokenized, disk-cached SQuAD and NLI datasets for Burn.
#![forbid(unsafe_code)]

/// Datasets
pub mod datasets;

/// Caches for tokenized features
pub mod cache;

/// Pretrained tokenizers
pub mod tokenizer;

/// Utilities
pub mod utils;
