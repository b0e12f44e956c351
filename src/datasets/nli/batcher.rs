use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::utils::tensors::{column, stack_rows};

use super::Item;

/// A training batch for sentence-pair classification
#[derive(Clone, Debug)]
pub struct Train<B: Backend> {
    /// Token ids: [batch_size, max_sequence_length]
    pub input_ids: Tensor<B, 2, Int>,

    /// The `token_type_ids` field of each item: [batch_size, max_sequence_length]
    pub token_type_ids: Tensor<B, 2, Int>,

    /// The `attention_mask` field of each item: [batch_size, max_sequence_length]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching sentence pairs
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// ID of the padding token
    pub pad_token_id: i64,

    /// Length of every pair
    pub max_sequence_length: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<Item, Train<B>> for Batcher<B> {
    /// Collects a vector of sentence pairs into a training batch
    fn batch(&self, items: Vec<Item>) -> Train<B> {
        let batch_size = items.len();
        let seq_len = self.max_sequence_length;

        let mut input_ids = Vec::with_capacity(batch_size);
        let mut token_type_ids = Vec::with_capacity(batch_size);
        let mut attention_mask = Vec::with_capacity(batch_size);
        let mut class_ids = Vec::with_capacity(batch_size);

        for item in items {
            input_ids.push(item.input_ids);
            token_type_ids.push(item.token_type_ids);
            attention_mask.push(item.attention_mask);
            class_ids.push(item.label);
        }

        Train {
            input_ids: stack_rows(self.pad_token_id, input_ids, seq_len, &self.device),
            token_type_ids: stack_rows(0, token_type_ids, seq_len, &self.device),
            attention_mask: stack_rows(0, attention_mask, seq_len, &self.device),
            targets: column(class_ids, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stacks_pairs_and_targets() {
        let batcher = Batcher::<NdArray>::new(0, 5, Default::default());
        let items = vec![
            Item::new(vec![2, 18, 3, 19, 3], vec![1; 5], vec![0, 0, 0, 1, 1], 1),
            Item::new(vec![2, 22, 3, 24, 3], vec![1; 5], vec![0, 0, 0, 1, 1], 2),
            Item::new(vec![2, 3, 3, 0, 0], vec![1, 1, 1, 0, 0], vec![0; 5], 0),
        ];

        let batch: Train<NdArray> = batcher.batch(items);

        assert_eq!(batch.input_ids.dims(), [3, 5]);
        assert_eq!(batch.attention_mask.dims(), [3, 5]);
        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![1, 2, 0]
        );
    }
}
