use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::utils::tensors::{column, stack_rows};

use super::Item;

/// A training batch for extractive question answering
#[derive(Clone, Debug)]
pub struct Train<B: Backend> {
    /// Token ids: [batch_size, max_seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention mask: [batch_size, max_seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Segment ids: [batch_size, max_seq_len]
    pub token_type_ids: Tensor<B, 2, Int>,

    /// Answer start positions: [batch_size]
    pub start_positions: Tensor<B, 1, Int>,

    /// Answer end positions: [batch_size]
    pub end_positions: Tensor<B, 1, Int>,
}

/// Struct for batching question answering windows
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// ID of the padding token
    pub pad_token_id: i64,

    /// Length of every window
    pub max_seq_len: usize,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<Item, Train<B>> for Batcher<B> {
    /// Collects a vector of windows into a training batch
    fn batch(&self, items: Vec<Item>) -> Train<B> {
        let batch_size = items.len();

        let mut input_ids = Vec::with_capacity(batch_size);
        let mut attention_mask = Vec::with_capacity(batch_size);
        let mut token_type_ids = Vec::with_capacity(batch_size);
        let mut starts = Vec::with_capacity(batch_size);
        let mut ends = Vec::with_capacity(batch_size);

        for item in items {
            input_ids.push(item.input_ids);
            attention_mask.push(item.attention_mask);
            token_type_ids.push(item.token_type_ids);
            starts.push(item.answer_start);
            ends.push(item.answer_end);
        }

        Train {
            input_ids: stack_rows(self.pad_token_id, input_ids, self.max_seq_len, &self.device),
            attention_mask: stack_rows(0, attention_mask, self.max_seq_len, &self.device),
            token_type_ids: stack_rows(0, token_type_ids, self.max_seq_len, &self.device),
            start_positions: column(starts, &self.device),
            end_positions: column(ends, &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stacks_windows_and_positions() {
        let batcher = Batcher::<NdArray>::new(0, 4, Default::default());
        let items = vec![
            Item::new(vec![2, 5, 3, 0], vec![1, 1, 1, 0], vec![0, 0, 1, 0], 1, 1),
            Item::new(vec![2, 6, 7, 3], vec![1, 1, 1, 1], vec![0, 0, 1, 1], 0, 0),
        ];

        let batch: Train<NdArray> = batcher.batch(items);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.token_type_ids.dims(), [2, 4]);
        assert_eq!(
            batch.start_positions.into_data().convert::<i64>().value,
            vec![1, 0]
        );
        assert_eq!(
            batch.attention_mask.into_data().convert::<i64>().value,
            vec![1, 1, 1, 0, 1, 1, 1, 1]
        );
    }
}
