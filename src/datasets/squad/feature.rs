use serde::{Deserialize, Serialize};
use tokenizers::{Encoding, TruncationDirection, TruncationParams, TruncationStrategy};

use crate::{
    datasets::Result,
    tokenizer::Tokenizer,
    utils::tensors::{fit, widen},
};

use super::{Config, Example};

/// First unique id handed out to a feature
pub const UNIQUE_ID_START: usize = 1_000_000_000;

/// One fixed-length window over the context of an example
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Unique id of the window
    pub unique_id: usize,

    /// Index of the example this window was cut from
    pub example_index: usize,

    /// Token ids, padded to the max sequence length
    pub input_ids: Vec<i64>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<i64>,

    /// Segment id of each token
    pub token_type_ids: Vec<i64>,

    /// For context tokens, the `[start, end)` char range they cover in the context
    pub token_offsets: Vec<Option<(usize, usize)>>,

    /// Position of the classification token
    pub cls_index: usize,

    /// Token position where the answer starts
    pub start_position: usize,

    /// Token position where the answer ends (inclusive)
    pub end_position: usize,

    /// The answer is not inside this window
    pub is_impossible: bool,
}

/// Tokenize examples into fixed-length windows
///
/// Long contexts are split into several windows, each overlapping the previous one by
/// `config.doc_stride` tokens. When training, every window is labelled with the token positions
/// of the answer, or with the CLS position when the answer falls outside of the window.
/// Training examples whose answer cannot be found in the context produce no features.
pub fn convert_examples(
    examples: &[Example],
    tokenizer: &Tokenizer,
    config: &Config,
    is_training: bool,
) -> Result<Vec<Feature>> {
    let query_tokenizer = tokenizer.plain()?;
    let window_tokenizer = tokenizer.fixed_length(TruncationParams {
        max_length: config.max_seq_len,
        stride: config.doc_stride,
        strategy: TruncationStrategy::OnlySecond,
        ..Default::default()
    })?;

    let pad_id = tokenizer.pad_id() as i64;
    let mut features = Vec::new();

    for (example_index, example) in examples.iter().enumerate() {
        if is_training && !example.answer_matches_context() {
            log::warn!(
                "Could not find answer {:?} for question {}, skipping",
                example.answer_text.as_deref().unwrap_or_default(),
                example.qas_id
            );
            continue;
        }

        let question =
            encode_query(&query_tokenizer, &example.question_text, config.max_query_len)?;
        let context = query_tokenizer.encode_char_offsets(example.context_text.as_str(), false)?;

        let encoding = window_tokenizer.post_process(question, Some(context), true)?;
        let windows: Vec<&Encoding> = std::iter::once(&encoding)
            .chain(encoding.get_overflowing())
            .collect();

        log::debug!("Example {} split into {} windows", example.qas_id, windows.len());

        for window in windows {
            let mut feature = window_feature(window, config.max_seq_len, pad_id);
            feature.unique_id = UNIQUE_ID_START + features.len();
            feature.example_index = example_index;

            if is_training {
                let aligned = example
                    .answer_span()
                    .and_then(|span| align_answer(&feature.token_offsets, span));

                match aligned {
                    Some((start, end)) if !example.is_impossible => {
                        feature.start_position = start;
                        feature.end_position = end;
                    }
                    _ => {
                        feature.start_position = feature.cls_index;
                        feature.end_position = feature.cls_index;
                        feature.is_impossible = true;
                    }
                }
            }

            features.push(feature);
        }
    }

    log::info!(
        "Converted {} examples into {} features",
        examples.len(),
        features.len()
    );

    Ok(features)
}

/// Encode the question, keeping at most its first `max_query_len` tokens
fn encode_query(
    tokenizer: &tokenizers::Tokenizer,
    question: &str,
    max_query_len: usize,
) -> Result<Encoding> {
    let mut encoding = tokenizer.encode_char_offsets(question, false)?;

    encoding.truncate(max_query_len, 0, TruncationDirection::Right);
    encoding.take_overflowing();

    Ok(encoding)
}

fn window_feature(window: &Encoding, max_seq_len: usize, pad_id: i64) -> Feature {
    let token_offsets: Vec<Option<(usize, usize)>> = window
        .get_sequence_ids()
        .into_iter()
        .zip(window.get_offsets())
        .map(|(sequence, offsets)| (sequence == Some(1)).then_some(*offsets))
        .collect();

    let cls_index = window
        .get_special_tokens_mask()
        .iter()
        .position(|special| *special == 1)
        .unwrap_or(0);

    Feature {
        unique_id: 0,
        example_index: 0,
        input_ids: fit(&widen(window.get_ids()), max_seq_len, pad_id),
        attention_mask: fit(&widen(window.get_attention_mask()), max_seq_len, 0),
        token_type_ids: fit(&widen(window.get_type_ids()), max_seq_len, 0),
        token_offsets: fit(&token_offsets, max_seq_len, None),
        cls_index,
        start_position: 0,
        end_position: 0,
        is_impossible: false,
    }
}

/// Map a `[start, end)` char span onto the first and last context tokens covering it
///
/// Returns `None` unless the window's context tokens cover the whole span.
pub fn align_answer(
    token_offsets: &[Option<(usize, usize)>],
    (answer_start, answer_end): (usize, usize),
) -> Option<(usize, usize)> {
    let context: Vec<(usize, (usize, usize))> = token_offsets
        .iter()
        .enumerate()
        .filter_map(|(index, offsets)| offsets.map(|offsets| (index, offsets)))
        .collect();

    let (_, (window_start, _)) = context.first()?;
    let (_, (_, window_end)) = context.last()?;

    if *window_start > answer_start || *window_end < answer_end {
        return None;
    }

    let start = context
        .iter()
        .rev()
        .find(|(_, (start, _))| *start <= answer_start)?
        .0;
    let end = context.iter().find(|(_, (_, end))| *end >= answer_end)?.0;

    Some((start, end))
}
