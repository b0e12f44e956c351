use std::path::{Path, PathBuf};

use burn::data::dataset;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    cache::{load_or_build, CacheStore},
    datasets::Result,
    tokenizer::Tokenizer,
    utils::{files::split_path, tensors::IntMatrix},
};

use super::{convert_examples, read_examples, Config, Example, Feature};

/// One window, ready for a question answering model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Item {
    /// Token ids
    pub input_ids: Vec<i64>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<i64>,

    /// Segment ids
    pub token_type_ids: Vec<i64>,

    /// Answer start token (training), or the feature index (evaluation)
    pub answer_start: i64,

    /// Answer end token (training), or the CLS position (evaluation)
    pub answer_end: i64,
}

/// Column-oriented tensors with one row per feature
///
/// Deserialization rejects columns that disagree on the number of rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTensors")]
pub struct Tensors {
    /// `[rows, max_seq_len]` token ids
    pub input_ids: IntMatrix,

    /// `[rows, max_seq_len]` attention mask
    pub attention_mask: IntMatrix,

    /// `[rows, max_seq_len]` segment ids
    pub token_type_ids: IntMatrix,

    /// One answer start per row
    pub answer_start: Vec<i64>,

    /// One answer end per row
    pub answer_end: Vec<i64>,
}

#[derive(Deserialize)]
struct RawTensors {
    input_ids: IntMatrix,
    attention_mask: IntMatrix,
    token_type_ids: IntMatrix,
    answer_start: Vec<i64>,
    answer_end: Vec<i64>,
}

impl TryFrom<RawTensors> for Tensors {
    type Error = String;

    fn try_from(raw: RawTensors) -> std::result::Result<Self, Self::Error> {
        let rows = raw.input_ids.rows();
        let lengths = [
            ("attention_mask", raw.attention_mask.rows()),
            ("token_type_ids", raw.token_type_ids.rows()),
            ("answer_start", raw.answer_start.len()),
            ("answer_end", raw.answer_end.len()),
        ];

        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != rows) {
            return Err(format!("{name} has {len} rows, input_ids has {rows}"));
        }

        Ok(Self {
            input_ids: raw.input_ids,
            attention_mask: raw.attention_mask,
            token_type_ids: raw.token_type_ids,
            answer_start: raw.answer_start,
            answer_end: raw.answer_end,
        })
    }
}

impl Tensors {
    /// Stack features into tensors
    ///
    /// Evaluation features have no gold positions, so their rows carry the feature index and the
    /// CLS position in the answer columns instead.
    pub fn from_features(features: &[Feature], max_seq_len: usize, evaluate: bool) -> Self {
        let (answer_start, answer_end) = features
            .iter()
            .enumerate()
            .map(|(index, f)| {
                if evaluate {
                    (index as i64, f.cls_index as i64)
                } else {
                    (f.start_position as i64, f.end_position as i64)
                }
            })
            .unzip();

        Self {
            input_ids: stack(features, max_seq_len, |f| &f.input_ids),
            attention_mask: stack(features, max_seq_len, |f| &f.attention_mask),
            token_type_ids: stack(features, max_seq_len, |f| &f.token_type_ids),
            answer_start,
            answer_end,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.input_ids.rows()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather the columns of a single row
    pub fn item(&self, index: usize) -> Option<Item> {
        Some(Item {
            input_ids: self.input_ids.row(index)?.to_vec(),
            attention_mask: self.attention_mask.row(index)?.to_vec(),
            token_type_ids: self.token_type_ids.row(index)?.to_vec(),
            answer_start: *self.answer_start.get(index)?,
            answer_end: *self.answer_end.get(index)?,
        })
    }
}

fn stack(
    features: &[Feature],
    max_seq_len: usize,
    column: impl Fn(&Feature) -> &Vec<i64>,
) -> IntMatrix {
    let rows = features.iter().map(|f| column(f).clone()).collect();

    IntMatrix::from_rows(max_seq_len, rows)
}

/// Everything persisted for one source file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cached {
    /// Feature windows
    pub features: Vec<Feature>,

    /// Stacked tensors, one row per feature
    pub dataset: Tensors,

    /// The examples the features were cut from
    pub examples: Vec<Example>,
}

/// Struct for the SQuAD dataset
#[derive(Clone, Debug)]
pub struct Dataset {
    features: Vec<Feature>,
    tensors: Tensors,
    examples: Vec<Example>,
}

impl From<Cached> for Dataset {
    fn from(cached: Cached) -> Self {
        Self {
            features: cached.features,
            tensors: cached.dataset,
            examples: cached.examples,
        }
    }
}

/// Implement the Dataset trait for the SQuAD dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific window from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.tensors.item(index)
    }

    /// Returns the number of windows
    fn len(&self) -> usize {
        self.tensors.len()
    }
}

impl Dataset {
    /// Load the dataset at `path`, tokenizing it only if no cache entry exists yet
    pub fn load<S: CacheStore + ?Sized>(
        path: &Path,
        evaluate: bool,
        tokenizer: &Tokenizer,
        config: &Config,
        store: &S,
    ) -> Result<Self> {
        let key = Self::cache_key(path, tokenizer);

        let cached = load_or_build(store, &key, || {
            let examples = read_examples(path, evaluate)?;
            let features = convert_examples(&examples, tokenizer, config, !evaluate)?;
            let dataset = Tensors::from_features(&features, config.max_seq_len, evaluate);

            Ok(Cached {
                features,
                dataset,
                examples,
            })
        })?;

        log::info!("Loaded {} windows from {}", cached.dataset.len(), path.display());

        Ok(cached.into())
    }

    /// Where the features for `path` are cached: `<dir>/cached_<TokenizerClassName>_<filename>`
    pub fn cache_key(path: &Path, tokenizer: &Tokenizer) -> PathBuf {
        let (dir, filename) = split_path(path);

        dir.join(format!("cached_{}_{}", tokenizer.class_name(), filename))
    }

    /// The feature windows, in row order
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The examples the windows were cut from
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// The stacked tensors
    pub fn tensors(&self) -> &Tensors {
        &self.tensors
    }
}
