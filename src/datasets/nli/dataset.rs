use std::path::{Path, PathBuf};

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tokenizers::TruncationParams;

use crate::{
    cache::{load_or_build, CacheStore},
    datasets::Result,
    tokenizer::Tokenizer,
    utils::{
        files::with_suffix,
        tensors::{fit, widen, IntMatrix},
    },
};

use super::{Config, Label};

/// One line of a headerless, tab-separated NLI file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Row {
    /// The first sentence
    pub premise: String,

    /// The second sentence
    pub hypothesis: String,

    /// The label name (e.g., "entailment")
    pub label: String,
}

/// One tokenized sentence pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Item {
    /// Token ids
    pub input_ids: Vec<i64>,

    /// The tokenizer's attention mask, under the name of the segment ids
    pub token_type_ids: Vec<i64>,

    /// The tokenizer's segment ids, under the name of the attention mask
    pub attention_mask: Vec<i64>,

    /// Class id of the label
    pub label: i64,
}

/// The four equal-length tensors persisted for one source file
///
/// Deserialization rejects columns that disagree on the number of rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTensors")]
pub struct Tensors {
    /// `[rows, max_sequence_length]` token ids
    pub input_ids: IntMatrix,

    /// `[rows, max_sequence_length]` attention mask values
    pub token_type_ids: IntMatrix,

    /// `[rows, max_sequence_length]` segment id values
    pub attention_mask: IntMatrix,

    /// One class id per row
    pub label: Vec<i64>,
}

#[derive(Deserialize)]
struct RawTensors {
    input_ids: IntMatrix,
    token_type_ids: IntMatrix,
    attention_mask: IntMatrix,
    label: Vec<i64>,
}

impl TryFrom<RawTensors> for Tensors {
    type Error = String;

    fn try_from(raw: RawTensors) -> std::result::Result<Self, Self::Error> {
        let rows = raw.input_ids.rows();
        let lengths = [
            ("token_type_ids", raw.token_type_ids.rows()),
            ("attention_mask", raw.attention_mask.rows()),
            ("label", raw.label.len()),
        ];

        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != rows) {
            return Err(format!("{name} has {len} rows, input_ids has {rows}"));
        }

        Ok(Self {
            input_ids: raw.input_ids,
            token_type_ids: raw.token_type_ids,
            attention_mask: raw.attention_mask,
            label: raw.label,
        })
    }
}

impl Tensors {
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
            token_type_ids: self.token_type_ids.row(index)?.to_vec(),
            attention_mask: self.attention_mask.row(index)?.to_vec(),
            label: *self.label.get(index)?,
        })
    }
}

/// Read a headerless `premise \t hypothesis \t label` file
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new();
    reader.delimiter(b'\t').has_headers(false);

    let rows: InMemDataset<Row> = InMemDataset::from_csv(path, &reader)?;

    Ok(rows.iter().collect())
}

/// Tokenize every pair and map every label
pub fn tokenize(rows: &[Row], tokenizer: &Tokenizer, config: &Config) -> Result<Tensors> {
    let max_len = config.max_sequence_length;

    let label = rows
        .iter()
        .map(|row| Label::try_from(row.label.as_str()).map(Label::id))
        .collect::<Result<Vec<_>>>()?;

    let fixed = tokenizer.fixed_length(TruncationParams {
        max_length: max_len,
        ..Default::default()
    })?;
    let pad_id = tokenizer.pad_id() as i64;

    let mut input_ids = Vec::with_capacity(rows.len());
    let mut attention_mask = Vec::with_capacity(rows.len());
    let mut type_ids = Vec::with_capacity(rows.len());

    for row in rows {
        let encoding = fixed.encode((row.premise.as_str(), row.hypothesis.as_str()), true)?;

        input_ids.push(fit(&widen(encoding.get_ids()), max_len, pad_id));
        attention_mask.push(fit(&widen(encoding.get_attention_mask()), max_len, 0));
        type_ids.push(fit(&widen(encoding.get_type_ids()), max_len, 0));
    }

    // Stored crossed: token_type_ids holds the attention mask and attention_mask the segment ids
    Ok(Tensors {
        input_ids: IntMatrix::from_rows(max_len, input_ids),
        token_type_ids: IntMatrix::from_rows(max_len, attention_mask),
        attention_mask: IntMatrix::from_rows(max_len, type_ids),
        label,
    })
}

/// Struct for the NLI dataset
#[derive(Clone, Debug)]
pub struct Dataset {
    tensors: Tensors,
}

impl From<Tensors> for Dataset {
    fn from(tensors: Tensors) -> Self {
        Self { tensors }
    }
}

/// Implement the Dataset trait for the NLI dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific pair from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.tensors.item(index)
    }

    /// Returns the number of pairs
    fn len(&self) -> usize {
        self.tensors.len()
    }
}

impl Dataset {
    /// Load the pairs at `path`, tokenizing them only if no cache entry exists yet
    pub fn load<S: CacheStore + ?Sized>(
        path: &Path,
        tokenizer: &Tokenizer,
        config: &Config,
        store: &S,
    ) -> Result<Self> {
        let key = Self::cache_key(path, tokenizer);

        let tensors = load_or_build(store, &key, || {
            let rows = read_rows(path)?;
            log::info!("Read {} sentence pairs from {}", rows.len(), path.display());

            tokenize(&rows, tokenizer, config)
        })?;

        Ok(tensors.into())
    }

    /// Where the tensors for `path` are cached: `<path>_<TokenizerClassName>.pickle`
    pub fn cache_key(path: &Path, tokenizer: &Tokenizer) -> PathBuf {
        with_suffix(path, &format!("_{}.pickle", tokenizer.class_name()))
    }

    /// The stacked tensors
    pub fn tensors(&self) -> &Tensors {
        &self.tensors
    }

    /// How many pairs carry each label, in class id order
    pub fn label_counts(&self) -> Vec<(Label, usize)> {
        let mut counts: Vec<(Label, usize)> = Label::ALL.iter().map(|label| (*label, 0)).collect();

        for label in self.tensors.label.iter().filter_map(|id| Label::from_id(*id)) {
            if let Some((_, count)) = counts.iter_mut().find(|(l, _)| *l == label) {
                *count += 1;
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        cache::MemoryCache,
        datasets::DatasetError,
        tokenizer::{self, tests::fixture},
    };

    fn rows() -> Vec<Row> {
        vec![
            Row::new(
                "A man is eating.".into(),
                "A man is eating food.".into(),
                "entailment".into(),
            ),
            Row::new(
                "a woman is sleeping .".into(),
                "a woman is eating .".into(),
                "contradiction".into(),
            ),
        ]
    }

    #[test]
    fn cache_key_extends_the_source_path() {
        let tokenizer = fixture(&tokenizer::Config::new());

        assert_eq!(
            Dataset::cache_key(Path::new("data/xnli/dev.tsv"), &tokenizer),
            PathBuf::from("data/xnli/dev.tsv_WordLevelTokenizerFast.pickle")
        );
    }

    #[test]
    fn tokenizes_pairs_to_fixed_length() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let tensors = tokenize(&rows(), &tokenizer, &Config::new()).unwrap();

        assert_eq!(tensors.len(), 2);
        assert_eq!(tensors.input_ids.shape(), [2, 128]);
        assert_eq!(tensors.token_type_ids.shape(), [2, 128]);
        assert_eq!(tensors.attention_mask.shape(), [2, 128]);
        assert_eq!(tensors.label, vec![1, 0]);
    }

    #[test]
    fn mask_and_segment_fields_are_crossed() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let tensors = tokenize(&rows()[1..], &tokenizer, &Config::new()).unwrap();
        let item = tensors.item(0).unwrap();

        // [CLS] a woman is sleeping . [SEP] a woman is eating . [SEP]
        let mut mask = vec![1; 13];
        mask.resize(128, 0);
        let mut segments = vec![0; 7];
        segments.extend(vec![1; 6]);
        segments.resize(128, 0);

        assert_eq!(item.token_type_ids, mask);
        assert_eq!(item.attention_mask, segments);
    }

    #[test]
    fn long_pairs_are_truncated() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let config = Config::new().with_max_sequence_length(8);

        let tensors = tokenize(&rows(), &tokenizer, &config).unwrap();

        assert_eq!(tensors.input_ids.shape(), [2, 8]);
        assert!(tensors.token_type_ids.row(1).unwrap().iter().all(|v| *v == 1));
    }

    #[test]
    fn unknown_labels_fail() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let mut rows = rows();
        rows[0].label = "unknown".into();

        let result = tokenize(&rows, &tokenizer, &Config::new());

        assert!(matches!(result, Err(DatasetError::UnknownLabel(label)) if label == "unknown"));
    }

    #[test]
    fn counts_pairs_per_label() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let dataset: Dataset = tokenize(&rows(), &tokenizer, &Config::new()).unwrap().into();

        assert_eq!(
            dataset.label_counts(),
            vec![
                (Label::Contradiction, 1),
                (Label::Entailment, 1),
                (Label::Neutral, 0)
            ]
        );
    }

    #[test]
    fn cached_tensors_with_missing_labels_fail_to_load() {
        let tokenizer = fixture(&tokenizer::Config::new());
        let path = Path::new("does/not/exist.tsv");
        let store = MemoryCache::new();

        let mut tensors = tokenize(&rows(), &tokenizer, &Config::new()).unwrap();
        tensors.label.pop();
        store
            .write(
                &Dataset::cache_key(path, &tokenizer),
                &serde_json::to_vec(&tensors).unwrap(),
            )
            .unwrap();

        let result = Dataset::load(path, &tokenizer, &Config::new(), &store);

        assert!(matches!(
            result,
            Err(DatasetError::Json(err)) if err.to_string().contains("label has 1 rows")
        ));
    }
}
