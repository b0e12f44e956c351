use tokenizers::{
    models::ModelWrapper,
    normalizers::{Lowercase, Sequence},
    NormalizerWrapper, PaddingParams, PaddingStrategy, TruncationParams,
};

use crate::datasets::{self, DatasetError};

/// How to obtain and apply a pretrained tokenizer
#[derive(burn::config::Config)]
pub struct Config {
    /// Model name on the Hugging Face hub (e.g., "xlm-roberta-base")
    #[config(default = "\"xlm-roberta-base\".to_string()")]
    pub model_name: String,

    /// Lowercase every input before encoding, keeping offsets aligned with the original text
    #[config(default = false)]
    pub do_lower_case: bool,

    /// Identify as the fast tokenizer variant in cache keys
    #[config(default = true)]
    pub use_fast: bool,

    /// Never touch the network, only read the local hub cache
    #[config(default = false)]
    pub local_files_only: bool,
}

/// A pretrained subword tokenizer plus the identity used to key cached features
#[derive(Clone)]
pub struct Tokenizer {
    inner: tokenizers::Tokenizer,
    class_name: String,
}

impl Tokenizer {
    /// Load the tokenizer for `config.model_name`
    pub fn from_pretrained(config: &Config) -> datasets::Result<Self> {
        let inner = if config.local_files_only {
            let path = hf_hub::Cache::default()
                .model(config.model_name.clone())
                .get("tokenizer.json")
                .ok_or_else(|| DatasetError::ModelNotCached(config.model_name.clone()))?;

            tokenizers::Tokenizer::from_file(path)?
        } else {
            tokenizers::Tokenizer::from_pretrained(&config.model_name, None)?
        };

        log::info!("Loaded tokenizer for {}", config.model_name);

        Ok(Self::new(inner, config))
    }

    /// Wrap an already-built tokenizer
    pub fn new(mut inner: tokenizers::Tokenizer, config: &Config) -> Self {
        let kind = match inner.get_model() {
            ModelWrapper::BPE(_) => "Bpe",
            ModelWrapper::WordPiece(_) => "WordPiece",
            ModelWrapper::WordLevel(_) => "WordLevel",
            ModelWrapper::Unigram(_) => "Unigram",
        };

        let suffix = if config.use_fast { "Fast" } else { "" };

        if config.do_lower_case {
            let normalizer: NormalizerWrapper = match inner.get_normalizer() {
                Some(existing) => Sequence::new(vec![Lowercase.into(), existing.clone()]).into(),
                None => Lowercase.into(),
            };

            inner.with_normalizer(normalizer);
        }

        Self {
            inner,
            class_name: format!("{kind}Tokenizer{suffix}"),
        }
    }

    /// The name cached features are keyed by (e.g., "UnigramTokenizerFast")
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// A copy of the tokenizer that truncates with `truncation` and pads every encoding to
    /// exactly `truncation.max_length` tokens
    pub fn fixed_length(
        &self,
        truncation: TruncationParams,
    ) -> datasets::Result<tokenizers::Tokenizer> {
        let padding = self.padding(truncation.max_length);

        let mut tokenizer = self.inner.clone();
        tokenizer
            .with_truncation(Some(truncation))?
            .with_padding(Some(padding));

        Ok(tokenizer)
    }

    /// A copy of the tokenizer with no truncation or padding at all
    pub fn plain(&self) -> datasets::Result<tokenizers::Tokenizer> {
        let mut tokenizer = self.inner.clone();
        tokenizer.with_truncation(None)?.with_padding(None);

        Ok(tokenizer)
    }

    /// Fixed-length padding that reuses the model's own pad token
    pub fn padding(&self, length: usize) -> PaddingParams {
        let base = match self.inner.get_padding() {
            Some(params) => params.clone(),
            None => {
                let (pad_token, pad_id) = ["<pad>", "[PAD]"]
                    .iter()
                    .find_map(|token| {
                        self.inner
                            .token_to_id(token)
                            .map(|id| (token.to_string(), id))
                    })
                    .unwrap_or_else(|| ("[PAD]".to_string(), 0));

                PaddingParams {
                    pad_id,
                    pad_token,
                    ..Default::default()
                }
            }
        };

        PaddingParams {
            strategy: PaddingStrategy::Fixed(length),
            pad_to_multiple_of: None,
            ..base
        }
    }

    /// The id used for padding positions
    pub fn pad_id(&self) -> u32 {
        self.padding(0).pad_id
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// A small word-level tokenizer that needs no network access
    pub(crate) fn fixture(config: &Config) -> Tokenizer {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokenizer.json");
        let inner = tokenizers::Tokenizer::from_file(path).unwrap();

        Tokenizer::new(inner, config)
    }

    #[test]
    fn class_name_reflects_model_and_variant() {
        let fast = fixture(&Config::new());
        let slow = fixture(&Config::new().with_use_fast(false));

        assert_eq!(fast.class_name(), "WordLevelTokenizerFast");
        assert_eq!(slow.class_name(), "WordLevelTokenizer");
    }

    #[test]
    fn case_folding_is_opt_in() {
        let cased = fixture(&Config::new());
        let folded = fixture(&Config::new().with_do_lower_case(true));

        let cased = cased.plain().unwrap().encode("A man", false).unwrap();
        let folded = folded.plain().unwrap().encode("A man", false).unwrap();

        // "A" is not in the lowercase vocabulary
        assert_eq!(cased.get_ids().to_vec(), vec![1, 19]);
        assert_eq!(folded.get_ids().to_vec(), vec![18, 19]);
    }

    #[test]
    fn case_folding_keeps_offsets_on_the_original_text() {
        let folded = fixture(&Config::new().with_do_lower_case(true));
        let text = "İİ the TOWER";

        let encoding = folded
            .plain()
            .unwrap()
            .encode_char_offsets(text, false)
            .unwrap();

        // "İ" grows to two chars when lowercased; offsets must not shift
        let tower = encoding.get_ids().iter().position(|id| *id == 6).unwrap();

        assert_eq!(encoding.get_offsets()[tower], (7, 12));
    }

    #[test]
    fn pads_with_the_vocabulary_pad_token() {
        let tokenizer = fixture(&Config::new());
        let padding = tokenizer.padding(12);

        assert_eq!(padding.pad_token, "[PAD]");
        assert_eq!(tokenizer.pad_id(), 0);
        assert!(matches!(padding.strategy, PaddingStrategy::Fixed(12)));
    }

    #[test]
    fn fixed_length_encodings_are_padded_and_truncated() {
        let tokenizer = fixture(&Config::new());
        let fixed = tokenizer
            .fixed_length(TruncationParams {
                max_length: 6,
                ..Default::default()
            })
            .unwrap();

        let short = fixed.encode(("a", "food"), true).unwrap();
        let long = fixed
            .encode(("a man is eating food .", "a woman is sleeping ."), true)
            .unwrap();

        assert_eq!(short.get_ids().len(), 6);
        assert_eq!(long.get_ids().len(), 6);
        assert_eq!(short.get_attention_mask().to_vec(), vec![1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn offline_mode_requires_a_cached_model() {
        let config = Config::new()
            .with_model_name("burn-corpora/definitely-not-a-model".to_string())
            .with_local_files_only(true);

        let result = Tokenizer::from_pretrained(&config);

        assert!(matches!(result, Err(DatasetError::ModelNotCached(_))));
    }
}
