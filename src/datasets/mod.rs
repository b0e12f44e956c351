use std::fmt::Display;

/// SQuAD-style extractive question answering
pub mod squad;

/// Three-way natural language inference over sentence pairs
pub mod nli;

/// The Dataset enum
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dataset {
    /// Extractive question answering
    Squad,

    /// Sentence-pair classification
    Nli,
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            v if v == squad::DATASET => Ok(Dataset::Squad),
            v if v == nli::DATASET => Ok(Dataset::Nli),
            _ => Err(DatasetError::Unknown(value.to_string())),
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::Squad => squad::DATASET,
            Dataset::Nli => nli::DATASET,
        };

        write!(f, "{}", name)
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),

    /// A label outside of the fixed label set
    #[error("unknown label: {0:?}")]
    UnknownLabel(String),

    /// A training question with no answer to align
    #[error("question {0} has no answers")]
    MissingAnswer(String),

    /// The model is not in the local Hugging Face cache and downloads are disabled
    #[error("{0} is not available in the local Hugging Face cache")]
    ModelNotCached(String),

    /// File system failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Source or cache (de)serialization failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Failure inside the tokenizer
    #[error("tokenizer failure: {0}")]
    Tokenizer(#[from] tokenizers::Error),
}

/// Result alias for dataset loading
pub type Result<T> = std::result::Result<T, DatasetError>;
