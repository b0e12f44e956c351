use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::datasets::DatasetError;

/// How a hypothesis relates to its premise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// The hypothesis contradicts the premise
    Contradiction,

    /// The premise entails the hypothesis
    Entailment,

    /// Neither
    Neutral,
}

impl Label {
    /// Every label, in class id order
    pub const ALL: [Label; 3] = [Label::Contradiction, Label::Entailment, Label::Neutral];

    /// The class id of the label
    pub fn id(self) -> i64 {
        match self {
            Label::Contradiction => 0,
            Label::Entailment => 1,
            Label::Neutral => 2,
        }
    }

    /// The label with the given class id
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.id() == id)
    }

    /// The name of the label as it appears in source files
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Contradiction => "contradiction",
            Label::Entailment => "entailment",
            Label::Neutral => "neutral",
        }
    }
}

impl TryFrom<&str> for Label {
    type Error = DatasetError;

    /// Names must match exactly; anything else is an error rather than a default class
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == value)
            .ok_or_else(|| DatasetError::UnknownLabel(value.to_string()))
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
