use std::{fs::File, io::BufReader, path::Path};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::datasets::{DatasetError, Result};

#[derive(Debug, Deserialize)]
struct SquadFile {
    data: Vec<SquadArticle>,
}

#[derive(Debug, Deserialize)]
struct SquadArticle {
    #[serde(default)]
    title: String,
    paragraphs: Vec<SquadParagraph>,
}

#[derive(Debug, Deserialize)]
struct SquadParagraph {
    context: String,
    qas: Vec<SquadQuestion>,
}

#[derive(Debug, Deserialize)]
struct SquadQuestion {
    id: String,
    question: String,
    #[serde(default)]
    answers: Vec<Answer>,
    #[serde(default)]
    is_impossible: bool,
}

/// A gold answer, located by the char index where it starts in the context
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Answer {
    /// The answer text
    pub text: String,

    /// Char offset of the answer in the context
    pub answer_start: usize,
}

/// One question about one context paragraph
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Example {
    /// The question id from the source file
    pub qas_id: String,

    /// The question
    pub question_text: String,

    /// The paragraph the answer is extracted from
    pub context_text: String,

    /// The answer to train on (training only)
    pub answer_text: Option<String>,

    /// Char offset of `answer_text` in the context (training only)
    pub start_position_character: Option<usize>,

    /// Title of the article the paragraph belongs to
    pub title: String,

    /// Every gold answer (evaluation only)
    pub answers: Vec<Answer>,

    /// Whether the question is unanswerable from the context
    pub is_impossible: bool,
}

impl Example {
    /// The answer as a `[start, end)` char range of the context
    pub fn answer_span(&self) -> Option<(usize, usize)> {
        let start = self.start_position_character?;
        let len = self.answer_text.as_ref()?.chars().count();

        Some((start, start + len))
    }

    /// Whether the context actually holds the answer text at the stated offset, ignoring
    /// differences in whitespace
    pub fn answer_matches_context(&self) -> bool {
        let (Some((start, end)), Some(answer)) = (self.answer_span(), &self.answer_text) else {
            return false;
        };

        let actual: String = self
            .context_text
            .chars()
            .skip(start)
            .take(end - start)
            .collect();

        normalize_whitespace(&actual) == normalize_whitespace(answer)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read every example from a SQuAD v1.1 file
///
/// Training examples keep only the first answer of each question, and fail if a question has
/// none. Evaluation examples keep all answers and carry no position to train on.
pub fn read_examples(path: &Path, evaluate: bool) -> Result<Vec<Example>> {
    let reader = BufReader::new(File::open(path)?);
    let parsed: SquadFile = serde_json::from_reader(reader)?;

    let mut examples = Vec::new();

    for article in parsed.data {
        for paragraph in article.paragraphs {
            for qa in paragraph.qas {
                let example = if evaluate {
                    Example::new(
                        qa.id,
                        qa.question,
                        paragraph.context.clone(),
                        None,
                        None,
                        article.title.clone(),
                        qa.answers,
                        qa.is_impossible,
                    )
                } else {
                    let answer = qa
                        .answers
                        .into_iter()
                        .next()
                        .ok_or_else(|| DatasetError::MissingAnswer(qa.id.clone()))?;

                    Example::new(
                        qa.id,
                        qa.question,
                        paragraph.context.clone(),
                        Some(answer.text),
                        Some(answer.answer_start),
                        article.title.clone(),
                        vec![],
                        qa.is_impossible,
                    )
                };

                examples.push(example);
            }
        }
    }

    Ok(examples)
}
