use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank must contain at least one question")]
    Empty,

    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },

    #[error("question {index} has an empty answer")]
    EmptyAnswer { index: usize },

    #[error("too many questions: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single quiz question together with its expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub answer: String,
}

impl QuizQuestion {
    #[must_use]
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Ordered, immutable list of quiz questions.
///
/// The bank is the only source of both the prompts shown to the user and the
/// answers used for scoring, so the two can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<QuizQuestion>,
}

impl QuestionBank {
    /// Build a bank from an ordered list of questions.
    ///
    /// Prompts and answers are trimmed before being stored.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Empty` for an empty list, or
    /// `EmptyPrompt`/`EmptyAnswer` when a question has blank text.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }
        if u32::try_from(questions.len()).is_err() {
            return Err(QuestionBankError::TooManyQuestions {
                len: questions.len(),
            });
        }

        let mut normalized = Vec::with_capacity(questions.len());
        for (index, question) in questions.into_iter().enumerate() {
            let prompt = question.prompt.trim().to_string();
            let answer = question.answer.trim().to_string();
            if prompt.is_empty() {
                return Err(QuestionBankError::EmptyPrompt { index });
            }
            if answer.is_empty() {
                return Err(QuestionBankError::EmptyAnswer { index });
            }
            normalized.push(QuizQuestion { prompt, answer });
        }

        Ok(Self {
            questions: normalized,
        })
    }

    /// The built-in Python quiz used when no question file is configured.
    #[must_use]
    pub fn python_default() -> Self {
        Self {
            questions: vec![
                QuizQuestion::new("What is Python?", "Python"),
                QuizQuestion::new("What is a list comprehension?", "List"),
                QuizQuestion::new("How does Python handle exceptions?", "Try/Except"),
            ],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&QuizQuestion> {
        self.questions.get(id.index())
    }

    #[must_use]
    pub fn prompt(&self, id: QuestionId) -> Option<&str> {
        self.get(id).map(|q| q.prompt.as_str())
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Expected answers in question order.
    #[must_use]
    pub fn correct_answers(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.answer.clone()).collect()
    }
}
