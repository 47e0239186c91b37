use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("no correct answers to score against")]
    NoQuestions,

    #[error("too many questions to score: {len}")]
    TooManyQuestions { len: usize },
}

/// Result of grading a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    correct: u32,
    total: u32,
}

impl QuizScore {
    /// Grade user answers against the expected answers, position by position.
    ///
    /// Matching is exact but case-insensitive. Extra user answers beyond the
    /// expected list are ignored; missing ones count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NoQuestions` when `correct_answers` is empty.
    pub fn compute<U, C>(user_answers: &[U], correct_answers: &[C]) -> Result<Self, ScoreError>
    where
        U: AsRef<str>,
        C: AsRef<str>,
    {
        if correct_answers.is_empty() {
            return Err(ScoreError::NoQuestions);
        }
        let total = u32::try_from(correct_answers.len()).map_err(|_| {
            ScoreError::TooManyQuestions {
                len: correct_answers.len(),
            }
        })?;

        let mut correct = 0_u32;
        for (user, expected) in user_answers.iter().zip(correct_answers) {
            if user.as_ref().to_lowercase() == expected.as_ref().to_lowercase() {
                correct = correct.saturating_add(1);
            }
        }

        Ok(Self { correct, total })
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Share of correct answers in percent.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

impl fmt::Display for QuizScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Your quiz score: {}/{} ({:.2}%).",
            self.correct,
            self.total,
            self.percentage()
        )
    }
}
