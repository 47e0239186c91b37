use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId};

/// Cursor value stored once every question has been asked and scored.
pub const COMPLETED_CURSOR: i64 = -1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid question id: {0}")]
    InvalidQuestionId(i64),

    #[error("invalid question cursor: {0}")]
    InvalidCursor(i64),
}

/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No question has been asked yet.
    NotStarted,
    /// `next` is the id of the next question to ask; `next - 1` was the last one asked.
    InProgress { next: i64 },
    /// Final score has been reported.
    Completed,
}

/// Per-user quiz state persisted across messages.
///
/// `current_question_id` follows the conversation cursor: absent before the
/// first message, `1..=N` while questions are being asked, and
/// [`COMPLETED_CURSOR`] once the score has been reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    id: SessionId,
    current_question_id: Option<i64>,
    answers: BTreeMap<QuestionId, String>,
    updated_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// A fresh session with no cursor and no answers.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            current_question_id: None,
            answers: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCursor` if the cursor is below the completion sentinel.
    pub fn from_persisted(
        id: SessionId,
        current_question_id: Option<i64>,
        answers: BTreeMap<QuestionId, String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionError> {
        if let Some(cursor) = current_question_id {
            if cursor < COMPLETED_CURSOR {
                return Err(SessionError::InvalidCursor(cursor));
            }
        }

        Ok(Self {
            id,
            current_question_id,
            answers,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<i64> {
        self.current_question_id
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, id: QuestionId) -> Option<&str> {
        self.answers.get(&id).map(String::as_str)
    }

    /// Answers for questions `0..count`, with unanswered slots as empty strings.
    #[must_use]
    pub fn answers_up_to(&self, count: usize) -> Vec<&str> {
        (0..count)
            .map(|index| {
                u32::try_from(index)
                    .ok()
                    .and_then(|index| self.answer(QuestionId::new(index)))
                    .unwrap_or("")
            })
            .collect()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.current_question_id {
            None | Some(0) => SessionState::NotStarted,
            Some(COMPLETED_CURSOR) => SessionState::Completed,
            Some(next) => SessionState::InProgress { next },
        }
    }

    /// Store `answer` for the given question, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuestionId` for negative or oversized ids.
    pub fn record_answer(
        &mut self,
        question_id: i64,
        answer: impl Into<String>,
    ) -> Result<(), SessionError> {
        let id = QuestionId::from_cursor(question_id)
            .ok_or(SessionError::InvalidQuestionId(question_id))?;
        self.answers.insert(id, answer.into());
        Ok(())
    }

    /// Move the conversation cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidCursor` if the value is below the completion sentinel.
    pub fn set_current_question_id(&mut self, cursor: i64) -> Result<(), SessionError> {
        if cursor < COMPLETED_CURSOR {
            return Err(SessionError::InvalidCursor(cursor));
        }
        self.current_question_id = Some(cursor);
        Ok(())
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn fresh_session_is_not_started() {
        let session = QuizSession::new(SessionId::new(1));
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn cursor_maps_to_state() {
        let mut session = QuizSession::new(SessionId::new(1));
        session.set_current_question_id(2).unwrap();
        assert_eq!(session.state(), SessionState::InProgress { next: 2 });

        session.set_current_question_id(COMPLETED_CURSOR).unwrap();
        assert_eq!(session.state(), SessionState::Completed);

        assert_eq!(
            session.set_current_question_id(-2),
            Err(SessionError::InvalidCursor(-2))
        );
        assert_eq!(session.current_question_id(), Some(COMPLETED_CURSOR));
    }

    #[test]
    fn record_answer_rejects_negative_ids() {
        let mut session = QuizSession::new(SessionId::new(1));
        let err = session.record_answer(-1, "x").unwrap_err();
        assert_eq!(err, SessionError::InvalidQuestionId(-1));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn answers_up_to_fills_gaps() {
        let mut session = QuizSession::new(SessionId::new(1));
        session.record_answer(0, "first").unwrap();
        session.record_answer(2, "third").unwrap();
        session.touch(fixed_now());

        assert_eq!(session.answers_up_to(4), vec!["first", "", "third", ""]);
        assert_eq!(session.updated_at(), Some(fixed_now()));
    }

    #[test]
    fn from_persisted_rejects_bad_cursor() {
        let err = QuizSession::from_persisted(SessionId::new(1), Some(-5), BTreeMap::new(), None)
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidCursor(-5));
    }
}
