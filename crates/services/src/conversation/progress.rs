use quiz_core::model::{QuizSession, SessionState};

/// How far a session has come through the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub asked: usize,
    pub answered: usize,
    pub is_complete: bool,
}

impl QuizProgress {
    #[must_use]
    pub fn of(session: &QuizSession, total: usize) -> Self {
        let (asked, is_complete) = match session.state() {
            SessionState::NotStarted => (0, false),
            SessionState::InProgress { next } => {
                (usize::try_from(next).unwrap_or(0).min(total), false)
            }
            SessionState::Completed => (total, true),
        };
        let answered = session
            .answers()
            .keys()
            .filter(|id| id.index() < total)
            .count();

        Self {
            total,
            asked,
            answered,
            is_complete,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.asked)
    }
}
