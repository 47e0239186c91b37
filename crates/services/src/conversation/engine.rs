use std::fmt;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{COMPLETED_CURSOR, QuestionId, QuizScore, QuizSession, SessionState};
use storage::repository::SessionStore;

use super::progress::QuizProgress;
use crate::config::QuizConfig;
use crate::error::ConversationError;

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Turns one incoming message into the bot's replies.
///
/// Each call records the answer to the question asked last, asks the next
/// question (or reports the score once the bank is exhausted), moves the
/// session cursor and saves the session. Failures never escape a turn: they
/// come back as a single reply line.
#[derive(Clone)]
pub struct ConversationEngine {
    config: Arc<QuizConfig>,
    store: Arc<dyn SessionStore>,
    clock: Clock,
}

impl ConversationEngine {
    #[must_use]
    pub fn new(config: Arc<QuizConfig>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            store,
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Handle one user message against `session` and return the replies in order.
    ///
    /// On any failure the returned list holds only the error text and `session`
    /// is left as it was before the call.
    pub async fn generate_responses(&self, message: &str, session: &mut QuizSession) -> Vec<String> {
        let state = session.state();
        let snapshot = session.clone();
        let mut responses = Vec::new();

        if state == SessionState::NotStarted {
            responses.push(self.config.welcome_message().to_string());
        }

        // Nothing has been asked before the first turn, and the score is already
        // out once completed; those messages are validated but not stored.
        let recorded = match state {
            SessionState::InProgress { next } => Self::record_answer(message, next - 1, session),
            SessionState::NotStarted | SessionState::Completed => validate_answer(message),
        };
        if let Err(err) = recorded {
            tracing::warn!(session_id = %session.id(), kind = ?err.kind(), "answer rejected: {err}");
            return vec![err.to_string()];
        }

        let cursor = match state {
            SessionState::NotStarted => 0,
            SessionState::InProgress { next } => next,
            SessionState::Completed => COMPLETED_CURSOR,
        };
        let (question, next_id) = self.next_question(cursor);

        if question.is_empty() {
            let correct_answers = self.config.bank().correct_answers();
            responses.push(Self::final_response(session, &correct_answers));
        } else {
            responses.push(question);
        }

        if let Err(err) = session.set_current_question_id(next_id) {
            *session = snapshot;
            return vec![ConversationError::from(err).to_string()];
        }
        session.touch(self.clock.now());

        if let Err(err) = self.store.save_session(session).await {
            let err = ConversationError::from(err);
            tracing::warn!(session_id = %session.id(), "session save failed: {err}");
            *session = snapshot;
            return vec![err.to_string()];
        }

        tracing::debug!(
            session_id = %session.id(),
            from = ?snapshot.current_question_id(),
            to = next_id,
            replies = responses.len(),
            "conversation turn handled"
        );
        responses
    }

    /// Validate `answer` and store it for `question_id`.
    ///
    /// # Errors
    ///
    /// Returns `ConversationError::EmptyAnswer` for empty or whitespace-only
    /// answers and `ConversationError::Session` if the session rejects the
    /// write. The session is untouched on error.
    pub fn record_answer(
        answer: &str,
        question_id: i64,
        session: &mut QuizSession,
    ) -> Result<(), ConversationError> {
        validate_answer(answer)?;
        session.record_answer(question_id, answer)?;
        Ok(())
    }

    /// Look up the question at `question_id`.
    ///
    /// Returns the prompt and the id to ask after it, or `("", -1)` when the
    /// id falls outside the bank.
    #[must_use]
    pub fn next_question(&self, question_id: i64) -> (String, i64) {
        let prompt = QuestionId::from_cursor(question_id)
            .and_then(|id| self.config.bank().prompt(id));
        match prompt {
            Some(prompt) => (prompt.to_string(), question_id + 1),
            None => (String::new(), COMPLETED_CURSOR),
        }
    }

    /// Build the score report for the answers stored in `session`.
    ///
    /// Scoring failures come back as the report text instead of an error.
    #[must_use]
    pub fn final_response<C: AsRef<str>>(session: &QuizSession, correct_answers: &[C]) -> String {
        let user_answers = session.answers_up_to(correct_answers.len());
        match QuizScore::compute(&user_answers, correct_answers) {
            Ok(score) => score.to_string(),
            Err(err) => ConversationError::from(err).to_string(),
        }
    }

    #[must_use]
    pub fn progress(&self, session: &QuizSession) -> QuizProgress {
        QuizProgress::of(session, self.config.bank().len())
    }
}

impl fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("questions", &self.config.bank().len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

fn validate_answer(answer: &str) -> Result<(), ConversationError> {
    if answer.trim().is_empty() {
        return Err(ConversationError::EmptyAnswer);
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionBank, QuizQuestion, SessionId};
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemorySessionStore, StorageError};

    struct FailingStore;

    #[async_trait::async_trait]
    impl SessionStore for FailingStore {
        async fn load_session(&self, _id: SessionId) -> Result<Option<QuizSession>, StorageError> {
            Ok(None)
        }

        async fn save_session(&self, _session: &QuizSession) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn delete_session(&self, _id: SessionId) -> Result<(), StorageError> {
            Err(StorageError::NotFound)
        }
    }

    fn engine_with(store: Arc<dyn SessionStore>) -> ConversationEngine {
        ConversationEngine::new(Arc::new(QuizConfig::default()), store).with_clock(fixed_clock())
    }

    fn engine() -> ConversationEngine {
        engine_with(Arc::new(InMemorySessionStore::new()))
    }

    fn python_session(answers: &[&str]) -> QuizSession {
        let mut session = QuizSession::new(SessionId::new(1));
        for (index, answer) in answers.iter().enumerate() {
            session.record_answer(index as i64, *answer).unwrap();
        }
        session
    }

    #[test]
    fn record_answer_rejects_blank_input() {
        for blank in ["", " ", "\t\n", "   "] {
            let mut session = QuizSession::new(SessionId::new(1));
            let before = session.clone();
            let err = ConversationEngine::record_answer(blank, 0, &mut session).unwrap_err();
            assert!(matches!(err, ConversationError::EmptyAnswer));
            assert_eq!(err.to_string(), "Answer cannot be empty.");
            assert_eq!(session, before);
        }
    }

    #[test]
    fn record_answer_stores_by_question_id() {
        let mut session = QuizSession::new(SessionId::new(1));
        ConversationEngine::record_answer("List", 1, &mut session).unwrap();
        assert_eq!(session.answer(QuestionId::new(1)), Some("List"));
    }

    #[test]
    fn record_answer_reports_invalid_ids_as_storage_errors() {
        let mut session = QuizSession::new(SessionId::new(1));
        let err = ConversationEngine::record_answer("x", -3, &mut session).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Storage);
        assert_eq!(err.to_string(), "Error: invalid question id: -3");
        assert!(session.answers().is_empty());
    }

    #[test]
    fn next_question_within_and_outside_bounds() {
        let engine = engine();
        assert_eq!(engine.next_question(0), ("What is Python?".to_string(), 1));
        assert_eq!(
            engine.next_question(2),
            ("How does Python handle exceptions?".to_string(), 3)
        );
        for id in [-5, -1, 3, 4, i64::MAX] {
            assert_eq!(engine.next_question(id), (String::new(), -1));
        }
    }

    #[test]
    fn final_response_scores_case_insensitively() {
        let session = python_session(&["python", "wrong", "Try/Except"]);
        let report =
            ConversationEngine::final_response(&session, &["Python", "List", "Try/Except"]);
        assert_eq!(report, "Your quiz score: 2/3 (66.67%).");
    }

    #[test]
    fn final_response_is_idempotent() {
        let session = python_session(&["Python"]);
        let correct = ["Python", "List", "Try/Except"];
        let first = ConversationEngine::final_response(&session, &correct);
        let second = ConversationEngine::final_response(&session, &correct);
        assert_eq!(first, second);
        assert_eq!(first, "Your quiz score: 1/3 (33.33%).");
    }

    #[test]
    fn final_response_without_answers_key_reports_error() {
        let session = python_session(&["Python"]);
        let report = ConversationEngine::final_response::<&str>(&session, &[]);
        assert_eq!(
            report,
            "Error calculating score: no correct answers to score against"
        );
    }

    #[tokio::test]
    async fn first_message_gets_welcome_then_first_question() {
        let engine = engine();
        let mut session = QuizSession::new(SessionId::new(1));

        let replies = engine.generate_responses("hi", &mut session).await;

        assert_eq!(
            replies,
            vec![
                QuizConfig::default().welcome_message().to_string(),
                "What is Python?".to_string()
            ]
        );
        assert_eq!(session.current_question_id(), Some(1));
        assert!(session.answers().is_empty());
        assert_eq!(session.updated_at(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn answers_are_recorded_against_the_asked_question() {
        let engine = engine();
        let mut session = QuizSession::new(SessionId::new(1));
        engine.generate_responses("start", &mut session).await;

        let replies = engine.generate_responses("Python", &mut session).await;

        assert_eq!(replies, vec!["What is a list comprehension?".to_string()]);
        assert_eq!(session.answer(QuestionId::new(0)), Some("Python"));
        assert_eq!(session.current_question_id(), Some(2));
    }

    #[tokio::test]
    async fn empty_message_mid_conversation_does_not_advance() {
        let engine = engine();
        let mut session = QuizSession::new(SessionId::new(1));
        engine.generate_responses("start", &mut session).await;
        engine.generate_responses("Python", &mut session).await;
        let before = session.clone();

        let replies = engine.generate_responses("   ", &mut session).await;

        assert_eq!(replies, vec!["Answer cannot be empty.".to_string()]);
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn empty_first_message_gets_only_the_error() {
        let engine = engine();
        let mut session = QuizSession::new(SessionId::new(1));

        let replies = engine.generate_responses("", &mut session).await;

        assert_eq!(replies, vec!["Answer cannot be empty.".to_string()]);
        assert_eq!(session.current_question_id(), None);
    }

    #[tokio::test]
    async fn last_answer_produces_score_and_completes() {
        let engine = engine();
        let mut session = QuizSession::new(SessionId::new(1));
        engine.generate_responses("start", &mut session).await;
        engine.generate_responses("python", &mut session).await;
        engine.generate_responses("wrong", &mut session).await;
        assert_eq!(session.current_question_id(), Some(3));

        let replies = engine.generate_responses("Try/Except", &mut session).await;

        assert_eq!(replies, vec!["Your quiz score: 2/3 (66.67%).".to_string()]);
        assert_eq!(session.current_question_id(), Some(COMPLETED_CURSOR));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn completed_session_repeats_score_without_recording() {
        let engine = engine();
        let mut session = python_session(&["Python", "List", "nope"]);
        session.set_current_question_id(COMPLETED_CURSOR).unwrap();
        let answers_before = session.answers().clone();

        let replies = engine.generate_responses("again?", &mut session).await;

        assert_eq!(replies, vec!["Your quiz score: 2/3 (66.67%).".to_string()]);
        assert_eq!(session.answers(), &answers_before);
        assert_eq!(session.current_question_id(), Some(COMPLETED_CURSOR));
    }

    #[tokio::test]
    async fn turn_is_saved_to_the_store() {
        let store = InMemorySessionStore::new();
        let engine = engine_with(Arc::new(store.clone()));
        let mut session = QuizSession::new(SessionId::new(4));

        engine.generate_responses("hello", &mut session).await;

        let stored = store.load_session(SessionId::new(4)).await.unwrap();
        assert_eq!(stored, Some(session));
    }

    #[tokio::test]
    async fn save_failure_restores_session() {
        let engine = engine_with(Arc::new(FailingStore));
        let mut session = QuizSession::new(SessionId::new(1));
        let before = session.clone();

        let replies = engine.generate_responses("hello", &mut session).await;

        assert_eq!(
            replies,
            vec!["Error: connection error: disk full".to_string()]
        );
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn custom_bank_drives_the_flow() {
        let bank = QuestionBank::new(vec![QuizQuestion::new("Only question?", "Yes")]).unwrap();
        let config = QuizConfig::new("Welcome!", bank).unwrap();
        let engine = ConversationEngine::new(
            Arc::new(config),
            Arc::new(InMemorySessionStore::new()),
        );
        let mut session = QuizSession::new(SessionId::new(1));

        let replies = engine.generate_responses("go", &mut session).await;
        assert_eq!(replies, vec!["Welcome!".to_string(), "Only question?".to_string()]);

        let replies = engine.generate_responses("YES", &mut session).await;
        assert_eq!(replies, vec!["Your quiz score: 1/1 (100.00%).".to_string()]);
    }
}
